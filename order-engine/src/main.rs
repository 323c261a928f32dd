use order_engine::message::restaurant_topic;
use order_engine::{
    init_logger_with_file, CatalogService, Config, MessageBus, OrdersManager, ReviewLog,
    SimulatedGateway,
};
use shared::models::{ItemAvailability, MenuItem, Restaurant, RestaurantStatus};
use shared::order::{
    Actor, ActorRole, OrderCommand, OrderCommandPayload, OrderItemInput, OrderStatus,
    PaymentMethod,
};
use std::sync::Arc;

/// Seed a demo restaurant, then walk one order through its lifecycle
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env, work dir, logging)
    let config = Config::load();
    std::fs::create_dir_all(config.log_dir())?;
    init_logger_with_file(Some(config.log_level.as_str()), Some(config.log_dir().as_path()));

    tracing::info!(work_dir = %config.work_dir, "Order engine starting...");

    // 2. Collaborators
    let catalog = Arc::new(CatalogService::new());
    seed_demo_catalog(&catalog);
    let bus = Arc::new(MessageBus::with_capacity(config.event_channel_capacity));
    let manager = OrdersManager::new(
        config,
        catalog,
        Arc::new(SimulatedGateway::default()),
        bus.clone(),
        Arc::new(ReviewLog::new()),
    )?;

    let mut kitchen = bus.subscribe_topic(restaurant_topic("demo-restaurant"));
    tokio::spawn(async move {
        while let Some(msg) = kitchen.recv().await {
            tracing::info!(kind = %msg.kind, order_number = %msg.payload.order_number, "Kitchen notified");
        }
    });

    // 3. One order, start to finish
    let customer = Actor::new("demo-customer", "Demo Customer", ActorRole::Customer);
    let owner = Actor::new("demo-owner", "Demo Owner", ActorRole::RestaurantOwner);
    let courier = Actor::new("demo-courier", "Demo Courier", ActorRole::DeliveryPartner);

    let placed = manager
        .execute_command(OrderCommand::new(
            customer.clone(),
            OrderCommandPayload::PlaceOrder {
                customer_id: customer.id.clone(),
                restaurant_id: "demo-restaurant".to_string(),
                items: vec![OrderItemInput::new("demo-curry", 2)],
                payment_method: PaymentMethod::Card,
                payment_details: None,
                delivery_address: None,
                special_instructions: None,
                tip: 1.5,
                discount: 0.0,
            },
        ))
        .await;
    let order_id = match placed.order_id {
        Some(id) if placed.success => id,
        _ => {
            tracing::error!(error = ?placed.error, "Demo order was not placed");
            return Ok(());
        }
    };

    for (actor, status) in [
        (&owner, OrderStatus::Confirmed),
        (&owner, OrderStatus::Preparing),
        (&owner, OrderStatus::ReadyForPickup),
        (&courier, OrderStatus::OutForDelivery),
        (&courier, OrderStatus::Delivered),
    ] {
        let response = manager
            .execute_command(OrderCommand::new(
                actor.clone(),
                OrderCommandPayload::UpdateStatus {
                    order_id: order_id.clone(),
                    status,
                    note: None,
                    delivery_person_id: None,
                },
            ))
            .await;
        if !response.success {
            tracing::error!(%status, error = ?response.error, "Demo transition failed");
            break;
        }
    }

    let snapshot = manager.get_order(&customer, &order_id)?;
    tracing::info!(
        order_number = %snapshot.order_number,
        status = %snapshot.status,
        total = snapshot.pricing.total,
        "Demo order finished"
    );
    Ok(())
}

fn seed_demo_catalog(catalog: &CatalogService) {
    catalog.upsert_restaurant(Restaurant {
        id: "demo-restaurant".to_string(),
        owner_id: "demo-owner".to_string(),
        name: "Demo Kitchen".to_string(),
        status: RestaurantStatus::Active,
        minimum_order: 10.0,
        delivery_fee: 2.0,
    });
    catalog.upsert_menu_item(MenuItem {
        id: "demo-curry".to_string(),
        restaurant_id: "demo-restaurant".to_string(),
        name: "Green Curry".to_string(),
        price: 9.5,
        is_active: true,
        availability: ItemAvailability::default(),
        customizations: vec![],
        add_ons: vec![],
    });
}
