use super::*;
use crate::message::PublishError;
use crate::services::{ReviewLog, SimulatedGateway};
use shared::models::{
    AddOn, Customization, CustomizationOption, ItemAvailability, MenuItem, Restaurant,
    RestaurantStatus,
};
use shared::order::{OrderItemInput, PaymentMethod, RatingInput};

/// Publisher that keeps every message (or refuses them all)
#[derive(Debug, Default)]
struct RecordingPublisher {
    messages: parking_lot::Mutex<Vec<BusMessage>>,
    fail: bool,
}

impl RecordingPublisher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn kinds_for(&self, topic: &str) -> Vec<NotificationKind> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.kind)
            .collect()
    }

    fn count(&self) -> usize {
        self.messages.lock().len()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, msg: BusMessage) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Failed("bus down".to_string()));
        }
        self.messages.lock().push(msg);
        Ok(())
    }
}

struct TestEngine {
    manager: OrdersManager,
    catalog: Arc<CatalogService>,
    publisher: Arc<RecordingPublisher>,
    reviews: Arc<ReviewLog>,
}

fn create_engine_with(gateway: SimulatedGateway, publisher: RecordingPublisher) -> TestEngine {
    create_engine_with_config(gateway, publisher, Config::default())
}

fn create_engine_with_config(
    gateway: SimulatedGateway,
    publisher: RecordingPublisher,
    config: Config,
) -> TestEngine {
    let storage = OrderStorage::open_in_memory().unwrap();
    let catalog = Arc::new(CatalogService::new());
    seed_catalog(&catalog);
    let publisher = Arc::new(publisher);
    let reviews = Arc::new(ReviewLog::new());
    let manager = OrdersManager::with_storage(
        storage,
        config,
        catalog.clone(),
        Arc::new(gateway),
        publisher.clone(),
        reviews.clone(),
    );
    TestEngine {
        manager,
        catalog,
        publisher,
        reviews,
    }
}

fn create_test_engine() -> TestEngine {
    create_engine_with(SimulatedGateway::always_approve(), RecordingPublisher::default())
}

fn seed_catalog(catalog: &CatalogService) {
    catalog.upsert_restaurant(Restaurant {
        id: "r-1".to_string(),
        owner_id: "owner-1".to_string(),
        name: "Burger Barn".to_string(),
        status: RestaurantStatus::Active,
        minimum_order: 10.0,
        delivery_fee: 2.5,
    });
    catalog.upsert_menu_item(MenuItem {
        id: "m-burger".to_string(),
        restaurant_id: "r-1".to_string(),
        name: "Burger".to_string(),
        price: 8.0,
        is_active: true,
        availability: ItemAvailability::default(),
        customizations: vec![Customization {
            name: "Size".to_string(),
            options: vec![
                CustomizationOption {
                    name: "Regular".to_string(),
                    price: 0.0,
                },
                CustomizationOption {
                    name: "Large".to_string(),
                    price: 2.0,
                },
            ],
        }],
        add_ons: vec![AddOn {
            name: "Cheese".to_string(),
            price: 1.0,
        }],
    });
    catalog.upsert_menu_item(MenuItem {
        id: "m-fries".to_string(),
        restaurant_id: "r-1".to_string(),
        name: "Fries".to_string(),
        price: 3.5,
        is_active: true,
        availability: ItemAvailability {
            available_quantity: Some(10),
            ..Default::default()
        },
        customizations: vec![],
        add_ons: vec![],
    });
    catalog.upsert_menu_item(MenuItem {
        id: "m-special".to_string(),
        restaurant_id: "r-1".to_string(),
        name: "Chef Special".to_string(),
        price: 12.0,
        is_active: true,
        availability: ItemAvailability {
            available_quantity: Some(1),
            ..Default::default()
        },
        customizations: vec![],
        add_ons: vec![],
    });
}

fn customer() -> Actor {
    Actor::new("c-1", "Alice", ActorRole::Customer)
}

fn owner() -> Actor {
    Actor::new("owner-1", "Bob", ActorRole::RestaurantOwner)
}

fn courier() -> Actor {
    Actor::new("d-1", "Dana", ActorRole::DeliveryPartner)
}

fn admin() -> Actor {
    Actor::new("a-1", "Root", ActorRole::Admin)
}

fn place_cmd(method: PaymentMethod, items: Vec<OrderItemInput>) -> OrderCommand {
    OrderCommand::new(
        customer(),
        OrderCommandPayload::PlaceOrder {
            customer_id: "c-1".to_string(),
            restaurant_id: "r-1".to_string(),
            items,
            payment_method: method,
            payment_details: None,
            delivery_address: None,
            special_instructions: None,
            tip: 0.0,
            discount: 0.0,
        },
    )
}

/// Two plain burgers: subtotal 16.00, fee 2.50, tax 1.28, total 19.78
fn two_burgers() -> Vec<OrderItemInput> {
    vec![OrderItemInput::new("m-burger", 2)]
}

async fn place(engine: &TestEngine, method: PaymentMethod) -> String {
    let response = engine
        .manager
        .execute_command(place_cmd(method, two_burgers()))
        .await;
    assert!(response.success, "placement failed: {:?}", response.error);
    response.order_id.unwrap()
}

fn status_cmd(actor: Actor, order_id: &str, status: OrderStatus) -> OrderCommand {
    OrderCommand::new(
        actor,
        OrderCommandPayload::UpdateStatus {
            order_id: order_id.to_string(),
            status,
            note: None,
            delivery_person_id: None,
        },
    )
}

fn cancel_cmd(actor: Actor, order_id: &str, reason: &str) -> OrderCommand {
    OrderCommand::new(
        actor,
        OrderCommandPayload::CancelOrder {
            order_id: order_id.to_string(),
            reason: reason.to_string(),
        },
    )
}

fn rate_cmd(actor: Actor, order_id: &str, overall: u8) -> OrderCommand {
    OrderCommand::new(
        actor,
        OrderCommandPayload::RateOrder {
            order_id: order_id.to_string(),
            rating: RatingInput {
                food: 5,
                delivery: 4,
                overall,
                comment: Some("Hot and fresh".to_string()),
            },
        },
    )
}

/// Walk an order along the happy path up to `target`
async fn advance_to(engine: &TestEngine, order_id: &str, target: OrderStatus) {
    let steps = [
        (OrderStatus::Confirmed, owner()),
        (OrderStatus::Preparing, owner()),
        (OrderStatus::ReadyForPickup, owner()),
        (OrderStatus::OutForDelivery, courier()),
        (OrderStatus::Delivered, courier()),
    ];
    for (status, actor) in steps {
        let response = engine
            .manager
            .execute_command(status_cmd(actor, order_id, status))
            .await;
        assert!(response.success, "{} failed: {:?}", status, response.error);
        if status == target {
            return;
        }
    }
}

fn error_code(response: &CommandResponse) -> Option<shared::order::CommandErrorCode> {
    response.error.as_ref().map(|e| e.code)
}

mod test_flows;
