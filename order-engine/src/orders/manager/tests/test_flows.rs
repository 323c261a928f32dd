use super::*;
use shared::order::{CommandErrorCode, PaymentStatus};
use std::time::Duration;

fn burgers_and_fries() -> Vec<OrderItemInput> {
    vec![
        OrderItemInput::new("m-burger", 2),
        OrderItemInput::new("m-fries", 3),
    ]
}

#[tokio::test]
async fn test_declined_payment_rolls_back() {
    let engine = create_engine_with(
        SimulatedGateway::always_decline(),
        RecordingPublisher::default(),
    );
    let mut rx = engine.manager.subscribe();
    let cmd = place_cmd(PaymentMethod::Card, burgers_and_fries());

    let response = engine.manager.execute_command(cmd.clone()).await;
    assert!(!response.success);
    assert_eq!(error_code(&response), Some(CommandErrorCode::PaymentFailed));
    assert!(response.order_id.is_none());

    // Nothing survives the rollback
    let stats = engine.manager.stats().unwrap();
    assert_eq!(stats.order_count, 0);
    assert_eq!(stats.event_count, 0);
    assert_eq!(stats.processed_command_count, 0);
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(10));
    assert_eq!(engine.publisher.count(), 0);
    assert!(rx.try_recv().is_err());

    // The command id was released, so a retry is processed again
    let retry = engine.manager.execute_command(cmd).await;
    assert_eq!(error_code(&retry), Some(CommandErrorCode::PaymentFailed));
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(10));
}

#[tokio::test]
async fn test_payment_timeout_rolls_back() {
    let config = Config {
        payment_timeout_ms: 20,
        ..Config::default()
    };
    let engine = create_engine_with_config(
        SimulatedGateway::new(1.0, Duration::from_millis(500)),
        RecordingPublisher::default(),
        config,
    );

    let response = engine
        .manager
        .execute_command(place_cmd(PaymentMethod::Upi, burgers_and_fries()))
        .await;
    assert_eq!(error_code(&response), Some(CommandErrorCode::PaymentFailed));
    assert!(response.error.unwrap().message.contains("20 ms"));
    assert_eq!(engine.manager.stats().unwrap().order_count, 0);
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(10));
}

#[tokio::test]
async fn test_cash_order_skips_gateway() {
    let engine = create_engine_with(
        SimulatedGateway::always_decline(),
        RecordingPublisher::default(),
    );
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    let snapshot = engine.manager.get_order(&customer(), &order_id).unwrap();
    assert_eq!(snapshot.payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_stock_reserved_on_placement() {
    let engine = create_test_engine();
    let response = engine
        .manager
        .execute_command(place_cmd(PaymentMethod::CashOnDelivery, burgers_and_fries()))
        .await;
    assert!(response.success);
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(7));
    // Unlimited items stay unlimited
    assert_eq!(engine.catalog.available_quantity("m-burger"), None);
}

#[tokio::test]
async fn test_cancel_pending_cash_order() {
    let engine = create_test_engine();
    let response = engine
        .manager
        .execute_command(place_cmd(PaymentMethod::CashOnDelivery, burgers_and_fries()))
        .await;
    let order_id = response.order_id.unwrap();
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(7));

    let response = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "Changed my mind"))
        .await;
    assert!(response.success, "{:?}", response.error);

    let snapshot = engine.manager.get_order(&customer(), &order_id).unwrap();
    assert_eq!(snapshot.status, OrderStatus::Cancelled);
    let cancellation = snapshot.cancellation.as_ref().unwrap();
    assert_eq!(cancellation.reason, "Changed my mind");
    assert_eq!(cancellation.cancelled_by, "c-1");
    assert_eq!(cancellation.previous_status, OrderStatus::Pending);
    assert_eq!(cancellation.refund_amount, snapshot.pricing.total);
    // Nothing was collected, so nothing is refunded
    assert_eq!(snapshot.payment.status, PaymentStatus::Pending);

    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(10));

    assert_eq!(
        engine.publisher.kinds_for("restaurant:r-1"),
        vec![NotificationKind::NewOrder, NotificationKind::OrderCancelled]
    );
    assert_eq!(
        engine.publisher.kinds_for(&format!("order:{}", order_id)),
        vec![NotificationKind::OrderCancelled]
    );
}

#[tokio::test]
async fn test_cancel_paid_order_while_preparing() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::Card).await;
    advance_to(&engine, &order_id, OrderStatus::Preparing).await;

    let response = engine
        .manager
        .execute_command(cancel_cmd(owner(), &order_id, "Out of buns"))
        .await;
    assert!(response.success, "{:?}", response.error);

    let snapshot = engine.manager.get_order(&owner(), &order_id).unwrap();
    assert_eq!(snapshot.status, OrderStatus::Cancelled);
    assert_eq!(snapshot.cancellation.as_ref().unwrap().refund_amount, 15.82);
    assert_eq!(snapshot.payment.status, PaymentStatus::Refunded);
    assert_eq!(snapshot.payment.refund_amount, Some(15.82));
    assert!(snapshot.payment.refunded_at.is_some());

    let last = snapshot.status_history.last().unwrap();
    assert_eq!(last.status, OrderStatus::Cancelled);
    assert_eq!(last.actor_role, ActorRole::RestaurantOwner);
}

#[tokio::test]
async fn test_cancel_while_preparing_keeps_stock() {
    let engine = create_test_engine();
    let response = engine
        .manager
        .execute_command(place_cmd(PaymentMethod::CashOnDelivery, burgers_and_fries()))
        .await;
    let order_id = response.order_id.unwrap();
    advance_to(&engine, &order_id, OrderStatus::Preparing).await;

    let response = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "Too slow"))
        .await;
    assert!(response.success);
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(7));
}

#[tokio::test]
async fn test_cancel_ready_for_pickup_refunds_half() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::Wallet).await;
    advance_to(&engine, &order_id, OrderStatus::ReadyForPickup).await;

    let response = engine
        .manager
        .execute_command(cancel_cmd(admin(), &order_id, "Courier shortage"))
        .await;
    assert!(response.success, "{:?}", response.error);

    let snapshot = engine.manager.get_order(&admin(), &order_id).unwrap();
    assert_eq!(snapshot.cancellation.unwrap().refund_amount, 9.89);
    assert_eq!(snapshot.payment.refund_amount, Some(9.89));
}

#[tokio::test]
async fn test_cancel_out_for_delivery_rejected() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    advance_to(&engine, &order_id, OrderStatus::OutForDelivery).await;

    let response = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "Too late"))
        .await;
    assert_eq!(error_code(&response), Some(CommandErrorCode::ValidationFailed));

    let snapshot = engine.manager.get_order(&customer(), &order_id).unwrap();
    assert_eq!(snapshot.status, OrderStatus::OutForDelivery);
    assert!(snapshot.cancellation.is_none());
}

#[tokio::test]
async fn test_cancel_twice_rejected() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    let first = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "Oops"))
        .await;
    assert!(first.success);

    let second = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "Oops again"))
        .await;
    assert_eq!(error_code(&second), Some(CommandErrorCode::ValidationFailed));
}

#[tokio::test]
async fn test_rate_delivered_order_records_review() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    advance_to(&engine, &order_id, OrderStatus::Delivered).await;

    let response = engine
        .manager
        .execute_command(rate_cmd(customer(), &order_id, 4))
        .await;
    assert!(response.success, "{:?}", response.error);

    let snapshot = engine.manager.get_order(&customer(), &order_id).unwrap();
    let rating = snapshot.rating.as_ref().unwrap();
    assert_eq!(rating.overall, 4);
    assert_eq!(rating.food, 5);

    let reviews = engine.reviews.for_restaurant("r-1");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].order_id, order_id);
    assert_eq!(reviews[0].rating, 4);
    assert!(reviews[0].is_verified_purchase);

    let again = engine
        .manager
        .execute_command(rate_cmd(customer(), &order_id, 1))
        .await;
    assert_eq!(error_code(&again), Some(CommandErrorCode::ValidationFailed));
    assert_eq!(engine.reviews.len(), 1);
}

#[tokio::test]
async fn test_rate_before_delivery_rejected() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    advance_to(&engine, &order_id, OrderStatus::OutForDelivery).await;

    let response = engine
        .manager
        .execute_command(rate_cmd(customer(), &order_id, 5))
        .await;
    assert_eq!(error_code(&response), Some(CommandErrorCode::ValidationFailed));
    assert!(engine.reviews.is_empty());
}

#[tokio::test]
async fn test_publish_failure_does_not_fail_commands() {
    let engine = create_engine_with(
        SimulatedGateway::always_approve(),
        RecordingPublisher::failing(),
    );
    let order_id = place(&engine, PaymentMethod::Card).await;
    advance_to(&engine, &order_id, OrderStatus::Confirmed).await;

    let response = engine
        .manager
        .execute_command(cancel_cmd(customer(), &order_id, "No longer hungry"))
        .await;
    assert!(response.success);
    assert_eq!(engine.publisher.count(), 0);
}

#[tokio::test]
async fn test_status_updates_notify_order_topic() {
    let engine = create_test_engine();
    let order_id = place(&engine, PaymentMethod::CashOnDelivery).await;
    advance_to(&engine, &order_id, OrderStatus::Preparing).await;

    let topic = format!("order:{}", order_id);
    assert_eq!(
        engine.publisher.kinds_for(&topic),
        vec![
            NotificationKind::OrderStatusUpdated,
            NotificationKind::OrderStatusUpdated
        ]
    );
    // Restaurant only hears about new and cancelled orders
    assert_eq!(
        engine.publisher.kinds_for("restaurant:r-1"),
        vec![NotificationKind::NewOrder]
    );
}

#[tokio::test]
async fn test_retry_during_declined_charge_waits_for_outcome() {
    let engine = create_engine_with(
        SimulatedGateway::new(0.0, Duration::from_millis(200)),
        RecordingPublisher::default(),
    );
    let cmd = place_cmd(PaymentMethod::Card, two_burgers());

    let (first, retry) = tokio::join!(engine.manager.execute_command(cmd.clone()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.manager.execute_command(cmd.clone()).await
    });

    // The retry is not answered from the half-finished placement
    for response in [&first, &retry] {
        assert!(!response.success);
        assert_eq!(error_code(response), Some(CommandErrorCode::PaymentFailed));
        assert!(response.order_id.is_none());
    }
    let stats = engine.manager.stats().unwrap();
    assert_eq!(stats.order_count, 0);
    assert_eq!(stats.processed_command_count, 0);
    assert_eq!(engine.publisher.count(), 0);
}

#[tokio::test]
async fn test_retry_during_approved_charge_returns_same_order() {
    let engine = create_engine_with(
        SimulatedGateway::new(1.0, Duration::from_millis(200)),
        RecordingPublisher::default(),
    );
    let cmd = place_cmd(PaymentMethod::Card, two_burgers());

    let (first, retry) = tokio::join!(engine.manager.execute_command(cmd.clone()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.manager.execute_command(cmd.clone()).await
    });

    assert!(first.success, "{:?}", first.error);
    assert!(retry.success);
    assert!(first.order_id.is_some());
    assert_eq!(retry.order_id, first.order_id);
    assert_eq!(engine.manager.stats().unwrap().order_count, 1);
}

#[tokio::test]
async fn test_order_hidden_while_charge_pending() {
    let engine = create_engine_with(
        SimulatedGateway::new(1.0, Duration::from_millis(200)),
        RecordingPublisher::default(),
    );

    let (card, cash_id) = tokio::join!(
        engine
            .manager
            .execute_command(place_cmd(PaymentMethod::Card, two_burgers())),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;

            let listed = engine
                .manager
                .get_orders_for_restaurant(&owner(), "r-1", None)
                .unwrap();
            assert!(listed.is_empty());
            let mine = engine
                .manager
                .get_orders_for_customer(&customer(), "c-1")
                .unwrap();
            assert!(mine.is_empty());
            assert!(engine.manager.get_events_since(0).unwrap().is_empty());

            // A cash order placed meanwhile is visible, but resync still stops
            // before the pending card order's first event
            let cash_id = place(&engine, PaymentMethod::CashOnDelivery).await;
            assert!(engine.manager.get_order(&owner(), &cash_id).is_ok());
            assert!(engine.manager.get_events_since(0).unwrap().is_empty());
            cash_id
        }
    );

    assert!(card.success, "{:?}", card.error);
    let card_id = card.order_id.unwrap();
    let snapshot = engine.manager.get_order(&owner(), &card_id).unwrap();
    assert_eq!(snapshot.payment.status, PaymentStatus::Completed);

    let listed = engine
        .manager
        .get_orders_for_restaurant(&owner(), "r-1", None)
        .unwrap();
    assert_eq!(listed.len(), 2);

    // Placed (card), placed (cash), payment completed (card)
    let events = engine.manager.get_events_since(0).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1].order_id, cash_id);
    assert_eq!(engine.manager.get_events_for_order(&card_id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_listing_during_declined_charge_is_empty() {
    let engine = create_engine_with(
        SimulatedGateway::new(0.0, Duration::from_millis(200)),
        RecordingPublisher::default(),
    );
    let mut rx = engine.manager.subscribe();

    let (response, seen) = tokio::join!(
        engine
            .manager
            .execute_command(place_cmd(PaymentMethod::Wallet, two_burgers())),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            engine
                .manager
                .get_orders_for_restaurant(&admin(), "r-1", None)
                .unwrap()
                .len()
        }
    );

    assert_eq!(seen, 0);
    assert_eq!(error_code(&response), Some(CommandErrorCode::PaymentFailed));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_compensation_returns_stock() {
    let engine = create_test_engine();
    let stock = [StockLine::new("m-fries", 4)];
    engine.catalog.reserve_stock(&stock).unwrap();
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(6));

    // Nothing stored under this order; the reserved stock still comes back
    engine
        .manager
        .compensate_placement("cmd-missing", "order-missing", &stock);
    assert_eq!(engine.catalog.available_quantity("m-fries"), Some(10));
    assert_eq!(engine.manager.stats().unwrap().order_count, 0);
}
