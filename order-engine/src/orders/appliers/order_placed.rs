//! OrderPlaced event applier
//!
//! Initializes the snapshot from the frozen placement data.

use super::touch;
use crate::orders::traits::EventApplier;
use shared::order::{
    DeliveryInfo, EventPayload, OrderEvent, OrderSnapshot, OrderStatus, PaymentInfo,
    StatusHistoryEntry,
};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderPlaced {
            order_number,
            customer_id,
            restaurant_id,
            items,
            pricing,
            payment_method,
            delivery_address,
            special_instructions,
        } = &event.payload
        {
            snapshot.order_id = event.order_id.clone();
            snapshot.order_number = order_number.clone();
            snapshot.customer_id = customer_id.clone();
            snapshot.restaurant_id = restaurant_id.clone();
            snapshot.items = items.clone();
            snapshot.pricing = pricing.clone();
            snapshot.payment = PaymentInfo::pending(*payment_method);
            snapshot.delivery = DeliveryInfo {
                address: delivery_address.clone(),
                ..Default::default()
            };
            snapshot.special_instructions = special_instructions.clone();
            snapshot.status = OrderStatus::Pending;
            snapshot.status_history = vec![StatusHistoryEntry {
                status: OrderStatus::Pending,
                timestamp: event.timestamp,
                note: Some("Order placed".to_string()),
                actor_id: event.operator_id.clone(),
                actor_role: event.operator_role,
            }];
            snapshot.created_at = event.timestamp;

            touch(snapshot, event);
        }
    }
}
