//! Order commands - requests to mutate orders

use super::snapshot::OrderStatus;
use super::types::{
    Actor, DeliveryAddress, OrderItemInput, PaymentDetails, PaymentMethod, RatingInput,
};
use serde::{Deserialize, Serialize};

/// Order command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Client-generated command ID (idempotency key)
    pub command_id: String,
    /// Actor issuing the command
    pub operator: Actor,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(operator: Actor, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Order targeted by this command (None for PlaceOrder)
    pub fn target_order_id(&self) -> Option<&str> {
        match &self.payload {
            OrderCommandPayload::PlaceOrder { .. } => None,
            OrderCommandPayload::UpdateStatus { order_id, .. }
            | OrderCommandPayload::CancelOrder { order_id, .. }
            | OrderCommandPayload::RateOrder { order_id, .. } => Some(order_id),
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    PlaceOrder {
        customer_id: String,
        restaurant_id: String,
        items: Vec<OrderItemInput>,
        payment_method: PaymentMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_details: Option<PaymentDetails>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_address: Option<DeliveryAddress>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_instructions: Option<String>,
        #[serde(default)]
        tip: f64,
        #[serde(default)]
        discount: f64,
    },
    UpdateStatus {
        order_id: String,
        status: OrderStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        /// Delivery person to assign when going out for delivery
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_person_id: Option<String>,
    },
    CancelOrder {
        order_id: String,
        reason: String,
    },
    RateOrder {
        order_id: String,
        rating: RatingInput,
    },
}
