//! Order events - immutable facts recorded after command processing
//!
//! Each payload carries every derived change it causes, so applying an
//! event never consults anything but the event itself.

use super::snapshot::OrderStatus;
use super::types::{
    Actor, ActorRole, DeliveryAddress, OrderItemSnapshot, OrderPricing, PaymentMethod,
    RatingInput,
};
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds) - AUTHORITATIVE for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds) - for audit and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Operator who triggered this event
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    pub operator_role: ActorRole,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    pub event_type: OrderEventType,
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderPlaced,
    PaymentCompleted,
    StatusChanged,
    OrderCancelled,
    OrderRated,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderPlaced => write!(f, "ORDER_PLACED"),
            OrderEventType::PaymentCompleted => write!(f, "PAYMENT_COMPLETED"),
            OrderEventType::StatusChanged => write!(f, "STATUS_CHANGED"),
            OrderEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventType::OrderRated => write!(f, "ORDER_RATED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderPlaced {
        order_number: String,
        customer_id: String,
        restaurant_id: String,
        items: Vec<OrderItemSnapshot>,
        pricing: OrderPricing,
        payment_method: PaymentMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_address: Option<DeliveryAddress>,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_instructions: Option<String>,
    },

    PaymentCompleted {
        transaction_id: String,
        gateway: String,
        amount: f64,
    },

    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        /// Entering `confirmed`
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_delivery_time: Option<i64>,
        /// Entering `out_for_delivery`
        #[serde(skip_serializing_if = "Option::is_none")]
        picked_up_at: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_arrival_time: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_person_id: Option<String>,
        /// Entering `delivered`
        #[serde(skip_serializing_if = "Option::is_none")]
        actual_delivery_time: Option<i64>,
        /// Cash-on-delivery payment collected at the door
        #[serde(default)]
        cash_collected: bool,
    },

    OrderCancelled {
        reason: String,
        previous_status: OrderStatus,
        refund_amount: f64,
        /// Payment was completed and is now refunded
        payment_refunded: bool,
        /// Reserved stock returned to the catalog
        #[serde(default)]
        stock_restored: bool,
    },

    OrderRated {
        rating: RatingInput,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderPlaced { .. } => OrderEventType::OrderPlaced,
            EventPayload::PaymentCompleted { .. } => OrderEventType::PaymentCompleted,
            EventPayload::StatusChanged { .. } => OrderEventType::StatusChanged,
            EventPayload::OrderCancelled { .. } => OrderEventType::OrderCancelled,
            EventPayload::OrderRated { .. } => OrderEventType::OrderRated,
        }
    }
}

impl OrderEvent {
    /// Create a new event
    ///
    /// The server timestamp is always taken here; the client timestamp is
    /// preserved for audit only.
    pub fn new(
        sequence: u64,
        order_id: String,
        operator: &Actor,
        command_id: String,
        client_timestamp: Option<i64>,
        payload: EventPayload,
    ) -> Self {
        Self::with_timestamp(
            sequence,
            order_id,
            operator,
            command_id,
            client_timestamp,
            chrono::Utc::now().timestamp_millis(),
            payload,
        )
    }

    /// Create an event with an explicit server timestamp
    ///
    /// Used when derived fields in the payload were computed from the same instant.
    pub fn with_timestamp(
        sequence: u64,
        order_id: String,
        operator: &Actor,
        command_id: String,
        client_timestamp: Option<i64>,
        timestamp: i64,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp,
            client_timestamp,
            operator_id: operator.id.clone(),
            operator_name: operator.name.clone(),
            operator_role: operator.role,
            command_id,
            event_type: payload.event_type(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_follows_payload() {
        let actor = Actor::new("owner-1", "Bob", ActorRole::RestaurantOwner);
        let event = OrderEvent::new(
            7,
            "order-1".to_string(),
            &actor,
            "cmd-1".to_string(),
            Some(42),
            EventPayload::StatusChanged {
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
                note: None,
                estimated_delivery_time: Some(1_000),
                picked_up_at: None,
                estimated_arrival_time: None,
                delivery_person_id: None,
                actual_delivery_time: None,
                cash_collected: false,
            },
        );
        assert_eq!(event.event_type, OrderEventType::StatusChanged);
        assert_eq!(event.operator_role, ActorRole::RestaurantOwner);
        assert_eq!(event.client_timestamp, Some(42));
    }

    #[test]
    fn test_payload_is_tagged() {
        let payload = EventPayload::PaymentCompleted {
            transaction_id: "txn-1".to_string(),
            gateway: "simulated".to_string(),
            amount: 12.5,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "PAYMENT_COMPLETED");
        assert_eq!(json["transaction_id"], "txn-1");
    }
}
