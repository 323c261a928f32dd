//! Notification message types
//!
//! Published by the order engine after each committed lifecycle change and
//! consumed by real-time channels (websocket rooms, push gateways).

use crate::order::{OrderSnapshot, OrderStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// New order for a restaurant (after payment succeeded or for cash orders)
    NewOrder,
    /// Order status changed
    OrderStatusUpdated,
    /// Order cancelled
    OrderCancelled,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::NewOrder => write!(f, "new-order"),
            NotificationKind::OrderStatusUpdated => write!(f, "order-status-updated"),
            NotificationKind::OrderCancelled => write!(f, "order-cancelled"),
        }
    }
}

/// Topic for restaurant-facing notifications
pub fn restaurant_topic(restaurant_id: &str) -> String {
    format!("restaurant:{}", restaurant_id)
}

/// Topic for order-facing notifications (customer, courier)
pub fn order_topic(order_id: &str) -> String {
    format!("order:{}", order_id)
}

/// Minimal actor-visible order payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_id: String,
    pub order_number: String,
    pub restaurant_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<f64>,
}

impl OrderNotification {
    pub fn from_snapshot(snapshot: &OrderSnapshot) -> Self {
        Self {
            order_id: snapshot.order_id.clone(),
            order_number: snapshot.order_number.clone(),
            restaurant_id: snapshot.restaurant_id.clone(),
            customer_id: snapshot.customer_id.clone(),
            status: snapshot.status,
            total: snapshot.pricing.total,
            estimated_delivery_time: snapshot.delivery.estimated_delivery_time,
            note: snapshot
                .status_history
                .last()
                .and_then(|entry| entry.note.clone()),
            refund_amount: snapshot.cancellation.as_ref().map(|c| c.refund_amount),
        }
    }
}

/// Message bus envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub topic: String,
    pub kind: NotificationKind,
    pub payload: OrderNotification,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, kind: NotificationKind, payload: OrderNotification) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            topic: topic.into(),
            kind,
            payload,
            timestamp: crate::util::now_millis(),
        }
    }

    /// Serialize for transport
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
