//! Order snapshot - computed state from event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection.
//! Consumers replaying the event stream can compare their locally computed
//! checksum with the engine's to detect a diverging reducer.

use super::types::{
    CancellationInfo, DeliveryInfo, OrderItemSnapshot, OrderPricing, OrderRating, PaymentInfo,
    PaymentMethod, StatusHistoryEntry,
};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use thiserror::Error;

/// Order status
///
/// Stable wire contract: serialized in `snake_case`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

/// Unknown status string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Legal successors in the transition graph
    ///
    /// `Refunded` never appears here: it is not a regular status target.
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::ReadyForPickup, OrderStatus::Cancelled],
            OrderStatus::ReadyForPickup => &[OrderStatus::OutForDelivery],
            OrderStatus::OutForDelivery => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.successors().contains(&target)
    }

    /// Whether the cancel operation accepts this status
    ///
    /// Narrower than the graph: `ReadyForPickup` is cancellable even though
    /// `Cancelled` is not among its successors.
    pub fn is_cancellable(&self) -> bool {
        !matches!(
            self,
            OrderStatus::OutForDelivery
                | OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::Refunded
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Order snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by the engine)
    pub order_id: String,
    /// Human-facing order number
    pub order_number: String,
    pub customer_id: String,
    pub restaurant_id: String,
    /// Line items (snapshots, never recomputed)
    pub items: Vec<OrderItemSnapshot>,
    pub pricing: OrderPricing,
    pub status: OrderStatus,
    /// Append-only audit trail
    pub status_history: Vec<StatusHistoryEntry>,
    pub payment: PaymentInfo,
    pub delivery: DeliveryInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<CancellationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<OrderRating>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Last applied event sequence (for incremental updates)
    pub last_sequence: u64,
    /// State checksum for drift detection (hex string)
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create a new empty order
    pub fn new(order_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Self {
            order_id,
            order_number: String::new(),
            customer_id: String::new(),
            restaurant_id: String::new(),
            items: Vec::new(),
            pricing: OrderPricing::default(),
            status: OrderStatus::Pending,
            status_history: Vec::new(),
            payment: PaymentInfo::pending(PaymentMethod::CashOnDelivery),
            delivery: DeliveryInfo::default(),
            special_instructions: None,
            cancellation: None,
            rating: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn total(&self) -> f64 {
        self.pricing.total
    }

    /// Compute state checksum for drift detection
    ///
    /// Fields included: item count, total (cents), history length,
    /// last_sequence, status, payment status and whether a rating exists.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();

        self.items.len().hash(&mut hasher);
        ((self.pricing.total * 100.0).round() as i64).hash(&mut hasher);
        self.status_history.len().hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        (self.status as u8).hash(&mut hasher);
        (self.payment.status as u8).hash(&mut hasher);
        self.rating.is_some().hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Returns false if drift detected
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

impl Default for OrderSnapshot {
    fn default() -> Self {
        Self::new(String::new())
    }
}
