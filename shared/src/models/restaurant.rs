//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// Restaurant entity (the parts the order engine needs)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: String,
    /// Owning user, checked by the authorization policy
    pub owner_id: String,
    pub name: String,
    pub status: RestaurantStatus,
    /// Minimum subtotal accepted for an order
    #[serde(default)]
    pub minimum_order: f64,
    #[serde(default)]
    pub delivery_fee: f64,
}

impl Restaurant {
    pub fn is_active(&self) -> bool {
        self.status == RestaurantStatus::Active
    }
}
