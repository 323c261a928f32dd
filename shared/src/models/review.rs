//! Review Model

use serde::{Deserialize, Serialize};

/// Review derived from the first rating of a delivered order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub order_id: String,
    pub customer_id: String,
    pub restaurant_id: String,
    /// Overall score, 1..=5
    pub rating: u8,
    pub food_rating: u8,
    pub delivery_rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Always true: the reviewer received this order
    pub is_verified_purchase: bool,
    pub created_at: i64,
}
