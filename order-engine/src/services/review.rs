//! Review sink
//!
//! Receives one verified review per rated order. Aggregation into
//! restaurant ratings happens elsewhere.

use parking_lot::RwLock;
use shared::models::ReviewRecord;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Review already recorded for order {0}")]
    Duplicate(String),

    #[error("Review sink unavailable: {0}")]
    Unavailable(String),
}

pub trait ReviewSink: Send + Sync + std::fmt::Debug {
    fn submit(&self, record: ReviewRecord) -> Result<(), ReviewError>;
}

/// In-memory review store
#[derive(Debug, Default)]
pub struct ReviewLog {
    records: RwLock<Vec<ReviewRecord>>,
}

impl ReviewLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReviewRecord> {
        self.records.read().clone()
    }

    pub fn for_restaurant(&self, restaurant_id: &str) -> Vec<ReviewRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ReviewSink for ReviewLog {
    fn submit(&self, record: ReviewRecord) -> Result<(), ReviewError> {
        let mut records = self.records.write();
        if records.iter().any(|r| r.order_id == record.order_id) {
            return Err(ReviewError::Duplicate(record.order_id));
        }
        tracing::debug!(order_id = %record.order_id, rating = record.rating, "Review recorded");
        records.push(record);
        Ok(())
    }
}
