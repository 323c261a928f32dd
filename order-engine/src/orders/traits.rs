//! Core traits for the command / event pipeline
//!
//! - [`CommandHandler`]: validates a command against current state and
//!   produces events. May read, never writes.
//! - [`EventApplier`]: folds one event into a snapshot. Pure.
//! - [`CommandContext`]: transaction-scoped view of snapshots plus the
//!   sequence allocator.

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::order::{Actor, OrderEvent, OrderSnapshot};
use std::collections::HashMap;
use thiserror::Error;

use super::storage::OrderStorage;

/// Errors raised while handling a command
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// Bad input, illegal transition, minimum order unmet, already rated...
    #[error("{0}")]
    Validation(String),

    /// Order, restaurant or menu item absent
    #[error("{0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Authorization(String),

    /// Gateway declined, errored or timed out
    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn order_not_found(order_id: &str) -> Self {
        OrderError::NotFound(format!("Order not found: {}", order_id))
    }
}

/// Command metadata shared by every action
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator: Actor,
    /// Client timestamp (audit only)
    pub timestamp: i64,
}

/// Transaction-scoped command context
///
/// Snapshots loaded through the context are cached, so an action that emits
/// several events for one order sees its own pending changes once the
/// manager applies them.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    current_sequence: u64,
    snapshots: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a OrderStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            current_sequence,
            snapshots: HashMap::new(),
        }
    }

    /// Load a snapshot (pending changes first, then the transaction view)
    pub fn load_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, order_id)
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or_else(|| OrderError::order_not_found(order_id))
    }

    /// Stage a snapshot to be persisted with the transaction
    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.current_sequence += 1;
        self.current_sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    /// Allocate the next display-number counter inside this transaction
    ///
    /// Rolled back together with the transaction, so aborted placements do
    /// not burn numbers.
    pub fn next_order_count(&self) -> Result<u64, OrderError> {
        self.storage
            .next_order_count_txn(self.txn)
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Snapshots staged by this command
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.snapshots.values()
    }
}

/// Command handler - turns a validated command into events
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier - folds one event into a snapshot
///
/// Must be pure: everything it needs is carried by the event.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}
