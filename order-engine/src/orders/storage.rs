//! redb-based storage layer for order event sourcing
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `snapshots` | `order_id` | `OrderSnapshot` | Snapshot cache |
//! | `processed_commands` | `command_id` | `order_id` | Idempotency check |
//! | `sequence_counter` | `"seq"` / `"order_count"` | `u64` | Global sequence, display numbers |
//!
//! # Durability
//!
//! redb commits are durable once `commit()` returns (copy-on-write with an
//! atomic root swap), so a crash never leaves a half-applied command.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{OrderEvent, OrderSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = (order_id, sequence), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// key = order_id, value = JSON-serialized OrderSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// key = command_id, value = order_id the command affected
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("processed_commands");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";
const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, ephemeral engines)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// redb serializes writers: a second caller blocks until the first
    /// transaction commits or aborts.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current sequence (within transaction)
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Order Counter (display numbers) ==========

    /// Increment the order counter inside a transaction, returning the new count
    pub fn next_order_count_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(ORDER_COUNT_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_COUNT_KEY, next)?;
        Ok(next)
    }

    /// Get current order count (without incrementing)
    pub fn get_order_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(ORDER_COUNT_KEY)?
            .map(|g| g.value())
            .unwrap_or(0))
    }

    // ========== Command Idempotency ==========

    /// Order affected by an already processed command, if any
    pub fn get_processed_command(&self, command_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_string()))
    }

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        Ok(self.get_processed_command(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, order_id)?;
        Ok(())
    }

    /// Forget a processed command so it can be retried
    pub fn unmark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.remove(command_id)?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for an order, in sequence order
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice::<OrderEvent>(value.value())?);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events since a given sequence (across all orders)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a snapshot by order ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Snapshots matching a predicate, newest first
    pub fn find_snapshots<F>(&self, mut predicate: F) -> StorageResult<Vec<OrderSnapshot>>
    where
        F: FnMut(&OrderSnapshot) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut snapshots = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
            if predicate(&snapshot) {
                snapshots.push(snapshot);
            }
        }

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    // ========== Compensation ==========

    /// Physically delete an order: its events and its snapshot
    ///
    /// Only used to roll back a placement whose payment failed.
    /// Returns the number of removed events.
    pub fn remove_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<usize> {
        let mut events = txn.open_table(EVENTS_TABLE)?;

        let mut keys: Vec<u64> = Vec::new();
        for result in events.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (key, _value) = result?;
            keys.push(key.value().1);
        }
        for seq in &keys {
            events.remove((order_id, *seq))?;
        }

        let mut snapshots = txn.open_table(SNAPSHOTS_TABLE)?;
        snapshots.remove(order_id)?;

        Ok(keys.len())
    }

    // ========== Statistics ==========

    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let snapshots_table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let commands_table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            event_count: events_table.len()?,
            order_count: snapshots_table.len()?,
            processed_command_count: commands_table.len()?,
            current_sequence: seq_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub event_count: u64,
    pub order_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Actor, ActorRole, EventPayload, OrderStatus};

    fn create_test_event(order_id: &str, sequence: u64) -> OrderEvent {
        let actor = Actor::new("owner-1", "Owner", ActorRole::RestaurantOwner);
        OrderEvent::new(
            sequence,
            order_id.to_string(),
            &actor,
            uuid::Uuid::new_v4().to_string(),
            None,
            EventPayload::StatusChanged {
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
                note: None,
                estimated_delivery_time: None,
                picked_up_at: None,
                estimated_arrival_time: None,
                delivery_person_id: None,
                actual_delivery_time: None,
                cash_collected: false,
            },
        )
    }

    #[test]
    fn test_sequence_set_and_read() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_current_sequence().unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        storage.set_sequence(&txn, 5).unwrap();
        assert_eq!(storage.get_current_sequence_txn(&txn).unwrap(), 5);
        txn.commit().unwrap();

        assert_eq!(storage.get_current_sequence().unwrap(), 5);
    }

    #[test]
    fn test_order_count_rolls_back_with_txn() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_count_txn(&txn).unwrap(), 1);
        txn.abort().unwrap();
        assert_eq!(storage.get_order_count().unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_count_txn(&txn).unwrap(), 1);
        assert_eq!(storage.next_order_count_txn(&txn).unwrap(), 2);
        txn.commit().unwrap();
        assert_eq!(storage.get_order_count().unwrap(), 2);
    }

    #[test]
    fn test_command_idempotency() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert!(!storage.is_command_processed("cmd-123").unwrap());

        let txn = storage.begin_write().unwrap();
        storage
            .mark_command_processed(&txn, "cmd-123", "order-1")
            .unwrap();
        txn.commit().unwrap();

        assert!(storage.is_command_processed("cmd-123").unwrap());
        assert_eq!(
            storage.get_processed_command("cmd-123").unwrap().as_deref(),
            Some("order-1")
        );

        let txn = storage.begin_write().unwrap();
        storage.unmark_command_processed(&txn, "cmd-123").unwrap();
        txn.commit().unwrap();
        assert!(!storage.is_command_processed("cmd-123").unwrap());
    }

    #[test]
    fn test_events_are_scoped_and_ordered() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("order-1", 3)).unwrap();
        storage.store_event(&txn, &create_test_event("order-2", 2)).unwrap();
        storage.store_event(&txn, &create_test_event("order-1", 1)).unwrap();
        txn.commit().unwrap();

        let events = storage.get_events_for_order("order-1").unwrap();
        assert_eq!(
            events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 3]
        );

        let since = storage.get_events_since(1).unwrap();
        assert_eq!(
            since.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_snapshot_storage_and_lookup() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let mut a = OrderSnapshot::new("order-a".to_string());
        a.customer_id = "c-1".to_string();
        let mut b = OrderSnapshot::new("order-b".to_string());
        b.customer_id = "c-2".to_string();

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &a).unwrap();
        storage.store_snapshot(&txn, &b).unwrap();
        assert!(storage.get_snapshot_txn(&txn, "order-a").unwrap().is_some());
        txn.commit().unwrap();

        assert_eq!(storage.get_snapshot("order-b").unwrap(), Some(b));
        assert!(storage.get_snapshot("missing").unwrap().is_none());

        let found = storage.find_snapshots(|s| s.customer_id == "c-1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].order_id, "order-a");
    }

    #[test]
    fn test_remove_order_deletes_events_and_snapshot() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &create_test_event("order-1", 1)).unwrap();
        storage.store_event(&txn, &create_test_event("order-1", 2)).unwrap();
        storage.store_event(&txn, &create_test_event("order-2", 3)).unwrap();
        storage
            .store_snapshot(&txn, &OrderSnapshot::new("order-1".to_string()))
            .unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.remove_order(&txn, "order-1").unwrap(), 2);
        txn.commit().unwrap();

        assert!(storage.get_events_for_order("order-1").unwrap().is_empty());
        assert!(storage.get_snapshot("order-1").unwrap().is_none());
        assert_eq!(storage.get_events_for_order("order-2").unwrap().len(), 1);

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.event_count, 1);
        assert_eq!(stats.order_count, 0);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");
        {
            let storage = OrderStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.set_sequence(&txn, 9).unwrap();
            txn.commit().unwrap();
        }
        let storage = OrderStorage::open(&path).unwrap();
        assert_eq!(storage.get_current_sequence().unwrap(), 9);
    }
}
