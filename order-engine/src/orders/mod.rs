//! Order Event Sourcing Module
//!
//! - **manager**: `OrdersManager`, command processing and side effects
//! - **actions**: one `CommandHandler` per command
//! - **appliers**: one pure `EventApplier` per event
//! - **storage**: redb persistence for events, snapshots and idempotency
//! - **availability**: restaurant / menu item checks at placement time
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → Event → Storage (redb)
//!                 ↓                      ↓
//!          Payment gateway         Snapshot Update
//!                 ↓
//!     Broadcast + notifications
//! ```

pub mod traits;

pub mod actions;
pub mod appliers;
pub mod availability;
pub mod manager;
pub mod money;
pub mod storage;

// Re-exports
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError};
pub use traits::OrderError;

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, OrderCommand,
    OrderCommandPayload, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
};
