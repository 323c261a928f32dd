//! Shared types for the order processing engine
//!
//! Wire-level types used by the engine and by any HTTP/RPC layer built on
//! top of it: commands, events, order snapshots, catalog models and
//! notification payloads.

pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, NotificationKind, OrderNotification};
