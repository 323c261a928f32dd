//! Data models
//!
//! Catalog and review records consumed by the order engine. The engine reads
//! them as frozen snapshots; only `available_quantity` is ever written back.

pub mod menu_item;
pub mod restaurant;
pub mod review;

// Re-exports
pub use menu_item::*;
pub use restaurant::*;
pub use review::*;
