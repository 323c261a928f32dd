//! Order Engine - food delivery order processing
//!
//! Takes an order from placement through payment, preparation, delivery,
//! cancellation and rating. Every change is an event in redb; snapshots are
//! the fold of those events.
//!
//! # Module structure
//!
//! ```text
//! order-engine/src/
//! ├── core/       # Configuration
//! ├── auth/       # Order access policy
//! ├── orders/     # Event sourcing: manager, actions, appliers, storage
//! ├── pricing/    # Price and refund calculation
//! ├── services/   # Catalog, payment gateway, review sink
//! ├── message/    # Notification bus
//! └── utils/      # Logging
//! ```

pub mod auth;
pub mod core;
pub mod message;
pub mod orders;
pub mod pricing;
pub mod services;
pub mod utils;

// Re-export public types
pub use core::Config;
pub use message::{EventPublisher, MessageBus};
pub use orders::{ManagerError, OrderStorage, OrdersManager};
pub use services::{CatalogService, PaymentGateway, ReviewLog, ReviewSink, SimulatedGateway};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
