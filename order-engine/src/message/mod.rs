//! Notification publishing
//!
//! - [`EventPublisher`]: outbound seam the manager publishes through
//! - [`MessageBus`]: in-process topic broadcast (default publisher)

pub mod bus;

pub use bus::{EventPublisher, MessageBus, PublishError};
pub use shared::message::{order_topic, restaurant_topic, BusMessage, NotificationKind};
