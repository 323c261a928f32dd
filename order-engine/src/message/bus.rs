//! In-process notification bus
//!
//! ```text
//! OrdersManager ──▶ publish(BusMessage) ──▶ broadcast::Sender
//!                                                 │
//!                              ┌──────────────────┼──────────────────┐
//!                              ▼                  ▼                  ▼
//!                      restaurant:{id}      order:{id}           (others)
//!                       subscribers         subscribers
//! ```
//!
//! Delivery is best-effort: the manager logs a failed publish and moves on.

use shared::message::BusMessage;
use thiserror::Error;
use tokio::sync::broadcast;

/// Default channel capacity
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("No active subscribers for {0}")]
    NoSubscribers(String),

    #[error("Publish failed: {0}")]
    Failed(String),
}

/// Outbound notification seam
///
/// Implementations must not block: they are called after the storage
/// commit, while the per-order lock is still held.
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    fn publish(&self, msg: BusMessage) -> Result<(), PublishError>;
}

/// Topic-keyed broadcast bus
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to every topic
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// Subscribe to a single topic
    pub fn subscribe_topic(&self, topic: impl Into<String>) -> TopicSubscription {
        TopicSubscription {
            topic: topic.into(),
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for MessageBus {
    fn publish(&self, msg: BusMessage) -> Result<(), PublishError> {
        let topic = msg.topic.clone();
        self.tx
            .send(msg)
            .map_err(|_| PublishError::NoSubscribers(topic.clone()))?;
        tracing::debug!(topic = %topic, "Notification published");
        Ok(())
    }
}

/// Receiver filtered to one topic
#[derive(Debug)]
pub struct TopicSubscription {
    topic: String,
    rx: broadcast::Receiver<BusMessage>,
}

impl TopicSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next message on this topic; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if msg.topic == self.topic => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "Topic subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) if msg.topic == self.topic => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
