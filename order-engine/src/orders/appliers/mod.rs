//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions.

use enum_dispatch::enum_dispatch;

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod order_cancelled;
mod order_placed;
mod order_rated;
mod payment_completed;
mod status_changed;

pub use order_cancelled::OrderCancelledApplier;
pub use order_placed::OrderPlacedApplier;
pub use order_rated::OrderRatedApplier;
pub use payment_completed::PaymentCompletedApplier;
pub use status_changed::StatusChangedApplier;

/// One variant per event type, dispatched statically
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    PaymentCompleted(PaymentCompletedApplier),
    StatusChanged(StatusChangedApplier),
    OrderCancelled(OrderCancelledApplier),
    OrderRated(OrderRatedApplier),
}

/// Pick the applier for an event's payload
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            EventPayload::PaymentCompleted { .. } => {
                EventAction::PaymentCompleted(PaymentCompletedApplier)
            }
            EventPayload::StatusChanged { .. } => EventAction::StatusChanged(StatusChangedApplier),
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::OrderRated { .. } => EventAction::OrderRated(OrderRatedApplier),
        }
    }
}

/// Fold an ordered event stream into a fresh snapshot
pub fn replay(order_id: &str, events: &[OrderEvent]) -> OrderSnapshot {
    let mut snapshot = OrderSnapshot::new(order_id.to_string());
    for event in events {
        let applier: EventAction = event.into();
        applier.apply(&mut snapshot, event);
    }
    snapshot
}

/// Bookkeeping shared by every applier
fn touch(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
    snapshot.update_checksum();
}
