//! StatusChanged event applier
//!
//! Sets the new status, appends history and copies the derived fields
//! carried by the event.

use super::touch;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentStatus, StatusHistoryEntry};

/// StatusChanged applier
pub struct StatusChangedApplier;

impl EventApplier for StatusChangedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::StatusChanged {
            from: _,
            to,
            note,
            estimated_delivery_time,
            picked_up_at,
            estimated_arrival_time,
            delivery_person_id,
            actual_delivery_time,
            cash_collected,
        } = &event.payload
        {
            snapshot.status = *to;
            snapshot.status_history.push(StatusHistoryEntry {
                status: *to,
                timestamp: event.timestamp,
                note: note.clone(),
                actor_id: event.operator_id.clone(),
                actor_role: event.operator_role,
            });

            let delivery = &mut snapshot.delivery;
            if estimated_delivery_time.is_some() {
                delivery.estimated_delivery_time = *estimated_delivery_time;
            }
            if picked_up_at.is_some() {
                delivery.picked_up_at = *picked_up_at;
            }
            if estimated_arrival_time.is_some() {
                delivery.estimated_arrival_time = *estimated_arrival_time;
            }
            if delivery_person_id.is_some() {
                delivery.delivery_person_id = delivery_person_id.clone();
            }
            if actual_delivery_time.is_some() {
                delivery.actual_delivery_time = *actual_delivery_time;
            }

            if *cash_collected {
                snapshot.payment.status = PaymentStatus::Completed;
                snapshot.payment.paid_at = Some(event.timestamp);
            }

            touch(snapshot, event);
        }
    }
}
