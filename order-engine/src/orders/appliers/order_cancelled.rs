//! OrderCancelled event applier

use super::touch;
use crate::orders::traits::EventApplier;
use shared::order::{
    CancellationInfo, EventPayload, OrderEvent, OrderSnapshot, OrderStatus, PaymentStatus,
    StatusHistoryEntry,
};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled {
            reason,
            previous_status,
            refund_amount,
            payment_refunded,
            stock_restored: _,
        } = &event.payload
        {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.status_history.push(StatusHistoryEntry {
                status: OrderStatus::Cancelled,
                timestamp: event.timestamp,
                note: Some(format!("Cancelled by {}: {}", event.operator_role, reason)),
                actor_id: event.operator_id.clone(),
                actor_role: event.operator_role,
            });
            snapshot.cancellation = Some(CancellationInfo {
                reason: reason.clone(),
                cancelled_by: event.operator_id.clone(),
                actor_role: event.operator_role,
                previous_status: *previous_status,
                refund_amount: *refund_amount,
                cancelled_at: event.timestamp,
            });

            if *payment_refunded {
                snapshot.payment.status = PaymentStatus::Refunded;
                snapshot.payment.refunded_at = Some(event.timestamp);
                snapshot.payment.refund_amount = Some(*refund_amount);
            }

            touch(snapshot, event);
        }
    }
}
