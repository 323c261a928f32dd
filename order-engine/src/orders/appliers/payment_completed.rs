//! PaymentCompleted event applier

use super::touch;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, PaymentStatus};

/// PaymentCompleted applier
pub struct PaymentCompletedApplier;

impl EventApplier for PaymentCompletedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentCompleted {
            transaction_id,
            gateway,
            amount: _,
        } = &event.payload
        {
            snapshot.payment.status = PaymentStatus::Completed;
            snapshot.payment.transaction_id = Some(transaction_id.clone());
            snapshot.payment.gateway = Some(gateway.clone());
            snapshot.payment.paid_at = Some(event.timestamp);

            touch(snapshot, event);
        }
    }
}
