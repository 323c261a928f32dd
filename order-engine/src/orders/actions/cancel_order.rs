//! CancelOrder command handler
//!
//! Cancellation is separate from status updates: it accepts a narrower set
//! of source statuses than the graph and computes the refund.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::pricing::refund_amount;
use shared::order::{EventPayload, OrderEvent, OrderStatus, PaymentStatus};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if !snapshot.status.is_cancellable() {
            return Err(OrderError::Validation(format!(
                "Order {} cannot be cancelled while {}",
                snapshot.order_number, snapshot.status
            )));
        }

        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(OrderError::Validation(
                "Cancellation reason is required".to_string(),
            ));
        }

        let refund = refund_amount(snapshot.pricing.total, snapshot.status);
        let payment_refunded = snapshot.payment.status == PaymentStatus::Completed && refund > 0.0;
        // Kitchen has not started: reserved stock goes back
        let stock_restored = matches!(
            snapshot.status,
            OrderStatus::Pending | OrderStatus::Confirmed
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.operator,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderCancelled {
                reason: reason.to_string(),
                previous_status: snapshot.status,
                refund_amount: refund,
                payment_refunded,
                stock_restored,
            },
        );

        Ok(vec![event])
    }
}
