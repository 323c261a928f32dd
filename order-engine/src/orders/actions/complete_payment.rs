//! CompletePayment handler
//!
//! Internal command issued by the manager once the gateway accepted the
//! charge of a freshly placed order. Never accepted from clients.

use async_trait::async_trait;

use crate::orders::money::money_eq;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderStatus, PaymentStatus};

/// CompletePayment action
#[derive(Debug, Clone)]
pub struct CompletePaymentAction {
    pub order_id: String,
    pub transaction_id: String,
    pub gateway: String,
    pub amount: f64,
}

#[async_trait]
impl CommandHandler for CompletePaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if snapshot.status != OrderStatus::Pending {
            return Err(OrderError::Validation(format!(
                "Payment can only complete on a pending order (order {} is {})",
                snapshot.order_id, snapshot.status
            )));
        }
        if snapshot.payment.status != PaymentStatus::Pending {
            return Err(OrderError::Validation(format!(
                "Payment for order {} is already {:?}",
                snapshot.order_id, snapshot.payment.status
            )));
        }
        if !snapshot.payment.method.requires_gateway() {
            return Err(OrderError::Validation(format!(
                "Order {} is paid {}",
                snapshot.order_id, snapshot.payment.method
            )));
        }
        if !money_eq(self.amount, snapshot.pricing.total) {
            return Err(OrderError::Payment(format!(
                "Charged amount {} does not match order total {}",
                self.amount, snapshot.pricing.total
            )));
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.operator,
            metadata.command_id.clone(),
            None,
            EventPayload::PaymentCompleted {
                transaction_id: self.transaction_id.clone(),
                gateway: self.gateway.clone(),
                amount: self.amount,
            },
        );

        Ok(vec![event])
    }
}
