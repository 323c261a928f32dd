//! UpdateStatus command handler
//!
//! Moves an order along the transition graph. Derived fields for the
//! target status are computed here and carried by the event.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{
    ActorRole, EventPayload, OrderEvent, OrderStatus, PaymentMethod, PaymentStatus,
};

/// UpdateStatus action
#[derive(Debug, Clone)]
pub struct UpdateStatusAction {
    pub order_id: String,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub delivery_person_id: Option<String>,
    /// Kitchen estimate added on confirmation (ms)
    pub preparation_millis: i64,
    /// Courier estimate (ms)
    pub delivery_millis: i64,
}

#[async_trait]
impl CommandHandler for UpdateStatusAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if !snapshot.status.can_transition_to(self.status) {
            return Err(OrderError::Validation(format!(
                "Cannot transition order {} from {} to {}",
                snapshot.order_number, snapshot.status, self.status
            )));
        }

        let now = shared::util::now_millis();
        let mut estimated_delivery_time = None;
        let mut picked_up_at = None;
        let mut estimated_arrival_time = None;
        let mut delivery_person_id = None;
        let mut actual_delivery_time = None;
        let mut cash_collected = false;

        match self.status {
            OrderStatus::Confirmed => {
                estimated_delivery_time = Some(now + self.preparation_millis + self.delivery_millis);
            }
            OrderStatus::OutForDelivery => {
                picked_up_at = Some(now);
                estimated_arrival_time = Some(now + self.delivery_millis);
                // A courier picking up an order without explicit assignment takes it
                delivery_person_id = self.delivery_person_id.clone().or_else(|| {
                    (metadata.operator.role == ActorRole::DeliveryPartner)
                        .then(|| metadata.operator.id.clone())
                });
            }
            OrderStatus::Delivered => {
                actual_delivery_time = Some(now);
                cash_collected = snapshot.payment.method == PaymentMethod::CashOnDelivery
                    && snapshot.payment.status == PaymentStatus::Pending;
            }
            _ => {}
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::with_timestamp(
            seq,
            self.order_id.clone(),
            &metadata.operator,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            now,
            EventPayload::StatusChanged {
                from: snapshot.status,
                to: self.status,
                note: self.note.clone(),
                estimated_delivery_time,
                picked_up_at,
                estimated_arrival_time,
                delivery_person_id,
                actual_delivery_time,
                cash_collected,
            },
        );

        Ok(vec![event])
    }
}
