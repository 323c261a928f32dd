//! RateOrder command handler

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderStatus, RatingInput};

const MAX_COMMENT_LEN: usize = 2000;

/// RateOrder action
#[derive(Debug, Clone)]
pub struct RateOrderAction {
    pub order_id: String,
    pub rating: RatingInput,
}

fn validate_score(value: u8, field: &str) -> Result<(), OrderError> {
    if !(1..=5).contains(&value) {
        return Err(OrderError::Validation(format!(
            "{} rating must be between 1 and 5, got {}",
            field, value
        )));
    }
    Ok(())
}

#[async_trait]
impl CommandHandler for RateOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if snapshot.status != OrderStatus::Delivered {
            return Err(OrderError::Validation(format!(
                "Only delivered orders can be rated (order {} is {})",
                snapshot.order_number, snapshot.status
            )));
        }
        if snapshot.rating.is_some() {
            return Err(OrderError::Validation(format!(
                "Order {} has already been rated",
                snapshot.order_number
            )));
        }

        validate_score(self.rating.food, "food")?;
        validate_score(self.rating.delivery, "delivery")?;
        validate_score(self.rating.overall, "overall")?;
        if let Some(comment) = &self.rating.comment
            && comment.chars().count() > MAX_COMMENT_LEN
        {
            return Err(OrderError::Validation(format!(
                "Comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.operator,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderRated {
                rating: self.rating.clone(),
            },
        );

        Ok(vec![event])
    }
}
