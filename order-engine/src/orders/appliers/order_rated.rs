//! OrderRated event applier

use super::touch;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderRating, OrderSnapshot};

/// OrderRated applier
pub struct OrderRatedApplier;

impl EventApplier for OrderRatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderRated { rating } = &event.payload {
            snapshot.rating = Some(OrderRating {
                food: rating.food,
                delivery: rating.delivery,
                overall: rating.overall,
                comment: rating.comment.clone(),
                rated_at: event.timestamp,
            });

            touch(snapshot, event);
        }
    }
}
