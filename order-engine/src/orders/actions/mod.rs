//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::OrderEvent;

mod cancel_order;
mod complete_payment;
pub mod place_order;
mod rate_order;
mod update_status;

pub use cancel_order::CancelOrderAction;
pub use complete_payment::CompletePaymentAction;
pub use place_order::PlaceOrderAction;
pub use rate_order::RateOrderAction;
pub use update_status::UpdateStatusAction;

/// CommandAction enum - dispatches to concrete action implementations
///
/// Built by `OrdersManager`, which resolves catalog data and configuration
/// into the action before opening the transaction.
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    CompletePayment(CompletePaymentAction),
    UpdateStatus(UpdateStatusAction),
    CancelOrder(CancelOrderAction),
    RateOrder(RateOrderAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::CompletePayment(action) => action.execute(ctx, metadata).await,
            CommandAction::UpdateStatus(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::RateOrder(action) => action.execute(ctx, metadata).await,
        }
    }
}
