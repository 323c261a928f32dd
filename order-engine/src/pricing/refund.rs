//! Cancellation refund policy
//!
//! | Status at cancellation | Refund |
//! |------------------------|--------|
//! | pending, confirmed | 100% |
//! | preparing | 80% |
//! | ready_for_pickup | 50% |
//! | anything else | 0 |

use crate::orders::money::{to_decimal, to_f64};
use rust_decimal::Decimal;
use shared::order::OrderStatus;

/// Fraction of the total refunded when cancelling from `status`
pub fn refund_ratio(status: OrderStatus) -> Decimal {
    match status {
        OrderStatus::Pending | OrderStatus::Confirmed => Decimal::ONE,
        OrderStatus::Preparing => Decimal::new(8, 1),
        OrderStatus::ReadyForPickup => Decimal::new(5, 1),
        _ => Decimal::ZERO,
    }
}

pub fn refund_amount(total: f64, status: OrderStatus) -> f64 {
    to_f64(to_decimal(total) * refund_ratio(status))
}
