//! Pricing Module
//!
//! Pure price calculation over `rust_decimal`: line items, order totals and
//! the cancellation refund policy.

mod calculator;
mod refund;

pub use calculator::*;
pub use refund::*;
