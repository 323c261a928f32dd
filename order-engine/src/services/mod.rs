//! Collaborators the order engine talks to
//!
//! - [`CatalogService`] - restaurants, menu items and stock
//! - [`PaymentGateway`] - charges for card, UPI and wallet orders
//! - [`ReviewSink`] - verified reviews from rated orders

pub mod catalog_service;
pub mod payment;
pub mod review;

pub use catalog_service::{CatalogError, CatalogService, StockLine};
pub use payment::{
    charge_with_timeout, ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway,
    SimulatedGateway,
};
pub use review::{ReviewError, ReviewLog, ReviewSink};
