//! Authorization
//!
//! Actors arrive already authenticated; this module only decides whether
//! an actor may perform an operation on an order.

pub mod policy;

pub use policy::{authorize, AuthError, OrderAction, OrderResource};
