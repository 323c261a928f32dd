//! Payment gateway abstraction
//!
//! The manager charges gateway-backed methods right after the order is
//! committed and rolls the order back when the charge fails. Cash on
//! delivery never reaches this module.

use async_trait::async_trait;
use shared::order::{PaymentDetails, PaymentMethod, PaymentStatus};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Gateway did not answer within {0} ms")]
    Timeout(u64),
}

/// Charge request sent to the gateway
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: String,
    pub method: PaymentMethod,
    pub amount: f64,
    pub details: Option<PaymentDetails>,
}

/// Successful charge
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeReceipt {
    pub transaction_id: String,
    pub gateway: String,
    pub status: PaymentStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, PaymentError>;
}

/// Gateway stand-in with a configurable success rate and latency
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    /// Probability in `[0, 1]` that a charge succeeds
    pub success_rate: f64,
    pub latency: Duration,
    pub name: String,
}

impl SimulatedGateway {
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
            name: "simulated".to_string(),
        }
    }

    pub fn always_approve() -> Self {
        Self::new(1.0, Duration::ZERO)
    }

    pub fn always_decline() -> Self {
        Self::new(0.0, Duration::ZERO)
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(0.95, Duration::from_millis(50))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        if !request.method.requires_gateway() {
            return Err(PaymentError::Gateway(format!(
                "{} is not charged through a gateway",
                request.method
            )));
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(PaymentError::Declined(format!(
                "invalid amount {}",
                request.amount
            )));
        }

        // ThreadRng is not Send: draw before the await point
        let roll: f64 = rand::random();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if roll < self.success_rate {
            let transaction_id = format!("txn_{}", uuid::Uuid::new_v4().simple());
            tracing::debug!(
                order_id = %request.order_id,
                transaction_id = %transaction_id,
                amount = request.amount,
                "Simulated charge approved"
            );
            Ok(ChargeReceipt {
                transaction_id,
                gateway: self.name.clone(),
                status: PaymentStatus::Completed,
            })
        } else {
            tracing::debug!(order_id = %request.order_id, "Simulated charge declined");
            Err(PaymentError::Declined("card issuer declined".to_string()))
        }
    }
}

/// Charge with an upper bound on gateway latency
pub async fn charge_with_timeout(
    gateway: &dyn PaymentGateway,
    request: ChargeRequest,
    timeout: Duration,
) -> Result<ChargeReceipt, PaymentError> {
    match tokio::time::timeout(timeout, gateway.charge(request)).await {
        Ok(result) => result,
        Err(_) => Err(PaymentError::Timeout(timeout.as_millis() as u64)),
    }
}
