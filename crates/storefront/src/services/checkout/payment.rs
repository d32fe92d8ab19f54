//! Payment gateway seam.
//!
//! Checkout charges through a [`PaymentGateway`]. The storefront ships with
//! [`SimulatedGateway`], which waits a fixed latency and approves every
//! charge.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use styleaura_core::{OrderId, PaymentMethodKind, Price};

/// Payment failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The payment provider refused the charge.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The provider could not be reached.
    #[error("payment network error: {0}")]
    Network(String),

    /// No answer within the configured bound.
    #[error("payment timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// What checkout asks the gateway to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub method: PaymentMethodKind,
    /// Last four card digits, for card payments.
    pub card_last4: Option<String>,
}

/// A successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Provider reference, e.g. `PAY-3f2a...`.
    pub reference: String,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub method: PaymentMethodKind,
    pub paid_at: DateTime<Utc>,
}

impl PaymentConfirmation {
    /// The charged amount as a displayable price.
    #[must_use]
    pub const fn amount_price(&self) -> Price {
        Price::inr(self.amount)
    }
}

/// A payment provider.
pub trait PaymentGateway: Send + Sync {
    /// Charge `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] when the charge does not go through.
    fn charge(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentConfirmation, PaymentError>> + Send;
}

/// Gateway that approves every charge after a fixed delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway {
    latency: Duration,
}

impl SimulatedGateway {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(PaymentConfirmation {
            reference: format!("PAY-{}", Uuid::new_v4().simple()),
            order_id: request.order_id.clone(),
            amount: request.amount,
            method: request.method,
            paid_at: Utc::now(),
        })
    }
}
