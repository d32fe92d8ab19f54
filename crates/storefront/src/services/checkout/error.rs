//! Checkout error types.

use thiserror::Error;

use styleaura_core::OrderId;
use styleaura_core::storage::StorageError;

use super::CheckoutStep;
use super::payment::PaymentError;
use crate::services::cart::CartError;
use crate::services::validation::ValidationErrors;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Form input failed validation; the step did not change.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// The action is not allowed at the current step.
    #[error("cannot {action} while {step}")]
    InvalidStep {
        step: CheckoutStep,
        action: &'static str,
    },

    /// The cart was emptied after checkout began.
    #[error("the cart is empty")]
    EmptyCart,

    /// A different identity signed in while checkout was running; the cart
    /// was left untouched.
    #[error("the signed-in identity changed during checkout")]
    SessionChanged,

    /// The charge failed; checkout went back to the step it was submitted
    /// from.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The charge went through but the order could not be written. The cart
    /// is kept; placing the order again retries the write only.
    #[error("payment {reference} was taken but order {order_id} could not be saved: {source}")]
    OrderNotRecorded {
        order_id: OrderId,
        reference: String,
        #[source]
        source: StorageError,
    },

    #[error("cart error: {0}")]
    Cart(#[from] CartError),
}
