//! Unified error handling.
//!
//! Provides a unified `AppError` type for front-ends. Internal failures are
//! logged when reported; users only see a safe message.

use thiserror::Error;

use styleaura_core::storage::StorageError;

use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::{CheckoutError, PaymentError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// The product catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this is a failure of the system rather than of the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Catalog(_)
                | Self::Config(_)
                | Self::Auth(AuthError::Storage(_))
                | Self::Cart(CartError::Storage(_))
                | Self::Checkout(CheckoutError::Cart(CartError::Storage(_)))
        )
    }

    /// Log internal failures. Returns `self` for chaining.
    #[must_use]
    pub fn report(self) -> Self {
        if self.is_internal() {
            tracing::error!(error = %self, "Request error");
        }
        self
    }

    /// Message safe to show to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        // Don't expose internal error details to users
        if self.is_internal() {
            return "Something went wrong, please try again".to_string();
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::Validation(errors) => errors.to_string(),
                AuthError::NoActiveIdentity => "Please sign in first".to_string(),
                AuthError::Superseded => "Your session changed, please try again".to_string(),
                AuthError::Storage(_) => "Authentication error".to_string(),
            },
            Self::Cart(CartError::RequiresAuthentication) => "Please sign in to use your cart".to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::Validation(errors) => errors.to_string(),
                CheckoutError::Payment(PaymentError::Declined(_)) => {
                    "Your payment was declined".to_string()
                }
                CheckoutError::Payment(PaymentError::Network(_) | PaymentError::Timeout(_)) => {
                    "Payment could not be completed, please try again".to_string()
                }
                CheckoutError::SessionChanged => {
                    "You signed in as someone else during checkout".to_string()
                }
                CheckoutError::OrderNotRecorded { order_id, .. } => format!(
                    "Your payment went through but order {order_id} could not be saved, please place it again"
                ),
                other => other.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::services::validation::ValidationErrors;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let err = AppError::from(StorageError::Io(std::io::Error::other("disk full")));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("disk full"));

        let err = AppError::from(CartError::Storage(StorageError::Io(std::io::Error::other(
            "disk full",
        ))));
        assert!(err.is_internal());
    }

    #[test]
    fn test_user_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("pincode", "Please enter a valid pincode");
        let err = AppError::from(CheckoutError::Validation(errors));
        assert_eq!(err.user_message(), "pincode: Please enter a valid pincode");

        let err = AppError::from(CheckoutError::Payment(PaymentError::Timeout(
            Duration::from_secs(10),
        )));
        assert!(!err.is_internal());
        assert_eq!(
            err.user_message(),
            "Payment could not be completed, please try again"
        );

        let err = AppError::from(CartError::RequiresAuthentication);
        assert_eq!(err.user_message(), "Please sign in to use your cart");

        let err = AppError::from(CheckoutError::OrderNotRecorded {
            order_id: styleaura_core::OrderId::new("ORD-0123456789"),
            reference: "PAY-1".to_string(),
            source: StorageError::Io(std::io::Error::other("disk full")),
        });
        assert!(!err.is_internal());
        assert!(err.user_message().contains("ORD-0123456789"));
        assert!(!err.user_message().contains("disk full"));
    }
}
