//! Unified error handling for admin.

use thiserror::Error;

use styleaura_core::storage::StorageError;
use styleaura_storefront::services::validation::ValidationErrors;

/// Error type for admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The caller is not a signed-in administrator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No order, product or announcement with this id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Submitted fields were rejected.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AdminError {
    /// Whether this error is the system's fault rather than the caller's.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Log internal errors and pass the error through.
    #[must_use]
    pub fn report(self) -> Self {
        if self.is_internal() {
            tracing::error!(error = %self, "Admin operation error");
        }
        self
    }

    /// Message safe to show the administrator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "Something went wrong. Please try again.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;
