//! Authentication error types.

use thiserror::Error;

use styleaura_core::storage::StorageError;

use crate::services::validation::ValidationErrors;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input failed validation; nothing was changed.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// The operation needs a signed-in identity.
    #[error("no identity is signed in")]
    NoActiveIdentity,

    /// A newer login, registration or logout happened while this operation
    /// was in flight; its result was dropped.
    #[error("superseded by a newer session change")]
    Superseded,

    /// The identity record could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
