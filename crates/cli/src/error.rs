//! Errors surfaced by `sa-cli` commands.

use thiserror::Error;

use styleaura_admin::error::AdminError;
use styleaura_core::storage::StorageError;
use styleaura_storefront::config::ConfigError;
use styleaura_storefront::error::AppError;
use styleaura_storefront::models::Route;
use styleaura_storefront::services::auth::AuthError;
use styleaura_storefront::services::cart::CartError;
use styleaura_storefront::services::catalog::CatalogError;
use styleaura_storefront::services::checkout::CheckoutError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    /// The storefront would have sent the shopper elsewhere.
    #[error("Redirected to {0}; sign in or fill the cart first")]
    Redirect(Route),

    /// Arguments were well-formed but make no sense together.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Log internal errors and return the text to show.
    #[must_use]
    pub fn into_message(self) -> String {
        match self {
            Self::App(e) => e.report().user_message(),
            Self::Admin(e) => e.report().user_message(),
            other => other.to_string(),
        }
    }
}

macro_rules! via_app_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CliError {
                fn from(e: $source) -> Self {
                    Self::App(AppError::from(e))
                }
            }
        )*
    };
}

via_app_error!(
    AuthError,
    CartError,
    CheckoutError,
    CatalogError,
    ConfigError,
    StorageError,
);
