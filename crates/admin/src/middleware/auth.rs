//! Administrator guard.
//!
//! Admin services take a [`RequireAdmin`] as proof that the caller is a
//! signed-in administrator, so a forgotten check fails to compile rather
//! than leaking orders. The only way to obtain one is through
//! [`RequireAdmin::check`] or [`RequireAdmin::from_state`].

use styleaura_core::Identity;
use styleaura_storefront::models::AuthState;

use crate::error::AdminError;

/// Proof that an administrator is signed in.
///
/// # Example
///
/// ```rust,ignore
/// let admin = RequireAdmin::from_state(&auth.state())?;
/// let orders = order_book.list(&admin, &OrderQuery::default())?;
/// ```
///
/// The proof cannot be assembled from an arbitrary identity:
///
/// ```rust,compile_fail
/// use styleaura_admin::middleware::RequireAdmin;
///
/// fn forge(identity: styleaura_core::Identity) -> RequireAdmin {
///     RequireAdmin(identity)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(Identity);

impl RequireAdmin {
    /// Check a possibly absent identity.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` when nobody is signed in or the
    /// identity is a customer.
    pub fn check(identity: Option<&Identity>) -> Result<Self, AdminError> {
        match identity {
            Some(identity) if identity.is_admin() => Ok(Self(identity.clone())),
            Some(identity) => {
                tracing::warn!(identity_id = %identity.id, "Non-admin attempted admin operation");
                Err(AdminError::Forbidden(format!(
                    "{} is not an administrator",
                    identity.email
                )))
            }
            None => Err(AdminError::Forbidden("not signed in".to_string())),
        }
    }

    /// Check the auth store's current state.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` unless an administrator is signed in.
    pub fn from_state(state: &AuthState) -> Result<Self, AdminError> {
        Self::check(state.identity.as_ref())
    }

    /// The administrator's identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.0
    }
}
