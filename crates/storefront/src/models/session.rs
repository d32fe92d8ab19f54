//! Session-related types.
//!
//! State published by the auth store to its observers.

use serde::Serialize;

use styleaura_core::{Identity, IdentityId};

/// Snapshot of the authentication state.
///
/// Observers (the cart store, route guards) receive this through a
/// `tokio::sync::watch` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// The signed-in identity, if any.
    pub identity: Option<Identity>,
    /// True while an auth operation is in flight, and before `initialize()`.
    pub is_loading: bool,
}

impl AuthState {
    /// State of a store that has not been initialized yet.
    #[must_use]
    pub const fn initializing() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }

    /// Id of the signed-in identity.
    #[must_use]
    pub fn identity_id(&self) -> Option<&IdentityId> {
        self.identity.as_ref().map(|identity| &identity.id)
    }

    /// Whether someone is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Storefront views that flows redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Route {
    /// Landing page.
    Home,
    /// Sign-in page, returning to `redirect` afterwards.
    Login { redirect: String },
    /// Cart page.
    Cart,
    /// Checkout page.
    Checkout,
    /// Admin dashboard.
    Admin,
}

impl Route {
    /// Path of the view.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login { redirect } => format!("/login?redirect={redirect}"),
            Self::Cart => "/cart".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::Admin => "/admin".to_string(),
        }
    }

    /// Login page that returns to `path`.
    #[must_use]
    pub fn login_returning_to(path: &str) -> Self {
        Self::Login {
            redirect: path.to_string(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
