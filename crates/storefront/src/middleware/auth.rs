//! Route guards.
//!
//! Protected views consult the current [`AuthState`] before rendering.
//! While the auth store is loading nothing is decided; afterwards a
//! signed-out visitor is sent to the login page with a redirect back.

use tokio::sync::watch;

use styleaura_core::Identity;

use crate::models::{AuthState, Route};

/// Who may open a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// The auth store is still loading; render nothing yet.
    Wait,
    Redirect(Route),
}

/// Decide whether the view at `path` may be shown.
///
/// Admin views always return to `/admin` after login.
#[must_use]
pub fn guard(state: &AuthState, access: Access, path: &str) -> GuardDecision {
    if state.is_loading {
        return GuardDecision::Wait;
    }
    match (access, &state.identity) {
        (Access::Public, _) => GuardDecision::Allow,
        (Access::Authenticated, Some(_)) => GuardDecision::Allow,
        (Access::Authenticated, None) => {
            GuardDecision::Redirect(Route::login_returning_to(path))
        }
        (Access::Admin, Some(identity)) if identity.is_admin() => GuardDecision::Allow,
        (Access::Admin, _) => GuardDecision::Redirect(Route::login_returning_to("/admin")),
    }
}

/// Guard that requires a signed-in identity.
///
/// # Example
///
/// ```rust,ignore
/// let RequireAuth(identity) = RequireAuth::check(&auth.state(), "/account")?;
/// println!("Hello, {}!", identity.name);
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

/// Why a guard refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// Still loading; try again once settled.
    Loading,
    /// Send the visitor here instead.
    Redirect(Route),
}

impl RequireAuth {
    /// Check `state` for the view at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AuthRejection::Loading` while loading, or a redirect to login
    /// when signed out.
    pub fn check(state: &AuthState, path: &str) -> Result<Self, AuthRejection> {
        Self::check_access(state, Access::Authenticated, path)
    }

    /// Check `state` for an admin view.
    ///
    /// # Errors
    ///
    /// Returns `AuthRejection::Loading` while loading, or a redirect to login
    /// when signed out or not an administrator.
    pub fn check_admin(state: &AuthState) -> Result<Self, AuthRejection> {
        Self::check_access(state, Access::Admin, "/admin")
    }

    fn check_access(state: &AuthState, access: Access, path: &str) -> Result<Self, AuthRejection> {
        match guard(state, access, path) {
            GuardDecision::Wait => Err(AuthRejection::Loading),
            GuardDecision::Redirect(route) => Err(AuthRejection::Redirect(route)),
            GuardDecision::Allow => state
                .identity
                .clone()
                .map(Self)
                .ok_or_else(|| AuthRejection::Redirect(Route::login_returning_to(path))),
        }
    }
}

/// Wait until the auth store has finished loading and return that state.
///
/// Returns `None` if the auth store was dropped.
pub async fn settled(rx: &mut watch::Receiver<AuthState>) -> Option<AuthState> {
    rx.wait_for(|state| !state.is_loading)
        .await
        .ok()
        .map(|state| state.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::{Email, IdentityId, Role};

    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: IdentityId::new("user-1"),
            name: "priya".to_string(),
            email: Email::parse("priya@example.com").unwrap(),
            role,
            phone: None,
            address: None,
        }
    }

    fn signed_in(role: Role) -> AuthState {
        AuthState {
            identity: Some(identity(role)),
            is_loading: false,
        }
    }

    fn signed_out() -> AuthState {
        AuthState {
            identity: None,
            is_loading: false,
        }
    }

    #[test]
    fn test_loading_waits() {
        let state = AuthState::initializing();
        for access in [Access::Public, Access::Authenticated, Access::Admin] {
            assert_eq!(guard(&state, access, "/cart"), GuardDecision::Wait);
        }
    }

    #[test]
    fn test_authenticated_routes() {
        assert_eq!(
            guard(&signed_out(), Access::Authenticated, "/checkout"),
            GuardDecision::Redirect(Route::Login {
                redirect: "/checkout".to_string()
            })
        );
        assert_eq!(
            guard(&signed_in(Role::User), Access::Authenticated, "/checkout"),
            GuardDecision::Allow
        );
        assert_eq!(guard(&signed_out(), Access::Public, "/"), GuardDecision::Allow);
    }

    #[test]
    fn test_admin_routes_need_admin_role() {
        let expected = GuardDecision::Redirect(Route::login_returning_to("/admin"));
        assert_eq!(guard(&signed_out(), Access::Admin, "/admin/orders"), expected);
        assert_eq!(guard(&signed_in(Role::User), Access::Admin, "/admin"), expected);
        assert_eq!(guard(&signed_in(Role::Admin), Access::Admin, "/admin"), GuardDecision::Allow);
    }

    #[test]
    fn test_require_auth() {
        let RequireAuth(identity) = RequireAuth::check(&signed_in(Role::User), "/account").unwrap();
        assert_eq!(identity.name, "priya");

        assert_eq!(
            RequireAuth::check(&AuthState::initializing(), "/account").unwrap_err(),
            AuthRejection::Loading
        );
        assert!(RequireAuth::check_admin(&signed_in(Role::User)).is_err());
        assert!(RequireAuth::check_admin(&signed_in(Role::Admin)).is_ok());
    }

    #[tokio::test]
    async fn test_settled_waits_for_loading_to_finish() {
        let (tx, mut rx) = watch::channel(AuthState::initializing());
        let waiter = tokio::spawn(async move { settled(&mut rx).await });

        tx.send_replace(signed_in(Role::User));
        let state = waiter.await.unwrap().unwrap();
        assert!(state.is_authenticated());
    }
}
