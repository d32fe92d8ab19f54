//! Authentication service.
//!
//! [`AuthStore`] owns "who is signed in". Its state is published through a
//! `tokio::sync::watch` channel; the cart and the route guards subscribe to
//! it. Credential checks are a stub: any well-formed login succeeds, and the
//! fixed administrator pair maps to the administrator identity.

mod error;

pub use error::AuthError;

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::instrument;

use styleaura_core::storage::{KeyValueStore, StorageKeys, read_json, write_json};
use styleaura_core::{Email, Identity, IdentityId, ProfileUpdate, Role};

use crate::models::AuthState;
use crate::services::validation::ValidationErrors;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Administrator sign-in pair.
const ADMIN_EMAIL: &str = "admin@styleaura.com";
const ADMIN_PASSWORD: &str = "admin123";

/// How regular-user ids are assigned at login and registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserIdStrategy {
    /// `user-` followed by the first 8 hex digits of the SHA-256 of the
    /// lower-cased email. Signing in again restores the same cart. After a
    /// profile email change the new email resolves to the original id.
    #[default]
    DerivedFromEmail,
    /// `user-<0..1000>`, fresh on every sign-in.
    Random,
}

impl UserIdStrategy {
    /// Assign an id for `email`.
    #[must_use]
    pub fn assign(self, email: &Email) -> IdentityId {
        match self {
            Self::DerivedFromEmail => {
                let digest = Sha256::digest(email.normalized().as_bytes());
                let short: String = hex::encode(digest).chars().take(8).collect();
                IdentityId::new(format!("user-{short}"))
            }
            Self::Random => {
                let n: u32 = rand::rng().random_range(0..1000);
                IdentityId::new(format!("user-{n}"))
            }
        }
    }
}

impl FromStr for UserIdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::DerivedFromEmail),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown user id strategy: {other}")),
        }
    }
}

/// Tunables of an [`AuthStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthSettings {
    /// Simulated network latency of every asynchronous operation.
    pub latency: Duration,
    pub user_ids: UserIdStrategy,
}

/// New-account form.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// The authentication store.
///
/// All methods take `&self`; share it behind an `Arc`.
pub struct AuthStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    settings: AuthSettings,
    state: watch::Sender<AuthState>,
    /// Bumped by login, registration and logout.
    epoch: AtomicU64,
    in_flight: AtomicUsize,
    initialized: AtomicBool,
}

impl AuthStore {
    /// Create a store. It reports `is_loading` until [`Self::initialize`]
    /// has run.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys, settings: AuthSettings) -> Self {
        let (state, _) = watch::channel(AuthState::initializing());
        Self {
            store,
            keys,
            settings,
            state,
            epoch: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Observe every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore the persisted identity.
    ///
    /// A record that does not decode is removed and the store starts signed
    /// out. `is_loading` is false afterwards on every path.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backing store cannot be read.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<Option<Identity>, AuthError> {
        let restored = match read_json::<Identity>(self.store.as_ref(), &self.keys.identity) {
            Ok(identity) => Ok(identity),
            Err(e) if e.is_corrupt_record() => {
                tracing::warn!(error = %e, "discarding corrupt identity record");
                self.store.remove(&self.keys.identity).map(|()| None)
            }
            Err(e) => Err(e),
        };

        let in_flight = &self.in_flight;
        self.initialized.store(true, Ordering::SeqCst);
        self.state.send_modify(|state| {
            if let Ok(identity) = &restored {
                state.identity.clone_from(identity);
            }
            state.is_loading = in_flight.load(Ordering::SeqCst) > 0;
        });

        let identity = restored?;
        if let Some(identity) = &identity {
            tracing::info!(identity = %identity.id, role = %identity.role, "restored session");
        }
        Ok(identity)
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed email or a password
    /// shorter than 6 characters, `AuthError::Superseded` if the session
    /// changed while waiting, or `AuthError::Storage` if the identity cannot
    /// be persisted.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let mut errors = ValidationErrors::new();
        let parsed = errors.email("email", email);
        errors.ensure(
            password.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        let email = parsed.filter(|_| errors.is_empty()).ok_or(errors)?;

        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = self.begin_loading();
        self.simulate_latency().await;

        let identity = if email.as_str() == ADMIN_EMAIL && password.expose_secret() == ADMIN_PASSWORD {
            admin_identity(email)
        } else {
            Identity {
                id: self.assign_id(&email)?,
                name: email.local_part().to_owned(),
                email,
                role: Role::User,
                phone: None,
                address: None,
            }
        };

        let identity = self.activate(ticket, identity)?;
        tracing::info!(identity = %identity.id, role = %identity.role, "signed in");
        Ok(identity)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid,
    /// `AuthError::Superseded` if the session changed while waiting, or
    /// `AuthError::Storage` if the identity cannot be persisted.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: Registration) -> Result<Identity, AuthError> {
        let mut errors = ValidationErrors::new();
        errors.min_chars("name", &form.name, 2, "Name must be at least 2 characters");
        let parsed = errors.email("email", &form.email);
        errors.ensure(
            form.password.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH,
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        if let Some(phone) = &form.phone {
            errors.min_chars("phone", phone, 10, "Please enter a valid phone number");
        }
        let email = parsed.filter(|_| errors.is_empty()).ok_or(errors)?;

        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = self.begin_loading();
        self.simulate_latency().await;

        let identity = Identity {
            id: self.assign_id(&email)?,
            name: form.name.trim().to_owned(),
            email,
            role: Role::User,
            phone: form.phone,
            address: form.address,
        };

        let identity = self.activate(ticket, identity)?;
        tracing::info!(identity = %identity.id, "registered");
        Ok(identity)
    }

    /// Sign out. Any in-flight login or registration is dropped.
    ///
    /// The in-memory state is cleared even if removing the persisted record
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the persisted record cannot be removed.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), AuthError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut previous = None;
        self.state.send_modify(|state| previous = state.identity.take());
        if let Some(identity) = previous {
            tracing::info!(identity = %identity.id, "signed out");
        }
        self.store.remove(&self.keys.identity)?;
        Ok(())
    }

    // =========================================================================
    // Account management
    // =========================================================================

    /// Merge `update` into the signed-in identity. The role and id never
    /// change.
    ///
    /// With [`UserIdStrategy::DerivedFromEmail`], a new email also records an
    /// alias so that signing in with it later restores this id and its cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoActiveIdentity` when signed out,
    /// `AuthError::Validation` for a short name or phone,
    /// `AuthError::Superseded` if a different identity became active while
    /// waiting, or `AuthError::Storage` if the identity cannot be persisted.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Identity, AuthError> {
        let current = self.current_identity().ok_or(AuthError::NoActiveIdentity)?;

        let mut errors = ValidationErrors::new();
        if let Some(name) = &update.name {
            errors.min_chars("name", name, 2, "Name must be at least 2 characters");
        }
        if let Some(phone) = &update.phone {
            errors.min_chars("phone", phone, 10, "Please enter a valid phone number");
        }
        errors.into_result()?;

        let alias = update
            .email
            .as_ref()
            .filter(|_| self.settings.user_ids == UserIdStrategy::DerivedFromEmail && !current.is_admin())
            .map(|email| self.keys.alias_key(&UserIdStrategy::DerivedFromEmail.assign(email)));

        let ticket = self.epoch.load(Ordering::SeqCst);
        let _loading = self.begin_loading();
        self.simulate_latency().await;

        let mut outcome = Err(AuthError::Superseded);
        let epoch = &self.epoch;
        let (store, key) = (self.store.as_ref(), &self.keys.identity);
        self.state.send_if_modified(|state| {
            if epoch.load(Ordering::SeqCst) != ticket {
                return false;
            }
            let Some(active) = state.identity.as_ref().filter(|i| i.id == current.id) else {
                return false;
            };
            let updated = active.clone().merged(update);
            let written = match alias.as_ref().filter(|_| updated.email != active.email) {
                Some(alias) => write_json(store, alias, &updated.id),
                None => Ok(()),
            };
            if let Err(e) = written.and_then(|()| write_json(store, key, &updated)) {
                outcome = Err(e.into());
                return false;
            }
            state.identity = Some(updated.clone());
            outcome = Ok(updated);
            true
        });

        let updated = outcome?;
        tracing::info!(identity = %updated.id, "profile updated");
        Ok(updated)
    }

    /// Change the password of the signed-in identity.
    ///
    /// Always succeeds once validated; there is no credential backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoActiveIdentity` when signed out,
    /// `AuthError::Validation` for an empty current password or a new one
    /// shorter than 6 characters, or `AuthError::Superseded` if the session
    /// changed while waiting.
    #[instrument(skip(self, current, new))]
    pub async fn update_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<bool, AuthError> {
        if self.current_identity().is_none() {
            return Err(AuthError::NoActiveIdentity);
        }

        let mut errors = ValidationErrors::new();
        errors.ensure(
            !current.expose_secret().is_empty(),
            "currentPassword",
            "Current password is required",
        );
        errors.ensure(
            new.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH,
            "newPassword",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        errors.into_result()?;

        let ticket = self.epoch.load(Ordering::SeqCst);
        let _loading = self.begin_loading();
        self.simulate_latency().await;

        if self.epoch.load(Ordering::SeqCst) != ticket {
            return Err(AuthError::Superseded);
        }
        Ok(true)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The id for a regular user signing in with `email`, following an
    /// alias left by an earlier email change.
    fn assign_id(&self, email: &Email) -> Result<IdentityId, AuthError> {
        let derived = self.settings.user_ids.assign(email);
        if self.settings.user_ids != UserIdStrategy::DerivedFromEmail {
            return Ok(derived);
        }
        let key = self.keys.alias_key(&derived);
        match read_json::<IdentityId>(self.store.as_ref(), &key) {
            Ok(alias) => Ok(alias.unwrap_or(derived)),
            Err(e) if e.is_corrupt_record() => {
                tracing::warn!(error = %e, "ignoring corrupt id alias");
                Ok(derived)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn simulate_latency(&self) {
        if !self.settings.latency.is_zero() {
            tokio::time::sleep(self.settings.latency).await;
        }
    }

    /// Persist and publish `identity` unless the epoch moved past `ticket`.
    ///
    /// The epoch check and the state change happen under the channel lock,
    /// so a concurrent logout either sees the new identity and clears it or
    /// makes this call fail.
    fn activate(&self, ticket: u64, identity: Identity) -> Result<Identity, AuthError> {
        let mut outcome = Err(AuthError::Superseded);
        let epoch = &self.epoch;
        let (store, key) = (self.store.as_ref(), &self.keys.identity);
        self.state.send_if_modified(|state| {
            if epoch.load(Ordering::SeqCst) != ticket {
                return false;
            }
            if let Err(e) = write_json(store, key, &identity) {
                outcome = Err(e.into());
                return false;
            }
            state.identity = Some(identity.clone());
            outcome = Ok(identity);
            true
        });
        if matches!(outcome, Err(AuthError::Superseded)) {
            tracing::debug!("dropping stale session completion");
        }
        outcome
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        let in_flight = &self.in_flight;
        self.state.send_modify(|state| {
            in_flight.fetch_add(1, Ordering::SeqCst);
            state.is_loading = true;
        });
        LoadingGuard { auth: self }
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("keys", &self.keys)
            .field("settings", &self.settings)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Clears `is_loading` when the last in-flight operation finishes, on every
/// exit path.
struct LoadingGuard<'a> {
    auth: &'a AuthStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let AuthStore {
            in_flight,
            initialized,
            ..
        } = self.auth;
        self.auth.state.send_if_modified(|state| {
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            let loading = remaining > 0 || !initialized.load(Ordering::SeqCst);
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        });
    }
}

fn admin_identity(email: Email) -> Identity {
    Identity {
        id: IdentityId::new("admin-1"),
        name: "Admin User".to_owned(),
        email,
        role: Role::Admin,
        phone: Some("9876543210".to_owned()),
        address: Some("StyleAura Office, Mumbai".to_owned()),
    }
}
