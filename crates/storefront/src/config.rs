//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STYLEAURA_DATA_FILE` - JSON state file (default: `.styleaura/state.json`)
//! - `STYLEAURA_CATALOG_FILE` - YAML product catalog (default: `crates/cli/data/catalog.yaml`)
//! - `STYLEAURA_AUTH_LATENCY_MS` - Simulated auth latency (default: 1000)
//! - `STYLEAURA_PAYMENT_LATENCY_MS` - Simulated payment latency (default: 2000)
//! - `STYLEAURA_PAYMENT_TIMEOUT_MS` - Payment timeout (default: 10000)
//! - `STYLEAURA_USER_ID_STRATEGY` - `email` or `random` (default: `email`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::services::auth::{AuthSettings, UserIdStrategy};
use crate::services::checkout::CheckoutSettings;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Simulated network latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub auth: Duration,
    pub payment: Duration,
}

impl LatencyProfile {
    /// No simulated waiting at all.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            auth: Duration::ZERO,
            payment: Duration::ZERO,
        }
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            auth: Duration::from_millis(1000),
            payment: Duration::from_millis(2000),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// File holding the persisted key/value state
    pub data_file: PathBuf,
    /// YAML product catalog
    pub catalog_file: PathBuf,
    pub latency: LatencyProfile,
    /// Upper bound on a payment gateway call
    pub payment_timeout: Duration,
    pub user_ids: UserIdStrategy,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(".styleaura/state.json"),
            catalog_file: PathBuf::from("crates/cli/data/catalog.yaml"),
            latency: LatencyProfile::default(),
            payment_timeout: Duration::from_millis(10_000),
            user_ids: UserIdStrategy::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to a value
    /// that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for values that do not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let env = Env(lookup);

        Ok(Self {
            data_file: env.path_or("STYLEAURA_DATA_FILE", defaults.data_file),
            catalog_file: env.path_or("STYLEAURA_CATALOG_FILE", defaults.catalog_file),
            latency: LatencyProfile {
                auth: env.millis_or("STYLEAURA_AUTH_LATENCY_MS", defaults.latency.auth)?,
                payment: env.millis_or("STYLEAURA_PAYMENT_LATENCY_MS", defaults.latency.payment)?,
            },
            payment_timeout: env.millis_or("STYLEAURA_PAYMENT_TIMEOUT_MS", defaults.payment_timeout)?,
            user_ids: match env.get("STYLEAURA_USER_ID_STRATEGY") {
                Some(raw) => raw.parse().map_err(|e| {
                    ConfigError::InvalidEnvVar("STYLEAURA_USER_ID_STRATEGY".to_string(), e)
                })?,
                None => defaults.user_ids,
            },
        })
    }

    /// Settings for the auth store.
    #[must_use]
    pub const fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            latency: self.latency.auth,
            user_ids: self.user_ids,
        }
    }

    /// Settings for checkout sessions.
    #[must_use]
    pub const fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            payment_timeout: self.payment_timeout,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank counts as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn path_or(&self, key: &str, default: PathBuf) -> PathBuf {
        self.get(key).map_or(default, PathBuf::from)
    }

    fn millis_or(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
