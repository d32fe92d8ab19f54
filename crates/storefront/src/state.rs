//! Application state shared across front-ends.

use std::sync::Arc;

use styleaura_core::storage::{KeyValueStore, StorageKeys};

use crate::config::StorefrontConfig;
use crate::services::auth::AuthStore;
use crate::services::cart::CartStore;
use crate::services::catalog::Catalog;
use crate::services::checkout::{Checkout, CheckoutEntry, SimulatedGateway};

/// Application state shared across all front-ends.
///
/// This struct is cheaply cloneable via `Arc` and wires the auth store, the
/// cart that follows it, the catalog and the payment gateway over one
/// key/value store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    auth: AuthStore,
    cart: CartStore,
    catalog: Catalog,
    gateway: SimulatedGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The auth store is not initialized yet; call
    /// [`AuthStore::initialize`] before serving protected views.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Backing key/value store
    /// * `catalog` - Products on sale
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn KeyValueStore>, catalog: Catalog) -> Self {
        let keys = StorageKeys::default();
        let auth = AuthStore::new(store.clone(), keys.clone(), config.auth_settings());
        let cart = CartStore::new(store.clone(), keys.clone(), auth.subscribe());
        let gateway = SimulatedGateway::new(config.latency.payment);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                keys,
                auth,
                cart,
                catalog,
                gateway,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the backing key/value store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.inner.keys
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &SimulatedGateway {
        &self.inner.gateway
    }

    /// Open checkout for the signed-in identity with the configured
    /// settings.
    #[must_use]
    pub fn begin_checkout(&self) -> CheckoutEntry {
        Checkout::begin(self.auth(), self.cart(), self.config().checkout_settings())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("auth", &self.inner.auth)
            .field("cart", &self.inner.cart)
            .field("products", &self.inner.catalog.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use styleaura_core::storage::MemoryStore;

    use super::*;
    use crate::config::LatencyProfile;
    use crate::test_support::product;

    #[tokio::test]
    async fn test_cart_follows_auth() {
        let config = StorefrontConfig {
            latency: LatencyProfile::instant(),
            ..StorefrontConfig::default()
        };
        let catalog = Catalog::new(vec![product("p1", 1200, None)]).unwrap();
        let state = AppState::new(config, Arc::new(MemoryStore::new()), catalog);

        state.auth().initialize().unwrap();
        assert!(matches!(state.begin_checkout(), CheckoutEntry::Redirect(_)));

        state
            .auth()
            .login("priya@example.com", &SecretString::from("secret1"))
            .await
            .unwrap();
        let dress = state.catalog().products()[0].clone();
        state.cart().add_to_cart(&dress, 1, Some("M")).unwrap();

        assert!(matches!(state.begin_checkout(), CheckoutEntry::Ready(_)));
        assert_eq!(state.cart().owner(), state.auth().current_identity().map(|i| i.id));
    }
}
