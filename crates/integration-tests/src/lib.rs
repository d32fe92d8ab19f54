//! Integration tests for StyleAura.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p styleaura-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_session` - Sign-in, cart ownership and persistence across
//!   restarts
//! - `checkout_flow` - Checkout through to the admin order book
//! - `admin_board` - Admin access control, product management and the
//!   announcement board
//!
//! Every scenario runs against a [`FileStore`] in a temporary directory, so
//! a [`TestContext::reopen`] behaves like restarting the application.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tempfile::TempDir;

use styleaura_admin::services::{AnnouncementBoard, OrderBook, ProductShelf};
use styleaura_core::Identity;
use styleaura_core::storage::{KeyValueStore, StorageKeys};
use styleaura_storefront::config::{LatencyProfile, StorefrontConfig};
use styleaura_storefront::db::open_store;
use styleaura_storefront::services::auth::UserIdStrategy;
use styleaura_storefront::services::catalog::Catalog;
use styleaura_storefront::state::AppState;

/// Boxed error for fixture setup.
pub type TestResult<T> = Result<T, Box<dyn Error>>;

/// A small catalog: one sized lehenga, two cheap accessories summing to 998.
pub const CATALOG_YAML: &str = r"
products:
  - id: lehenga1
    name: Bridal Red Embroidered Lehenga
    price: 15999
    salePrice: 12999
    discount: 18
    category: lehengas
    imageUrl: /images/lehenga1.jpg
    size: [S, M, L]
    available: true
  - id: dupatta1
    name: Chiffon Gota Dupatta
    price: 899
    category: accessories
    imageUrl: /images/dupatta1.jpg
    available: true
  - id: potli1
    name: Embellished Potli Bag
    price: 99
    category: accessories
    imageUrl: /images/potli1.jpg
    available: true
";

/// Storefront and admin services over a file-backed store in a temp dir.
pub struct TestContext {
    dir: TempDir,
    pub store: Arc<dyn KeyValueStore>,
    pub state: AppState,
    pub orders: OrderBook,
    pub announcements: AnnouncementBoard,
    pub products: ProductShelf,
}

impl TestContext {
    /// Fresh, empty state with no simulated latency.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp dir or data file cannot be created.
    pub fn new() -> TestResult<Self> {
        Self::open(tempfile::tempdir()?)
    }

    /// Drop every in-memory service and reopen the same data file, as a
    /// restarted application would.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be read.
    pub fn reopen(self) -> TestResult<Self> {
        Self::open(self.dir)
    }

    fn open(dir: TempDir) -> TestResult<Self> {
        let config = StorefrontConfig {
            data_file: dir.path().join("state.json"),
            catalog_file: PathBuf::from("catalog.yaml"),
            latency: LatencyProfile::instant(),
            payment_timeout: Duration::from_secs(10),
            user_ids: UserIdStrategy::DerivedFromEmail,
        };
        let store = open_store(&config.data_file)?;
        let seed = Catalog::from_yaml_str(CATALOG_YAML)?;
        let products = ProductShelf::new(
            store.clone(),
            &StorageKeys::default(),
            seed.products().to_vec(),
        );
        let catalog = Catalog::new(products.products()?)?;

        let state = AppState::new(config, store.clone(), catalog);
        state.auth().initialize()?;
        let orders = OrderBook::new(store.clone(), state.keys());
        let announcements = AnnouncementBoard::new(store.clone(), state.keys());

        Ok(Self {
            dir,
            store,
            state,
            orders,
            announcements,
            products,
        })
    }

    /// Path of the backing data file.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    /// Sign in with any password.
    ///
    /// # Errors
    ///
    /// Returns the auth error for a malformed email.
    pub async fn login(&self, email: &str) -> TestResult<Identity> {
        Ok(self
            .state
            .auth()
            .login(email, &SecretString::from("secret1"))
            .await?)
    }

    /// Sign in as the built-in administrator.
    ///
    /// # Errors
    ///
    /// Returns the auth error if the identity cannot be persisted.
    pub async fn login_admin(&self) -> TestResult<Identity> {
        Ok(self
            .state
            .auth()
            .login("admin@styleaura.com", &SecretString::from("admin123"))
            .await?)
    }

    /// Add `quantity` of a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown product or a cart failure.
    pub fn add(&self, id: &str, quantity: u32, size: Option<&str>) -> TestResult<()> {
        let product = self
            .state
            .catalog()
            .get(&id.into())
            .ok_or_else(|| format!("no product {id}"))?;
        self.state.cart().add_to_cart(product, quantity, size)?;
        Ok(())
    }
}
