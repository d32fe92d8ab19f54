//! Everything a command needs, opened once per invocation.

use tracing::debug;

use styleaura_admin::middleware::RequireAdmin;
use styleaura_admin::services::{AnnouncementBoard, OrderBook, ProductShelf};
use styleaura_core::Identity;
use styleaura_core::storage::StorageKeys;
use styleaura_storefront::config::StorefrontConfig;
use styleaura_storefront::db::open_store;
use styleaura_storefront::services::catalog::Catalog;
use styleaura_storefront::state::AppState;

use crate::error::CliError;

/// Storefront and admin services over the configured data file.
pub struct Shell {
    pub state: AppState,
    pub orders: OrderBook,
    pub announcements: AnnouncementBoard,
    pub products: ProductShelf,
}

impl Shell {
    /// Read configuration, open the data file and catalog, and restore the
    /// signed-in identity.
    ///
    /// The storefront sells the administrators' product list; the catalog
    /// file only seeds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or the data file
    /// or catalog cannot be read.
    pub async fn open() -> Result<Self, CliError> {
        let config = StorefrontConfig::from_env()?;
        let store = open_store(&config.data_file)?;
        let seed = Catalog::load(&config.catalog_file).await?;
        debug!(data_file = %config.data_file.display(), "Opened data file");

        let products = ProductShelf::new(
            store.clone(),
            &StorageKeys::default(),
            seed.products().to_vec(),
        );
        let catalog = Catalog::new(products.products()?)?;

        let state = AppState::new(config, store.clone(), catalog);
        state.auth().initialize()?;

        let orders = OrderBook::new(store.clone(), state.keys());
        let announcements = AnnouncementBoard::new(store, state.keys());

        Ok(Self {
            state,
            orders,
            announcements,
            products,
        })
    }

    /// The signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Usage` when signed out.
    pub fn identity(&self) -> Result<Identity, CliError> {
        self.state
            .auth()
            .current_identity()
            .ok_or_else(|| CliError::Usage("Not signed in. Run `sa-cli login` first.".to_string()))
    }

    /// Proof that an administrator is signed in.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` otherwise.
    pub fn admin(&self) -> Result<RequireAdmin, CliError> {
        Ok(RequireAdmin::from_state(&self.state.auth().state())?)
    }
}
