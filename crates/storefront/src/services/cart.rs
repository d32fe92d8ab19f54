//! Shopping cart service.
//!
//! A [`CartStore`] holds the lines of whichever identity is signed in. It
//! watches the auth state and, before every operation, reconciles: when the
//! signed-in id differs from the owner of the in-memory lines, the lines are
//! dropped and the new identity's persisted cart is loaded. Profile updates
//! that keep the id leave the cart alone.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::de::Error as _;
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use styleaura_core::pricing::{self, MAX_LINE_QUANTITY, OrderSummary};
use styleaura_core::storage::{KeyValueStore, StorageError, StorageKeys, read_json, write_json};
use styleaura_core::{CartLine, IdentityId, LineKey, Product, ProductId};

use crate::models::AuthState;

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Nobody is signed in; the cart was not changed.
    #[error("sign in to use the cart")]
    RequiresAuthentication,

    /// A line quantity outside `1..=MAX_LINE_QUANTITY`.
    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,

    /// The selected size is not offered by the product.
    #[error("{product} is not available in size {size}")]
    UnknownSize { product: ProductId, size: String },

    /// No line has this key.
    #[error("no cart line for {0}")]
    LineNotFound(LineKey),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

struct CartInner {
    auth: watch::Receiver<AuthState>,
    owner: Option<IdentityId>,
    lines: Vec<CartLine>,
}

/// The cart of the signed-in identity.
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    inner: Mutex<CartInner>,
}

impl CartStore {
    /// Create a cart that follows the identity published on `auth`.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: StorageKeys,
        auth: watch::Receiver<AuthState>,
    ) -> Self {
        Self {
            store,
            keys,
            inner: Mutex::new(CartInner {
                auth,
                owner: None,
                lines: Vec::new(),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.synced().lines.clone()
    }

    /// The identity the lines belong to.
    #[must_use]
    pub fn owner(&self) -> Option<IdentityId> {
        self.synced().owner.clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synced().lines.is_empty()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        pricing::total_items(&self.synced().lines)
    }

    /// Sum of line totals at effective prices.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        pricing::total_price(&self.synced().lines)
    }

    /// Item count, subtotal, shipping and total.
    #[must_use]
    pub fn totals(&self) -> OrderSummary {
        OrderSummary::from_lines(&self.synced().lines)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`, merging into the line with the same
    /// product and size.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for 0 or when the merged line
    /// would exceed `MAX_LINE_QUANTITY`,
    /// `CartError::UnknownSize` for a size the product does not offer,
    /// `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub fn add_to_cart(
        &self,
        product: &Product,
        quantity: u32,
        selected_size: Option<&str>,
    ) -> Result<(), CartError> {
        if !pricing::is_valid_line_quantity(quantity) {
            return Err(CartError::InvalidQuantity);
        }
        if let Some(size) = selected_size.filter(|size| !product.offers_size(size)) {
            return Err(CartError::UnknownSize {
                product: product.id.clone(),
                size: size.to_owned(),
            });
        }

        self.mutate(|lines| {
            match lines
                .iter_mut()
                .find(|line| line.matches(&product.id, selected_size))
            {
                Some(line) => {
                    let merged = line.quantity.saturating_add(quantity);
                    if !pricing::is_valid_line_quantity(merged) {
                        return Err(CartError::InvalidQuantity);
                    }
                    line.quantity = merged;
                }
                None => lines.push(CartLine {
                    product: product.clone(),
                    quantity,
                    selected_size: selected_size.map(str::to_owned),
                }),
            }
            Ok(())
        })
    }

    /// Remove every line of `product_id`, whatever the size. Returns the
    /// number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self), fields(product = %product_id))]
    pub fn remove_from_cart(&self, product_id: &ProductId) -> Result<usize, CartError> {
        self.mutate(|lines| {
            let before = lines.len();
            lines.retain(|line| line.product.id != *product_id);
            Ok(before - lines.len())
        })
    }

    /// Set the quantity of every line of `product_id`. Zero removes them.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` above `MAX_LINE_QUANTITY`,
    /// `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self), fields(product = %product_id))]
    pub fn update_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_from_cart(product_id).map(|_| ());
        }
        if !pricing::is_valid_line_quantity(quantity) {
            return Err(CartError::InvalidQuantity);
        }
        self.mutate(|lines| {
            lines
                .iter_mut()
                .filter(|line| line.product.id == *product_id)
                .for_each(|line| line.quantity = quantity);
            Ok(())
        })
    }

    /// Remove exactly the line with `key`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self), fields(line = %key))]
    pub fn remove_line(&self, key: &LineKey) -> Result<bool, CartError> {
        self.mutate(|lines| {
            let before = lines.len();
            lines.retain(|line| !line.matches(&key.product_id, key.size.as_deref()));
            Ok(lines.len() < before)
        })
    }

    /// Set the quantity of exactly the line with `key`. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` for an unknown key,
    /// `CartError::InvalidQuantity` above `MAX_LINE_QUANTITY`,
    /// `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self), fields(line = %key))]
    pub fn set_line_quantity(&self, key: &LineKey, quantity: u32) -> Result<(), CartError> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        self.mutate(|lines| {
            let position = lines
                .iter()
                .position(|line| line.matches(&key.product_id, key.size.as_deref()))
                .ok_or_else(|| CartError::LineNotFound(key.clone()))?;
            if quantity == 0 {
                lines.remove(position);
            } else if let Some(line) = lines.get_mut(position) {
                line.quantity = quantity;
            }
            Ok(())
        })
    }

    /// Empty the cart and persist the empty cart. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RequiresAuthentication` when signed out, or
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) -> Result<(), CartError> {
        self.mutate(|lines| {
            lines.clear();
            Ok(())
        })
    }

    /// Empty the cart only if it belongs to `owner`. Returns whether it did.
    ///
    /// The ownership check and the clear happen under one lock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be persisted.
    pub fn clear_if_owned_by(&self, owner: &IdentityId) -> Result<bool, CartError> {
        let mut inner = self.synced();
        if inner.owner.as_ref() != Some(owner) {
            return Ok(false);
        }
        write_json(self.store.as_ref(), &self.keys.cart_key(owner), &Vec::<CartLine>::new())?;
        inner.lines.clear();
        Ok(true)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Lock the cart, reconciled with the current identity.
    fn synced(&self) -> MutexGuard<'_, CartInner> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = inner.auth.borrow_and_update().identity_id().cloned();
        if current != inner.owner {
            inner.lines = match &current {
                Some(id) => self.restore(id),
                None => Vec::new(),
            };
            tracing::debug!(
                from = ?inner.owner,
                to = ?current,
                lines = inner.lines.len(),
                "cart switched identity"
            );
            inner.owner = current;
        }
        inner
    }

    /// Load the persisted cart of `id`, recovering from bad records.
    fn restore(&self, id: &IdentityId) -> Vec<CartLine> {
        let key = self.keys.cart_key(id);
        let loaded = read_json::<Vec<CartLine>>(self.store.as_ref(), &key)
            .and_then(|lines| check_lines(&key, lines));
        match loaded {
            Ok(lines) => lines.unwrap_or_default(),
            Err(e) if e.is_corrupt_record() => {
                tracing::warn!(error = %e, "discarding corrupt cart record");
                if let Err(e) = self.store.remove(&key) {
                    tracing::error!(error = %e, key = %key, "failed to remove corrupt cart record");
                }
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "failed to load cart; starting empty");
                Vec::new()
            }
        }
    }

    /// Apply `change` to a copy of the lines, persist it, then commit.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<CartLine>) -> Result<T, CartError>,
    ) -> Result<T, CartError> {
        let mut inner = self.synced();
        let owner = inner.owner.clone().ok_or(CartError::RequiresAuthentication)?;

        let mut lines = inner.lines.clone();
        let value = change(&mut lines)?;
        write_json(self.store.as_ref(), &self.keys.cart_key(&owner), &lines)?;
        inner.lines = lines;
        Ok(value)
    }
}

/// Reject a decoded cart whose lines break the in-cart invariants: every
/// quantity in range and at most one line per key.
fn check_lines(
    key: &str,
    lines: Option<Vec<CartLine>>,
) -> Result<Option<Vec<CartLine>>, StorageError> {
    let Some(lines) = lines else {
        return Ok(None);
    };
    let mut seen = HashSet::with_capacity(lines.len());
    for line in &lines {
        let problem = if !pricing::is_valid_line_quantity(line.quantity) {
            format!("line {} has quantity {}", line.key(), line.quantity)
        } else if !seen.insert(line.key()) {
            format!("line {} appears more than once", line.key())
        } else {
            continue;
        };
        return Err(StorageError::CorruptRecord {
            key: key.to_owned(),
            source: serde_json::Error::custom(problem),
        });
    }
    Ok(Some(lines))
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CartStore")
            .field("owner", &inner.owner)
            .field("lines", &inner.lines.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use styleaura_core::storage::MemoryStore;
    use styleaura_core::{Email, ProfileUpdate};

    use super::*;
    use crate::services::auth::{AuthSettings, AuthStore, UserIdStrategy};
    use crate::test_support::product;

    struct Harness {
        store: Arc<MemoryStore>,
        auth: AuthStore,
        cart: CartStore,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthStore::new(store.clone(), StorageKeys::default(), AuthSettings {
            latency: Duration::ZERO,
            ..AuthSettings::default()
        });
        auth.initialize().unwrap();
        let cart = CartStore::new(store.clone(), StorageKeys::default(), auth.subscribe());
        Harness { store, auth, cart }
    }

    async fn sign_in(auth: &AuthStore, email: &str) -> IdentityId {
        auth.login(email, &SecretString::from("secret1")).await.unwrap().id
    }

    #[tokio::test]
    async fn test_same_key_merges_quantities() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 2499, Some(1999));

        h.cart.add_to_cart(&dress, 2, Some("M")).unwrap();
        h.cart.add_to_cart(&dress, 1, Some("M")).unwrap();
        assert_eq!(h.cart.lines().len(), 1);
        assert_eq!(h.cart.lines()[0].quantity, 3);

        h.cart.add_to_cart(&dress, 1, Some("L")).unwrap();
        assert_eq!(h.cart.lines().len(), 2);
        assert_eq!(h.cart.total_items(), 4);
        assert_eq!(h.cart.total_price(), Decimal::new(1999 * 4, 0));
    }

    #[tokio::test]
    async fn test_sized_and_unsized_lines_are_distinct() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);

        h.cart.add_to_cart(&dress, 1, None).unwrap();
        h.cart.add_to_cart(&dress, 1, Some("S")).unwrap();
        assert_eq!(h.cart.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_zero_quantity_and_unknown_size() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);

        assert!(matches!(
            h.cart.add_to_cart(&dress, 0, None),
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            h.cart.add_to_cart(&dress, 1, Some("XXL")),
            Err(CartError::UnknownSize { .. })
        ));
        assert!(h.cart.is_empty());
    }

    #[tokio::test]
    async fn test_quantities_are_capped_per_line() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);

        assert!(matches!(
            h.cart.add_to_cart(&dress, u32::MAX, Some("S")),
            Err(CartError::InvalidQuantity)
        ));
        h.cart.add_to_cart(&dress, MAX_LINE_QUANTITY, Some("S")).unwrap();
        assert!(matches!(
            h.cart.add_to_cart(&dress, 1, Some("S")),
            Err(CartError::InvalidQuantity)
        ));
        h.cart.add_to_cart(&dress, 1, Some("M")).unwrap();

        assert!(matches!(
            h.cart.update_quantity(&dress.id, MAX_LINE_QUANTITY + 1),
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            h.cart.set_line_quantity(&LineKey::new("p1", Some("M")), u32::MAX),
            Err(CartError::InvalidQuantity)
        ));
        assert_eq!(h.cart.total_items(), MAX_LINE_QUANTITY + 1);
        assert_eq!(h.cart.totals().item_count, MAX_LINE_QUANTITY + 1);
    }

    #[test]
    fn test_mutations_require_identity() {
        let h = harness();
        let dress = product("p1", 500, None);

        let err = h.cart.add_to_cart(&dress, 1, None).unwrap_err();
        assert!(matches!(err, CartError::RequiresAuthentication));
        assert!(h.cart.is_empty());
        assert!(h.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_remove_then_add_yields_single_line() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);

        h.cart.add_to_cart(&dress, 2, Some("S")).unwrap();
        h.cart.add_to_cart(&dress, 1, Some("M")).unwrap();
        assert_eq!(h.cart.remove_from_cart(&dress.id).unwrap(), 2);

        h.cart.add_to_cart(&dress, 4, Some("L")).unwrap();
        let lines = h.cart.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_update_quantity_applies_to_every_variant() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);
        h.cart.add_to_cart(&dress, 2, Some("S")).unwrap();
        h.cart.add_to_cart(&dress, 1, Some("M")).unwrap();

        h.cart.update_quantity(&dress.id, 5).unwrap();
        assert!(h.cart.lines().iter().all(|line| line.quantity == 5));

        h.cart.update_quantity(&dress.id, 0).unwrap();
        assert!(h.cart.is_empty());
    }

    #[tokio::test]
    async fn test_line_operations_target_one_variant() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        let dress = product("p1", 500, None);
        h.cart.add_to_cart(&dress, 2, Some("S")).unwrap();
        h.cart.add_to_cart(&dress, 1, Some("M")).unwrap();

        h.cart.set_line_quantity(&LineKey::new("p1", Some("S")), 7).unwrap();
        assert_eq!(h.cart.total_items(), 8);

        assert!(h.cart.remove_line(&LineKey::new("p1", Some("M"))).unwrap());
        assert!(!h.cart.remove_line(&LineKey::new("p1", Some("M"))).unwrap());
        assert_eq!(h.cart.lines().len(), 1);

        let err = h
            .cart
            .set_line_quantity(&LineKey::new("p1", Some("XL")), 1)
            .unwrap_err();
        assert!(matches!(err, CartError::LineNotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        h.cart.add_to_cart(&product("p1", 500, None), 1, None).unwrap();

        h.cart.clear_cart().unwrap();
        h.cart.clear_cart().unwrap();
        assert_eq!(h.cart.total_items(), 0);
        assert_eq!(h.cart.total_price(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_identity_switch_restores_each_cart() {
        let h = harness();
        let a = sign_in(&h.auth, "anita@example.com").await;
        h.cart.add_to_cart(&product("p1", 500, None), 2, Some("M")).unwrap();
        let cart_of_a = h.cart.lines();

        h.auth.logout().unwrap();
        assert!(h.cart.is_empty());

        let b = sign_in(&h.auth, "bela@example.com").await;
        assert_ne!(a, b);
        assert!(h.cart.is_empty());
        h.cart.add_to_cart(&product("p2", 800, None), 1, None).unwrap();
        h.cart.remove_from_cart(&ProductId::new("p1")).unwrap();

        h.auth.logout().unwrap();
        sign_in(&h.auth, "anita@example.com").await;
        assert_eq!(h.cart.owner(), Some(a));
        assert_eq!(h.cart.lines(), cart_of_a);
    }

    #[tokio::test]
    async fn test_cart_is_persisted_per_identity() {
        let h = harness();
        let id = sign_in(&h.auth, "priya@example.com").await;
        h.cart.add_to_cart(&product("p1", 500, None), 3, Some("S")).unwrap();

        let persisted: Vec<CartLine> = read_json(
            h.store.as_ref(),
            &StorageKeys::default().cart_key(&id),
        )
        .unwrap()
        .unwrap();
        assert_eq!(persisted, h.cart.lines());
    }

    #[tokio::test]
    async fn test_corrupt_cart_record_is_discarded() {
        let h = harness();
        let id = UserIdStrategy::DerivedFromEmail.assign(&Email::parse("priya@example.com").unwrap());
        let key = StorageKeys::default().cart_key(&id);
        h.store.set(&key, "[{\"product\":".to_string()).unwrap();

        sign_in(&h.auth, "priya@example.com").await;
        assert!(h.cart.is_empty());
        assert!(h.store.get(&key).unwrap().is_none());

        h.cart.add_to_cart(&product("p1", 500, None), 1, None).unwrap();
        assert_eq!(h.cart.total_items(), 1);
    }

    #[tokio::test]
    async fn test_cart_record_breaking_line_rules_is_discarded() {
        let h = harness();
        let id = UserIdStrategy::DerivedFromEmail.assign(&Email::parse("priya@example.com").unwrap());
        let key = StorageKeys::default().cart_key(&id);
        let line = |quantity| CartLine {
            product: product("p1", 500, None),
            quantity,
            selected_size: Some("S".to_string()),
        };

        for bad in [vec![line(0)], vec![line(1), line(2)], vec![line(MAX_LINE_QUANTITY + 1)]] {
            write_json(h.store.as_ref(), &key, &bad).unwrap();
            sign_in(&h.auth, "priya@example.com").await;
            assert!(h.cart.is_empty());
            assert!(h.store.get(&key).unwrap().is_none());
            h.auth.logout().unwrap();
            assert!(h.cart.is_empty());
        }

        write_json(h.store.as_ref(), &key, &vec![line(2)]).unwrap();
        sign_in(&h.auth, "priya@example.com").await;
        assert_eq!(h.cart.total_items(), 2);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_cart() {
        let h = harness();
        sign_in(&h.auth, "priya@example.com").await;
        h.cart.add_to_cart(&product("p1", 500, None), 2, None).unwrap();

        h.auth
            .update_profile(ProfileUpdate {
                name: Some("Priya S".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(h.cart.total_items(), 2);
    }
}
