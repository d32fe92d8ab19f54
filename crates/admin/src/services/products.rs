//! Product management.
//!
//! Administrators add, edit and remove catalog products. The list starts as
//! the catalog file's products and is persisted on the first change; the
//! storefront then serves the persisted list.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, instrument};

use styleaura_core::storage::{KeyValueStore, StorageKeys};
use styleaura_core::{Product, ProductId};
use styleaura_storefront::services::validation::ValidationErrors;

use crate::db::JsonCollection;
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdmin;

/// Size offered by products that come in one size.
pub const FREE_SIZE: &str = "Free Size";

/// The add/edit product form.
///
/// The sale price is not entered; it is derived from `price` and `discount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    /// List price in rupees.
    pub price: Decimal,
    /// Percentage off, 0 to 100.
    pub discount: u8,
    pub category: String,
    pub image_url: String,
    /// Empty means [`FREE_SIZE`].
    pub size: Vec<String>,
    pub available: bool,
    pub in_stock: Option<u32>,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: Decimal::ZERO,
            discount: 0,
            category: String::new(),
            image_url: String::new(),
            size: vec![FREE_SIZE.to_string()],
            available: true,
            in_stock: Some(10),
        }
    }
}

impl ProductDraft {
    /// Prefill the edit form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            discount: product.discount,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            size: product.size.clone(),
            available: product.available,
            in_stock: product.in_stock,
        }
    }

    /// Apply the form to `product`, keeping fields the form does not edit.
    fn apply(self, mut product: Product) -> Product {
        product.sale_price = sale_price(self.price, self.discount);
        product.name = self.name.trim().to_string();
        product.description = self.description.trim().to_string();
        product.price = self.price;
        product.discount = self.discount;
        product.category = self.category.trim().to_string();
        product.image_url = self.image_url.trim().to_string();
        product.size = if self.size.is_empty() {
            vec![FREE_SIZE.to_string()]
        } else {
            self.size
        };
        product.available = self.available;
        product.in_stock = self.in_stock;
        product
    }

    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        errors.ensure(!self.name.trim().is_empty(), "name", "Name is required");
        errors.ensure(self.price > Decimal::ZERO, "price", "Price must be positive");
        errors.ensure(self.discount <= 100, "discount", "Discount must be between 0 and 100");
        errors.ensure(!self.category.trim().is_empty(), "category", "Category is required");
        errors.into_result().map_err(AdminError::from)
    }
}

/// `round(price * (1 - discount / 100))`, or none without a discount.
///
/// Halves round up, matching the storefront's price labels.
#[must_use]
pub fn sale_price(price: Decimal, discount: u8) -> Option<Decimal> {
    if discount == 0 || price.is_zero() {
        return None;
    }
    let factor = Decimal::ONE - Decimal::from(discount) / Decimal::ONE_HUNDRED;
    Some((price * factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// The admin-managed product list.
#[derive(Debug)]
pub struct ProductShelf {
    products: JsonCollection<Product>,
}

impl ProductShelf {
    /// Create a shelf over the products key in `store`. Until the first
    /// change it reads as `seed`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &StorageKeys, seed: Vec<Product>) -> Self {
        Self {
            products: JsonCollection::seeded(store, keys.products.clone(), seed),
        }
    }

    /// Every product, in stored order. This is what the storefront sells.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the list cannot be read.
    pub fn products(&self) -> Result<Vec<Product>> {
        Ok(self.products.load()?)
    }

    /// Products whose name or category contains `search`
    /// (case-insensitive). Blank matches everything.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the list cannot be read.
    pub fn list(&self, _admin: &RequireAdmin, search: &str) -> Result<Vec<Product>> {
        let term = search.trim().to_lowercase();
        Ok(self
            .products
            .load()?
            .into_iter()
            .filter(|product| {
                term.is_empty()
                    || product.name.to_lowercase().contains(&term)
                    || product.category.to_lowercase().contains(&term)
            })
            .collect())
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id.
    pub fn get(&self, _admin: &RequireAdmin, id: &ProductId) -> Result<Product> {
        self.products
            .load()?
            .into_iter()
            .find(|product| &product.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Add a product, id `product-<n>` where `n` starts one past the
    /// current count.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` for a missing name or category, a
    /// non-positive price, a discount above 100, or a discount too small to
    /// lower the rounded price.
    #[instrument(skip(self, admin, draft), fields(admin_id = %admin.identity().id))]
    pub fn create(&self, admin: &RequireAdmin, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;

        let created = self.products.update(|products| {
            let template = Product {
                id: unused_id(products),
                name: String::new(),
                description: String::new(),
                price: Decimal::ZERO,
                sale_price: None,
                discount: 0,
                category: String::new(),
                image_url: String::new(),
                size: Vec::new(),
                colors: None,
                tags: None,
                available: true,
                in_stock: None,
            };
            let product = checked(draft.apply(template))?;
            products.push(product.clone());
            Ok::<_, AdminError>(product)
        })?;
        info!(product_id = %created.id, "Product added");
        Ok(created)
    }

    /// Replace the editable fields of a product and recompute its sale
    /// price. Colors and tags are kept.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` as for [`Self::create`], or
    /// `AdminError::NotFound` for an unknown id.
    #[instrument(skip(self, admin, draft), fields(admin_id = %admin.identity().id, product_id = %id))]
    pub fn update(&self, admin: &RequireAdmin, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;

        let updated = self.products.update(|products| {
            let slot = products
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            let product = checked(draft.apply(slot.clone()))?;
            slot.clone_from(&product);
            Ok::<_, AdminError>(product)
        })?;
        info!("Product updated");
        Ok(updated)
    }

    /// Remove a product and return it. Carts holding it keep their copy.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id.
    #[instrument(skip(self, admin), fields(admin_id = %admin.identity().id, product_id = %id))]
    pub fn delete(&self, admin: &RequireAdmin, id: &ProductId) -> Result<Product> {
        let removed = self.products.update(|products| {
            let position = products
                .iter()
                .position(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            Ok::<_, AdminError>(products.remove(position))
        })?;
        info!("Product deleted");
        Ok(removed)
    }
}

/// Run the catalog invariants, reporting a failure against the form field
/// the administrator can change.
fn checked(product: Product) -> Result<Product> {
    if let Err(e) = product.validate() {
        let mut errors = ValidationErrors::new();
        errors.add("discount", e.to_string());
        return Err(errors.into());
    }
    Ok(product)
}

fn unused_id(products: &[Product]) -> ProductId {
    let mut n = products.len() + 1;
    loop {
        let id = ProductId::new(format!("product-{n}"));
        if products.iter().all(|existing| existing.id != id) {
            return id;
        }
        n += 1;
    }
}

fn not_found(id: &ProductId) -> AdminError {
    AdminError::NotFound(format!("product {id}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::storage::MemoryStore;

    use super::*;
    use crate::test_support::admin_guard;

    fn seed_product(id: &str, name: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(2000, 0),
            sale_price: None,
            discount: 0,
            category: category.to_string(),
            image_url: format!("/images/{id}.jpg"),
            size: vec!["M".to_string()],
            colors: Some(vec!["Red".to_string()]),
            tags: None,
            available: true,
            in_stock: Some(3),
        }
    }

    fn shelf() -> (Arc<MemoryStore>, ProductShelf) {
        let store = Arc::new(MemoryStore::new());
        let seed = vec![
            seed_product("saree1", "Banarasi Silk Saree", "sarees"),
            seed_product("kurta1", "Cotton Kurti", "kurtis"),
        ];
        let shelf = ProductShelf::new(store.clone(), &StorageKeys::default(), seed);
        (store, shelf)
    }

    fn draft(name: &str, price: i64, discount: u8) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price: Decimal::new(price, 0),
            discount,
            category: "gowns".to_string(),
            image_url: "/images/gown.jpg".to_string(),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_sale_price_rounds_half_up() {
        assert_eq!(sale_price(Decimal::new(2499, 0), 20), Some(Decimal::new(1999, 0)));
        assert_eq!(sale_price(Decimal::new(1999, 0), 15), Some(Decimal::new(1699, 0)));
        assert_eq!(sale_price(Decimal::new(1000, 0), 0), None);
        assert_eq!(sale_price(Decimal::new(5, 0), 10), Some(Decimal::new(5, 0)));
    }

    #[test]
    fn test_reads_seed_until_changed() {
        let (store, shelf) = shelf();
        assert_eq!(shelf.products().unwrap().len(), 2);
        assert!(store.get("styleaura_products").unwrap().is_none());

        shelf.delete(&admin_guard(), &ProductId::new("kurta1")).unwrap();
        assert!(store.get("styleaura_products").unwrap().is_some());
        assert_eq!(shelf.products().unwrap().len(), 1);
    }

    #[test]
    fn test_create_derives_sale_price_and_id() {
        let (_, shelf) = shelf();
        let admin = admin_guard();

        let gown = shelf.create(&admin, draft("Anarkali Gown", 4999, 20)).unwrap();
        assert_eq!(gown.id.as_str(), "product-3");
        assert_eq!(gown.sale_price, Some(Decimal::new(3999, 0)));
        assert_eq!(gown.size, vec![FREE_SIZE.to_string()]);
        assert_eq!(gown.in_stock, Some(10));

        shelf.delete(&admin, &ProductId::new("saree1")).unwrap();
        let next = shelf.create(&admin, draft("Party Gown", 2999, 0)).unwrap();
        assert_eq!(next.id.as_str(), "product-4");
        assert_eq!(next.sale_price, None);
    }

    #[test]
    fn test_create_rejects_invalid_forms() {
        let (_, shelf) = shelf();
        let admin = admin_guard();

        let err = shelf
            .create(
                &admin,
                ProductDraft {
                    category: " ".to_string(),
                    ..draft(" ", 0, 120)
                },
            )
            .unwrap_err();
        let errors = match err {
            AdminError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        for field in ["name", "price", "discount", "category"] {
            assert!(errors.has(field), "{field} should fail");
        }

        let err = shelf.create(&admin, draft("Tiny", 5, 10)).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert_eq!(shelf.products().unwrap().len(), 2);
    }

    #[test]
    fn test_update_recomputes_sale_price_and_keeps_colors() {
        let (_, shelf) = shelf();
        let admin = admin_guard();
        let id = ProductId::new("saree1");

        let mut form = ProductDraft::from_product(&shelf.get(&admin, &id).unwrap());
        form.discount = 25;
        let updated = shelf.update(&admin, &id, form).unwrap();

        assert_eq!(updated.sale_price, Some(Decimal::new(1500, 0)));
        assert_eq!(updated.colors, Some(vec!["Red".to_string()]));
        assert_eq!(shelf.get(&admin, &id).unwrap(), updated);

        let mut form = ProductDraft::from_product(&updated);
        form.discount = 0;
        assert_eq!(shelf.update(&admin, &id, form).unwrap().sale_price, None);
    }

    #[test]
    fn test_search_and_unknown_ids() {
        let (_, shelf) = shelf();
        let admin = admin_guard();

        let sarees = shelf.list(&admin, "SAREE").unwrap();
        assert_eq!(sarees.len(), 1);
        assert_eq!(shelf.list(&admin, "kurtis").unwrap().len(), 1);
        assert_eq!(shelf.list(&admin, "  ").unwrap().len(), 2);

        let missing = ProductId::new("product-99");
        assert!(matches!(shelf.get(&admin, &missing), Err(AdminError::NotFound(_))));
        assert!(matches!(shelf.delete(&admin, &missing), Err(AdminError::NotFound(_))));
        assert!(matches!(
            shelf.update(&admin, &missing, draft("Gown", 100, 0)),
            Err(AdminError::NotFound(_))
        ));
    }
}
