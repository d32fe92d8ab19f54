//! Catalog product reference data.
//!
//! Products are owned by the catalog; carts and orders only hold copies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;

/// A product violates a catalog invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductError {
    /// Price is zero or negative.
    #[error("product {0}: price must be positive")]
    NonPositivePrice(ProductId),
    /// A discounted product has no sale price.
    #[error("product {0}: discount is set but sale price is missing")]
    MissingSalePrice(ProductId),
    /// The sale price is not below the list price.
    #[error("product {id}: sale price {sale} must be below price {price}")]
    SalePriceNotBelowPrice {
        /// Offending product.
        id: ProductId,
        /// Sale price.
        sale: Decimal,
        /// List price.
        price: Decimal,
    },
    /// Discount percentage above 100.
    #[error("product {0}: discount must be at most 100")]
    DiscountOutOfRange(ProductId),
}

/// A catalog product.
///
/// Serialized with camelCase keys so persisted carts keep the storefront's
/// existing record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// List price in rupees.
    pub price: Decimal,
    /// Discounted price; present whenever `discount > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    /// Discount percentage shown on the product card.
    #[serde(default)]
    pub discount: u8,
    pub category: String,
    pub image_url: String,
    /// Available sizes, in display order.
    #[serde(default)]
    pub size: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<u32>,
}

impl Product {
    /// The unit price a shopper pays: the sale price when there is one.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    /// Whether the product is currently discounted.
    #[must_use]
    pub const fn is_on_sale(&self) -> bool {
        self.discount > 0
    }

    /// Whether `size` is one of the product's offered sizes.
    ///
    /// Products without a size list accept no explicit size.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.size.iter().any(|s| s == size)
    }

    /// Check the catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.price <= Decimal::ZERO {
            return Err(ProductError::NonPositivePrice(self.id.clone()));
        }
        if self.discount > 100 {
            return Err(ProductError::DiscountOutOfRange(self.id.clone()));
        }
        if self.discount > 0 {
            let sale = self
                .sale_price
                .ok_or_else(|| ProductError::MissingSalePrice(self.id.clone()))?;
            if sale >= self.price {
                return Err(ProductError::SalePriceNotBelowPrice {
                    id: self.id.clone(),
                    sale,
                    price: self.price,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Builds a product priced in whole rupees; `sale` also sets a discount.
    pub(crate) fn product(id: &str, price: i64, sale: Option<i64>) -> Product {
        let discount = sale.map_or(0, |s| {
            u8::try_from((price - s) * 100 / price).unwrap_or(0).max(1)
        });
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(price, 0),
            sale_price: sale.map(|s| Decimal::new(s, 0)),
            discount,
            category: "lehenga".to_string(),
            image_url: format!("/images/{id}.jpg"),
            size: vec!["S".into(), "M".into(), "L".into()],
            colors: None,
            tags: None,
            available: true,
            in_stock: Some(10),
        }
    }

    #[test]
    fn test_effective_price_prefers_sale_price() {
        assert_eq!(
            product("p1", 2499, Some(1999)).effective_price(),
            Decimal::new(1999, 0)
        );
        assert_eq!(product("p2", 999, None).effective_price(), Decimal::new(999, 0));
    }

    #[test]
    fn test_validate_discount_invariant() {
        assert!(product("p1", 2499, Some(1999)).validate().is_ok());

        let mut missing = product("p2", 999, None);
        missing.discount = 10;
        assert_eq!(
            missing.validate(),
            Err(ProductError::MissingSalePrice(ProductId::new("p2")))
        );

        let mut inverted = product("p3", 999, Some(500));
        inverted.sale_price = Some(Decimal::new(1200, 0));
        assert!(matches!(
            inverted.validate(),
            Err(ProductError::SalePriceNotBelowPrice { .. })
        ));
    }

    #[test]
    fn test_camel_case_layout() {
        let json = serde_json::to_value(product("p1", 2499, Some(1999))).unwrap();
        assert!(json.get("salePrice").is_some());
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("inStock").is_some());
        assert!(json.get("colors").is_none());
    }
}
