//! Cart line types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// One (product, size) entry in a cart.
///
/// Persisted as `{"product": {...}, "quantity": 2, "selectedSize": "M"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    /// Between 1 and `MAX_LINE_QUANTITY` inside a cart.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
}

impl CartLine {
    /// The merge key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product.id.clone(),
            size: self.selected_size.clone(),
        }
    }

    /// Whether this line has the given merge key.
    ///
    /// Two lines match when the product ids are equal and either both have no
    /// size or both have the same size.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, size: Option<&str>) -> bool {
        self.product.id == *product_id && self.selected_size.as_deref() == size
    }

    /// Effective unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.effective_price() * Decimal::from(self.quantity)
    }
}

/// The identity of a cart line: product id plus selected size (or none).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: Option<String>,
}

impl LineKey {
    /// Key for a product with an optional size.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, size: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.map(str::to_owned),
        }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{}/{size}", self.product_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::tests::product;

    fn line(size: Option<&str>, quantity: u32) -> CartLine {
        CartLine {
            product: product("p1", 1200, None),
            quantity,
            selected_size: size.map(str::to_owned),
        }
    }

    #[test]
    fn test_matches_requires_same_size_or_both_absent() {
        let id = ProductId::new("p1");
        assert!(line(Some("M"), 1).matches(&id, Some("M")));
        assert!(line(None, 1).matches(&id, None));
        assert!(!line(Some("M"), 1).matches(&id, None));
        assert!(!line(None, 1).matches(&id, Some("M")));
        assert!(!line(Some("M"), 1).matches(&id, Some("L")));
        assert!(!line(Some("M"), 1).matches(&ProductId::new("p2"), Some("M")));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(None, 3).line_total(), Decimal::new(3600, 0));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(line(Some("XL"), 1).key().to_string(), "p1/XL");
        assert_eq!(LineKey::new("p9", None).to_string(), "p9");
    }
}
