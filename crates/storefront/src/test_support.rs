//! Shared fixtures for unit tests.

use rust_decimal::Decimal;

use styleaura_core::{Product, ProductId};

/// A product priced in whole rupees with sizes S, M and L. A `sale` price
/// also sets a discount.
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
        size: vec!["S".to_string(), "M".to_string(), "L".to_string()],
        colors: None,
        tags: None,
        available: true,
        in_stock: None,
    }
}
