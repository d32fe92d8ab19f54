//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! sa-cli catalog list
//! sa-cli catalog list --category lehengas
//! sa-cli catalog search wedding
//! sa-cli catalog show lehenga1
//! ```

use tracing::info;

use styleaura_core::{Price, Product, ProductId};

use crate::error::CliError;
use crate::shell::Shell;

/// List products, optionally of one category.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(category: Option<&str>) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let catalog = shell.state.catalog();
    let products: Vec<&Product> = match category {
        Some(category) => catalog.by_category(category).collect(),
        None => catalog.products().iter().collect(),
    };
    show_products(&products);
    Ok(())
}

/// Search product names and tags.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn search(term: &str) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    show_products(&shell.state.catalog().search(term));
    Ok(())
}

/// Show one product in full.
///
/// # Errors
///
/// Returns `CliError::Usage` for an unknown product id.
pub async fn show(id: &str) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let product = shell
        .state
        .catalog()
        .get(&ProductId::new(id))
        .ok_or_else(|| CliError::Usage(format!("No product with id {id}")))?;

    info!("{} ({})", product.name, product.id);
    if !product.description.is_empty() {
        info!("  {}", product.description);
    }
    info!("  Price: {}", price_label(product));
    info!("  Category: {}", product.category);
    if !product.size.is_empty() {
        info!("  Sizes: {}", product.size.join(", "));
    }
    if let Some(colors) = &product.colors {
        info!("  Colors: {}", colors.join(", "));
    }
    if !product.available {
        info!("  Currently unavailable");
    }
    Ok(())
}

fn show_products(products: &[&Product]) {
    if products.is_empty() {
        info!("No products found");
        return;
    }
    for product in products {
        let sold_out = if product.available { "" } else { " [sold out]" };
        info!(
            "{:<10} {:<36} {}{sold_out}",
            product.id.as_str(),
            product.name,
            price_label(product)
        );
    }
    info!("{} product(s)", products.len());
}

pub(crate) fn price_label(product: &Product) -> String {
    match product.sale_price.filter(|_| product.is_on_sale()) {
        Some(sale) => format!(
            "{} (was {}, {}% off)",
            Price::inr(sale),
            Price::inr(product.price),
            product.discount
        ),
        None => Price::inr(product.price).to_string(),
    }
}
