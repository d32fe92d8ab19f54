//! Cart commands for the signed-in identity.
//!
//! # Usage
//!
//! ```bash
//! sa-cli cart add lehenga1 --size M --quantity 2
//! sa-cli cart update lehenga1 3 --size M
//! sa-cli cart remove lehenga1
//! sa-cli cart show
//! sa-cli cart clear
//! ```

use tracing::info;

use styleaura_core::{LineKey, Price, ProductId};

use crate::error::CliError;
use crate::shell::Shell;

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error when signed out, for an unknown or unavailable product,
/// a size it does not come in, or a zero quantity.
pub async fn add(id: &str, quantity: u32, size: Option<&str>) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let product = shell
        .state
        .catalog()
        .get(&ProductId::new(id))
        .ok_or_else(|| CliError::Usage(format!("No product with id {id}")))?;
    if !product.available {
        return Err(CliError::Usage(format!("{} is sold out", product.name)));
    }

    shell.state.cart().add_to_cart(product, quantity, size)?;
    info!("Added {quantity} x {}", product.name);
    show_lines(&shell);
    Ok(())
}

/// Remove a product from the cart, either one size or every size.
///
/// # Errors
///
/// Returns an error when signed out, or if the product is not in the cart.
pub async fn remove(id: &str, size: Option<&str>) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let cart = shell.state.cart();
    let removed = match size {
        Some(size) => usize::from(cart.remove_line(&LineKey::new(id, Some(size)))?),
        None => cart.remove_from_cart(&ProductId::new(id))?,
    };
    if removed == 0 {
        return Err(CliError::Usage(format!("{id} is not in your cart")));
    }
    info!("Removed {removed} line(s)");
    show_lines(&shell);
    Ok(())
}

/// Set the quantity of a product (every size) or of one line. Zero removes.
///
/// # Errors
///
/// Returns an error when signed out, or if the line is not in the cart.
pub async fn update(id: &str, quantity: u32, size: Option<&str>) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let cart = shell.state.cart();
    match size {
        Some(size) => cart.set_line_quantity(&LineKey::new(id, Some(size)), quantity)?,
        None => cart.update_quantity(&ProductId::new(id), quantity)?,
    }
    show_lines(&shell);
    Ok(())
}

/// Show the cart with totals.
///
/// # Errors
///
/// Returns an error if the data file cannot be read.
pub async fn show() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    shell.identity()?;
    show_lines(&shell);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error when signed out.
pub async fn clear() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    shell.state.cart().clear_cart()?;
    info!("Cart cleared");
    Ok(())
}

fn show_lines(shell: &Shell) {
    let cart = shell.state.cart();
    let lines = cart.lines();
    if lines.is_empty() {
        info!("Your cart is empty");
        return;
    }
    for line in &lines {
        let size = line
            .selected_size
            .as_deref()
            .map_or_else(String::new, |size| format!(" [{size}]"));
        info!(
            "{:>3} x {}{size} @ {} = {}",
            line.quantity,
            line.product.name,
            Price::inr(line.product.effective_price()),
            Price::inr(line.line_total())
        );
    }
    let totals = cart.totals();
    info!("Items: {}", totals.item_count);
    info!("Subtotal: {}", Price::inr(totals.subtotal));
    if totals.has_free_shipping() {
        info!("Shipping: free");
    } else {
        info!("Shipping: {}", Price::inr(totals.shipping));
    }
    info!("Total: {}", totals.total_price());
}
