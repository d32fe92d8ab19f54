//! Customer-facing order history and site announcements.

use chrono::Utc;
use tracing::info;

use styleaura_core::{Order, Price};

use crate::error::CliError;
use crate::shell::Shell;

/// Show the signed-in identity's orders, newest first.
///
/// # Errors
///
/// Returns an error when signed out.
pub async fn history() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let identity = shell.identity()?;
    let orders = shell.orders.for_user(&identity.id)?;
    if orders.is_empty() {
        info!("No orders yet");
    }
    for order in &orders {
        show_order(order);
    }
    Ok(())
}

/// Show the announcements visible right now.
///
/// # Errors
///
/// Returns an error if the data file cannot be read.
pub async fn announcements() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    for announcement in shell.announcements.active(Utc::now())? {
        match &announcement.url {
            Some(url) => info!("{} -> {url}", announcement.message),
            None => info!("{}", announcement.message),
        }
    }
    Ok(())
}

pub(crate) fn show_order(order: &Order) {
    info!(
        "{}  {}  {:<10}  {} item(s)  {}  ({}, ship to {})",
        order.id,
        order.placed_at.format("%Y-%m-%d %H:%M"),
        order.status.to_string(),
        order.item_count(),
        Price::inr(order.total),
        order.payment_method,
        order.shipping_address.name
    );
}
