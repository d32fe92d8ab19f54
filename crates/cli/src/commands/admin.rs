//! Administrator commands.
//!
//! Sign in as the administrator first:
//!
//! ```bash
//! sa-cli login -e admin@styleaura.com -p admin123
//! sa-cli admin orders --status processing --search priya
//! sa-cli admin status ORD-1A2B3C4D5E shipped
//! sa-cli admin announce create -m "Summer Sale! 20% off" --days 30
//! sa-cli admin announce list
//! sa-cli admin announce edit ann-1746057600000 --days 45
//! sa-cli admin announce toggle ann-1746057600000
//! sa-cli admin products list --search saree
//! sa-cli admin products add --name "Anarkali Gown" --price 4999 --discount 20 --category gowns
//! sa-cli admin products edit product-9 --in-stock 4 --available false
//! ```

use chrono::{Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use styleaura_admin::services::{OrderQuery, ProductDraft, StatusFilter};
use styleaura_core::{AnnouncementDraft, AnnouncementId, OrderId, OrderStatus, ProductId};

use crate::commands::catalog::price_label;
use crate::commands::orders::show_order;
use crate::error::CliError;
use crate::shell::Shell;

/// List orders matching a search term and status.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an unknown
/// status.
pub async fn orders(search: Option<String>, status: &str) -> Result<(), CliError> {
    let status: StatusFilter = status.parse().map_err(CliError::Usage)?;
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let orders = shell.orders.list(&admin, &OrderQuery { search, status })?;
    for order in &orders {
        show_order(order);
    }
    info!("Orders ({})", orders.len());
    Ok(())
}

/// Move an order to a new status.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an unknown
/// order or status.
pub async fn set_status(order_id: &str, status: &str) -> Result<(), CliError> {
    let status: OrderStatus = status.parse().map_err(CliError::Usage)?;
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let order = shell
        .orders
        .update_status(&admin, &OrderId::new(order_id), status)?;
    info!("Order #{} status changed to {}", order.id, order.status);
    Ok(())
}

/// Publish an announcement running from now for `days` days.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an empty
/// message or negative duration.
pub async fn announce(
    message: String,
    url: Option<String>,
    days: i64,
    inactive: bool,
) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;
    let now = Utc::now();

    let announcement = shell.announcements.create(
        &admin,
        AnnouncementDraft {
            message,
            url,
            is_active: !inactive,
            starts_at: now,
            ends_at: now + Duration::days(days),
        },
        now,
    )?;
    info!("Announcement {} created", announcement.id);
    Ok(())
}

/// List every announcement.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in.
pub async fn announcements() -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;
    let now = Utc::now();

    for announcement in shell.announcements.list(&admin)? {
        let state = if announcement.is_visible_at(now) {
            "live"
        } else if announcement.is_active {
            "scheduled"
        } else {
            "off"
        };
        info!(
            "{}  [{state}]  {} .. {}  {}",
            announcement.id,
            announcement.starts_at.format("%Y-%m-%d"),
            announcement.ends_at.format("%Y-%m-%d"),
            announcement.message
        );
    }
    Ok(())
}

/// Change the message, link or end date of an announcement.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, for an unknown
/// announcement, or if the edit leaves it invalid.
pub async fn edit(
    id: &str,
    message: Option<String>,
    url: Option<String>,
    days: Option<i64>,
) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let id = AnnouncementId::new(id);
    let mut announcement = shell
        .announcements
        .list(&admin)?
        .into_iter()
        .find(|announcement| announcement.id == id)
        .ok_or_else(|| CliError::Usage(format!("No announcement with id {id}")))?;
    if let Some(message) = message {
        announcement.message = message;
    }
    if url.is_some() {
        announcement.url = url;
    }
    if let Some(days) = days {
        announcement.ends_at = announcement.starts_at + Duration::days(days);
    }

    shell.announcements.update(&admin, announcement)?;
    info!("Announcement {id} updated");
    Ok(())
}

/// Switch an announcement on or off.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an unknown
/// announcement.
pub async fn toggle(id: &str) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let is_active = shell.announcements.toggle(&admin, &AnnouncementId::new(id))?;
    info!(
        "Announcement {id} is now {}",
        if is_active { "active" } else { "inactive" }
    );
    Ok(())
}

/// Delete an announcement.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an unknown
/// announcement.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let removed = shell.announcements.delete(&admin, &AnnouncementId::new(id))?;
    info!("Deleted announcement {}: {}", removed.id, removed.message);
    Ok(())
}

/// Product form fields. On `add`, omitted fields take the form defaults; on
/// `edit`, they keep the product's current value.
#[derive(Debug, Default, Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// List price in rupees
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Percentage off; the sale price is derived from it
    #[arg(long)]
    pub discount: Option<u8>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    /// Offered size, repeatable (defaults to "Free Size")
    #[arg(long = "size")]
    pub sizes: Vec<String>,

    #[arg(long)]
    pub available: Option<bool>,

    #[arg(long)]
    pub in_stock: Option<u32>,
}

impl ProductArgs {
    fn fill(self, draft: &mut ProductDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(discount) = self.discount {
            draft.discount = discount;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(image) = self.image {
            draft.image_url = image;
        }
        if !self.sizes.is_empty() {
            draft.size = self.sizes;
        }
        if let Some(available) = self.available {
            draft.available = available;
        }
        if self.in_stock.is_some() {
            draft.in_stock = self.in_stock;
        }
    }
}

/// List products whose name or category matches `search`.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in.
pub async fn products(search: Option<String>) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let products = shell
        .products
        .list(&admin, search.as_deref().unwrap_or_default())?;
    for product in &products {
        let stock = product
            .in_stock
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        info!(
            "{:<12} {:<36} {:<12} stock {stock:<4} {}",
            product.id.as_str(),
            product.name,
            product.category,
            price_label(product)
        );
    }
    info!("Products ({})", products.len());
    Ok(())
}

/// Add a product to the catalog.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or if the form is
/// invalid.
pub async fn add_product(args: ProductArgs) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let mut draft = ProductDraft::default();
    args.fill(&mut draft);
    let product = shell.products.create(&admin, draft)?;
    info!("Product {} added at {}", product.id, price_label(&product));
    Ok(())
}

/// Change fields of a product.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, for an unknown
/// product, or if the edit leaves it invalid.
pub async fn edit_product(id: &str, args: ProductArgs) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let id = ProductId::new(id);
    let mut draft = ProductDraft::from_product(&shell.products.get(&admin, &id)?);
    args.fill(&mut draft);
    let product = shell.products.update(&admin, &id, draft)?;
    info!("Product {} updated: {}", product.id, price_label(&product));
    Ok(())
}

/// Remove a product from the catalog.
///
/// # Errors
///
/// Returns an error unless an administrator is signed in, or for an unknown
/// product.
pub async fn delete_product(id: &str) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let admin = shell.admin()?;

    let removed = shell.products.delete(&admin, &ProductId::new(id))?;
    info!("Deleted product {}: {}", removed.id, removed.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_keeps_fields_not_given() {
        let mut draft = ProductDraft {
            name: "Cotton Kurti".to_string(),
            price: Decimal::new(1299, 0),
            category: "kurtis".to_string(),
            ..ProductDraft::default()
        };
        ProductArgs {
            discount: Some(10),
            in_stock: Some(2),
            ..ProductArgs::default()
        }
        .fill(&mut draft);

        assert_eq!(draft.name, "Cotton Kurti");
        assert_eq!(draft.price, Decimal::new(1299, 0));
        assert_eq!(draft.discount, 10);
        assert_eq!(draft.in_stock, Some(2));
        assert_eq!(draft.size, vec!["Free Size".to_string()]);
    }
}
