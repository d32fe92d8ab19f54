//! StyleAura CLI - drive the storefront and admin services from a terminal.
//!
//! State lives in one JSON data file (`STYLEAURA_DATA_FILE`), so a session
//! carries over between invocations: sign in once, then add to the cart and
//! check out with later commands.
//!
//! # Usage
//!
//! ```bash
//! sa-cli login -e priya@example.com -p secret1
//! sa-cli catalog search wedding
//! sa-cli cart add lehenga1 --size M
//! sa-cli checkout --city Pune --state Maharashtra --pincode 411001
//! sa-cli orders
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami`, `profile`, `password` - Account
//! - `catalog` - Browse products
//! - `cart` - Manage the signed-in identity's cart
//! - `checkout` - Pay for the cart and place an order
//! - `orders`, `announcements` - Order history and site announcements
//! - `admin` - Order book, products and announcements (administrators only)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod shell;

use commands::account::{ProfileArgs, RegisterArgs};
use commands::admin::ProductArgs;
use commands::checkout::CheckoutArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "sa-cli")]
#[command(author, version, about = "StyleAura storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign out
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Update profile fields
    Profile(ProfileArgs),
    /// Change password
    Password {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Show your orders
    Orders,
    /// Show current site announcements
    Announcements,
    /// Administrator tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Search names and tags
    Search { term: String },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and totals
    Show,
    /// Add a product
    Add {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a product (every size unless --size is given)
    Remove {
        id: String,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set a quantity (0 removes)
    Update {
        id: String,
        quantity: u32,

        #[arg(short, long)]
        size: Option<String>,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Search and filter orders
    Orders {
        #[arg(short, long)]
        search: Option<String>,

        /// `all`, `processing`, `shipped`, `delivered` or `cancelled`
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Change an order's status
    Status { order_id: String, status: String },
    /// Manage announcements
    Announce {
        #[command(subcommand)]
        action: AnnounceAction,
    },
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, optionally matching a name or category
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a product
    Add(ProductArgs),
    /// Edit a product
    Edit {
        id: String,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum AnnounceAction {
    /// Publish an announcement starting now
    Create {
        #[arg(short, long)]
        message: String,

        #[arg(long)]
        url: Option<String>,

        /// How many days it runs
        #[arg(long, default_value_t = 7)]
        days: i64,

        /// Create switched off
        #[arg(long)]
        inactive: bool,
    },
    /// List every announcement
    List,
    /// Edit an announcement
    Edit {
        id: String,

        #[arg(short, long)]
        message: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// New run length in days, counted from its start
        #[arg(long)]
        days: Option<i64>,
    },
    /// Switch an announcement on or off
    Toggle { id: String },
    /// Delete an announcement
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "styleaura=info,sa_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {}", e.into_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email, password } => commands::account::login(&email, password).await,
        Commands::Register(args) => commands::account::register(args).await,
        Commands::Logout => commands::account::logout().await,
        Commands::Whoami => commands::account::whoami().await,
        Commands::Profile(args) => commands::account::profile(args).await,
        Commands::Password { current, new } => commands::account::password(current, new).await,
        Commands::Catalog { action } => match action {
            CatalogAction::List { category } => commands::catalog::list(category.as_deref()).await,
            CatalogAction::Search { term } => commands::catalog::search(&term).await,
            CatalogAction::Show { id } => commands::catalog::show(&id).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await,
            CartAction::Add { id, quantity, size } => {
                commands::cart::add(&id, quantity, size.as_deref()).await
            }
            CartAction::Remove { id, size } => commands::cart::remove(&id, size.as_deref()).await,
            CartAction::Update { id, quantity, size } => {
                commands::cart::update(&id, quantity, size.as_deref()).await
            }
            CartAction::Clear => commands::cart::clear().await,
        },
        Commands::Checkout(args) => commands::checkout::run(args).await,
        Commands::Orders => commands::orders::history().await,
        Commands::Announcements => commands::orders::announcements().await,
        Commands::Admin { action } => match action {
            AdminAction::Orders { search, status } => {
                commands::admin::orders(search, &status).await
            }
            AdminAction::Status { order_id, status } => {
                commands::admin::set_status(&order_id, &status).await
            }
            AdminAction::Announce { action } => match action {
                AnnounceAction::Create {
                    message,
                    url,
                    days,
                    inactive,
                } => commands::admin::announce(message, url, days, inactive).await,
                AnnounceAction::List => commands::admin::announcements().await,
                AnnounceAction::Edit {
                    id,
                    message,
                    url,
                    days,
                } => commands::admin::edit(&id, message, url, days).await,
                AnnounceAction::Toggle { id } => commands::admin::toggle(&id).await,
                AnnounceAction::Delete { id } => commands::admin::delete(&id).await,
            },
            AdminAction::Products { action } => match action {
                ProductAction::List { search } => commands::admin::products(search).await,
                ProductAction::Add(fields) => commands::admin::add_product(fields).await,
                ProductAction::Edit { id, fields } => {
                    commands::admin::edit_product(&id, fields).await
                }
                ProductAction::Delete { id } => commands::admin::delete_product(&id).await,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_cart_add() {
        let cli = Cli::try_parse_from(["sa-cli", "cart", "add", "lehenga1", "-s", "M", "-q", "2"]);
        let Ok(Cli {
            command:
                Commands::Cart {
                    action: CartAction::Add { id, quantity, size },
                },
        }) = cli
        else {
            panic!("expected cart add");
        };
        assert_eq!(id, "lehenga1");
        assert_eq!(quantity, 2);
        assert_eq!(size.as_deref(), Some("M"));
    }

    #[test]
    fn test_parses_product_edit() {
        let cli = Cli::try_parse_from([
            "sa-cli", "admin", "products", "edit", "product-9", "--price", "2499.50", "--size", "S",
            "--size", "M", "--available", "false",
        ]);
        let Ok(Cli {
            command:
                Commands::Admin {
                    action:
                        AdminAction::Products {
                            action: ProductAction::Edit { id, fields },
                        },
                },
        }) = cli
        else {
            panic!("expected products edit");
        };
        assert_eq!(id, "product-9");
        assert_eq!(fields.price.map(|p| p.to_string()).as_deref(), Some("2499.50"));
        assert_eq!(fields.sizes, vec!["S".to_string(), "M".to_string()]);
        assert_eq!(fields.available, Some(false));
        assert!(fields.name.is_none());
    }

    #[test]
    fn test_checkout_defaults_to_cash_on_delivery() {
        let cli = Cli::try_parse_from([
            "sa-cli", "checkout", "--city", "Pune", "--state", "Maharashtra", "--pincode", "411001",
        ]);
        let Ok(Cli {
            command: Commands::Checkout(args),
        }) = cli
        else {
            panic!("expected checkout");
        };
        assert_eq!(args.method, commands::checkout::MethodArg::Cod);
        assert!(args.name.is_none());
    }
}
