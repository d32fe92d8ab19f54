//! Checkout command.
//!
//! Runs the whole checkout in one go: shipping form, payment method, card
//! form when paying by card, then payment. Shipping fields default to the
//! signed-in profile.
//!
//! # Usage
//!
//! ```bash
//! sa-cli checkout --city Pune --state Maharashtra --pincode 411001 --method cod
//! sa-cli checkout --city Pune --state Maharashtra --pincode 411001 \
//!     --method upi --upi-id priya@okbank
//! sa-cli checkout --city Pune --state Maharashtra --pincode 411001 \
//!     --method card --card-number 4111111111111111 --card-name "Priya Sharma" \
//!     --expiry 12/29 --cvv 123
//! ```

use clap::{Args, ValueEnum};
use secrecy::SecretString;
use tracing::{info, warn};

use styleaura_core::Price;
use styleaura_storefront::services::checkout::{
    CardDetails, CheckoutEntry, CheckoutError, CheckoutStep, PaymentMethod, ShippingDetails,
};

use crate::error::CliError;
use crate::shell::Shell;

/// How to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Card,
    Upi,
    Cod,
}

/// Arguments of `checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Recipient name (defaults to the profile name)
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email (defaults to the profile email)
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone (defaults to the profile phone)
    #[arg(long)]
    pub phone: Option<String>,

    /// Street address (defaults to the profile address)
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub pincode: String,

    /// Delivery notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Payment method
    #[arg(long, value_enum, default_value = "cod")]
    pub method: MethodArg,

    /// UPI id, for `--method upi`
    #[arg(long)]
    pub upi_id: Option<String>,

    /// Card number, for `--method card`
    #[arg(long)]
    pub card_number: Option<String>,

    /// Name on the card
    #[arg(long)]
    pub card_name: Option<String>,

    /// Expiry as MM/YY
    #[arg(long)]
    pub expiry: Option<String>,

    #[arg(long)]
    pub cvv: Option<String>,
}

/// Place an order for everything in the cart.
///
/// # Errors
///
/// Returns an error when signed out or the cart is empty, for invalid
/// shipping or payment fields, or if the payment fails. A failed payment
/// leaves the cart as it was, and so does a paid order that could not be
/// saved after one retry.
pub async fn run(args: CheckoutArgs) -> Result<(), CliError> {
    let shell = Shell::open().await?;
    let mut checkout = match shell.state.begin_checkout() {
        CheckoutEntry::Ready(checkout) => checkout,
        CheckoutEntry::Wait => {
            return Err(CliError::Usage("Still signing in, try again".to_string()));
        }
        CheckoutEntry::Redirect(route) => return Err(CliError::Redirect(route)),
    };

    let profile = ShippingDetails::for_identity(checkout.identity());
    let shipping = ShippingDetails {
        name: args.name.unwrap_or(profile.name),
        email: args.email.unwrap_or(profile.email),
        phone: args.phone.unwrap_or(profile.phone),
        address: args.address.unwrap_or(profile.address),
        city: args.city,
        state: args.state,
        pincode: args.pincode,
        notes: args.notes,
    };
    let method = match args.method {
        MethodArg::Card => PaymentMethod::Card,
        MethodArg::Upi => PaymentMethod::Upi {
            upi_id: args.upi_id.unwrap_or_default(),
        },
        MethodArg::Cod => PaymentMethod::Cod,
    };

    if checkout.submit_shipping(shipping, method)? == CheckoutStep::CollectingCardDetails {
        checkout.submit_card(CardDetails {
            number: SecretString::from(args.card_number.unwrap_or_default()),
            holder: args.card_name.unwrap_or_default(),
            expiry: args.expiry.unwrap_or_default(),
            cvv: SecretString::from(args.cvv.unwrap_or_default()),
        })?;
    }

    let summary = checkout.summary(shell.state.cart());
    info!("Paying {} for {} item(s)...", summary.total_price(), summary.item_count);

    let (gateway, cart) = (shell.state.gateway(), shell.state.cart());
    let outcome = match checkout.place_order(gateway, cart, &shell.orders).await {
        Err(CheckoutError::OrderNotRecorded { order_id, .. }) => {
            warn!("Payment taken but order {order_id} was not saved, retrying");
            checkout.place_order(gateway, cart, &shell.orders).await?
        }
        placed => placed?,
    };

    info!("Order {} placed", outcome.order.id);
    info!("  Payment reference: {}", outcome.confirmation.reference);
    info!("  Subtotal: {}", Price::inr(outcome.order.subtotal));
    info!("  Shipping: {}", Price::inr(outcome.order.shipping));
    info!("  Total: {}", Price::inr(outcome.order.total));
    Ok(())
}
