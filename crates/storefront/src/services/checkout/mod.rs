//! Checkout flow.
//!
//! A linear state machine over the signed-in identity's cart:
//!
//! ```text
//! CollectingShippingAndMethod --card--> CollectingCardDetails --> Submitting --> Completed
//!            |        ^---------------------back---'                ^
//!            '------------------------upi / cod---------------------'
//! ```
//!
//! Every form is validated before the step changes. A failed charge returns
//! to the step the payment was submitted from and leaves the cart alone.
//! A successful charge is recorded through an [`OrderSink`] before the cart
//! is cleared.

mod error;
pub mod payment;

pub use error::CheckoutError;
pub use payment::{PaymentConfirmation, PaymentError, PaymentGateway, PaymentRequest, SimulatedGateway};

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use styleaura_core::pricing::OrderSummary;
use styleaura_core::storage::StorageError;
use styleaura_core::{
    Identity, Order, OrderId, OrderItem, OrderStatus, PaymentMethodKind, Price, ShippingAddress,
};

use crate::models::Route;
use crate::services::auth::AuthStore;
use crate::services::cart::CartStore;
use crate::services::validation::ValidationErrors;

/// Card expiry, `MM/YY`.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}$").expect("Invalid regex"));

/// Durable destination of placed orders.
pub trait OrderSink: Send + Sync {
    /// Persist a paid order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the order cannot be written.
    fn record_order(&self, order: &Order) -> Result<(), StorageError>;
}

/// Steps of the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    CollectingShippingAndMethod,
    CollectingCardDetails,
    /// Details are complete; the order can be placed.
    Submitting,
    Completed,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CollectingShippingAndMethod => "collecting shipping details",
            Self::CollectingCardDetails => "collecting card details",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
        })
    }
}

/// Chosen payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Upi { upi_id: String },
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    #[must_use]
    pub const fn kind(&self) -> PaymentMethodKind {
        match self {
            Self::Card => PaymentMethodKind::Card,
            Self::Upi { .. } => PaymentMethodKind::Upi,
            Self::Cod => PaymentMethodKind::Cod,
        }
    }
}

/// Shipping form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    /// Delivery notes; not validated.
    pub notes: Option<String>,
}

impl ShippingDetails {
    /// Prefill from the signed-in identity.
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.to_string(),
            phone: identity.phone.clone().unwrap_or_default(),
            address: identity.address.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.min_chars("name", &self.name, 2, "Name must be at least 2 characters");
        errors.email("email", &self.email);
        errors.min_chars("phone", &self.phone, 10, "Please enter a valid phone number");
        errors.min_chars("address", &self.address, 5, "Address must be at least 5 characters");
        errors.min_chars("city", &self.city, 2, "City is required");
        errors.min_chars("state", &self.state, 2, "State is required");
        errors.min_chars("pincode", &self.pincode, 6, "Please enter a valid pincode");
    }

    fn to_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            pincode: self.pincode.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
        }
    }
}

/// Card form.
#[derive(Debug)]
pub struct CardDetails {
    pub number: SecretString,
    pub holder: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: SecretString,
}

impl CardDetails {
    fn validate(&self, errors: &mut ValidationErrors) {
        let number = self.number.expose_secret();
        errors.ensure(
            number.len() == 16 && number.bytes().all(|b| b.is_ascii_digit()),
            "cardNumber",
            "Card number must be 16 digits",
        );
        errors.ensure(
            !self.holder.trim().is_empty(),
            "cardName",
            "Cardholder name is required",
        );
        errors.ensure(
            EXPIRY_RE.is_match(&self.expiry),
            "expiryDate",
            "Expiry date must be in MM/YY format",
        );
        let cvv = self.cvv.expose_secret();
        errors.ensure(
            cvv.len() >= 3 && cvv.bytes().all(|b| b.is_ascii_digit()),
            "cvv",
            "CVV must be at least 3 digits",
        );
    }

    fn last4(&self) -> String {
        let number = self.number.expose_secret();
        number.chars().skip(number.len().saturating_sub(4)).collect()
    }
}

/// Checkout tunables.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    /// Upper bound on a gateway call.
    pub payment_timeout: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of trying to open the checkout page.
#[derive(Debug)]
pub enum CheckoutEntry {
    Ready(Checkout),
    /// The auth store is still loading.
    Wait,
    Redirect(Route),
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub confirmation: PaymentConfirmation,
    /// Where the shopper goes next.
    pub redirect: Route,
}

/// One checkout session of one identity.
#[derive(Debug)]
pub struct Checkout {
    identity: Identity,
    settings: CheckoutSettings,
    step: CheckoutStep,
    shipping: Option<ShippingDetails>,
    method: Option<PaymentMethod>,
    card: Option<CardDetails>,
    /// A charged order whose record has not been written yet.
    unrecorded: Option<(Order, PaymentConfirmation)>,
}

impl Checkout {
    /// Open checkout for the signed-in identity.
    ///
    /// Signed out redirects to login (returning to `/checkout`); an empty
    /// cart redirects to the cart page.
    #[must_use]
    pub fn begin(auth: &AuthStore, cart: &CartStore, settings: CheckoutSettings) -> CheckoutEntry {
        let state = auth.state();
        if state.is_loading {
            return CheckoutEntry::Wait;
        }
        let Some(identity) = state.identity else {
            return CheckoutEntry::Redirect(Route::login_returning_to("/checkout"));
        };
        if cart.is_empty() {
            return CheckoutEntry::Redirect(Route::Cart);
        }
        CheckoutEntry::Ready(Self {
            identity,
            settings,
            step: CheckoutStep::CollectingShippingAndMethod,
            shipping: None,
            method: None,
            card: None,
            unrecorded: None,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The identity checkout was opened for.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Totals of the cart as it is now.
    #[must_use]
    pub fn summary(&self, cart: &CartStore) -> OrderSummary {
        cart.totals()
    }

    /// Submit the shipping form and payment method.
    ///
    /// Card payments continue to the card form; UPI and cash on delivery
    /// are ready to submit.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` for invalid fields, or
    /// `CheckoutError::InvalidStep` outside the shipping step.
    pub fn submit_shipping(
        &mut self,
        shipping: ShippingDetails,
        method: PaymentMethod,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::CollectingShippingAndMethod, "submit shipping details")?;

        let mut errors = ValidationErrors::new();
        shipping.validate(&mut errors);
        if let PaymentMethod::Upi { upi_id } = &method {
            errors.ensure(
                !upi_id.trim().is_empty() && upi_id.contains('@'),
                "upiId",
                "Please enter a valid UPI ID",
            );
        }
        errors.into_result()?;

        self.step = match method {
            PaymentMethod::Card => CheckoutStep::CollectingCardDetails,
            PaymentMethod::Upi { .. } | PaymentMethod::Cod => CheckoutStep::Submitting,
        };
        self.shipping = Some(shipping);
        self.method = Some(method);
        self.card = None;
        Ok(self.step)
    }

    /// Leave the card form for the shipping form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` outside the card step.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::CollectingCardDetails, "go back")?;
        self.step = CheckoutStep::CollectingShippingAndMethod;
        Ok(self.step)
    }

    /// Submit the card form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` for invalid fields, or
    /// `CheckoutError::InvalidStep` outside the card step.
    pub fn submit_card(&mut self, card: CardDetails) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::CollectingCardDetails, "submit card details")?;

        let mut errors = ValidationErrors::new();
        card.validate(&mut errors);
        errors.into_result()?;

        self.card = Some(card);
        self.step = CheckoutStep::Submitting;
        Ok(self.step)
    }

    /// Charge the cart total through `gateway` and place the order.
    ///
    /// The paid order is written to `orders` first; only then is the cart
    /// cleared and the outcome redirects home. If the write fails, calling
    /// this again retries the write without charging again.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` if details are incomplete,
    /// `CheckoutError::EmptyCart` if the cart was emptied meanwhile,
    /// `CheckoutError::Payment` if the charge fails or times out (the step
    /// reverts), `CheckoutError::SessionChanged` if another identity
    /// signed in, or `CheckoutError::OrderNotRecorded` if the paid order
    /// could not be written (the cart is kept).
    #[instrument(skip_all, fields(identity = %self.identity.id))]
    pub async fn place_order<G, O>(
        &mut self,
        gateway: &G,
        cart: &CartStore,
        orders: &O,
    ) -> Result<CheckoutOutcome, CheckoutError>
    where
        G: PaymentGateway + ?Sized,
        O: OrderSink + ?Sized,
    {
        self.expect_step(CheckoutStep::Submitting, "place the order")?;
        let (order, confirmation) = match self.unrecorded.take() {
            Some(paid) => {
                tracing::info!(order = %paid.0.id, "retrying order record after earlier failure");
                paid
            }
            None => self.charge(gateway, cart).await?,
        };

        if cart.owner().as_ref() != Some(&self.identity.id) {
            tracing::warn!(order = %order.id, "identity changed during payment");
            return Err(CheckoutError::SessionChanged);
        }
        if let Err(source) = orders.record_order(&order) {
            tracing::error!(
                order = %order.id,
                payment = %confirmation.reference,
                error = %source,
                "payment taken but order could not be recorded"
            );
            let err = CheckoutError::OrderNotRecorded {
                order_id: order.id.clone(),
                reference: confirmation.reference.clone(),
                source,
            };
            self.unrecorded = Some((order, confirmation));
            return Err(err);
        }
        if !cart.clear_if_owned_by(&self.identity.id)? {
            tracing::warn!(order = %order.id, "identity changed before the cart was cleared");
        }

        self.step = CheckoutStep::Completed;
        tracing::info!(
            order = %order.id,
            total = %Price::inr(order.total),
            method = %order.payment_method,
            "order placed"
        );
        Ok(CheckoutOutcome {
            order,
            confirmation,
            redirect: Route::Home,
        })
    }

    /// Build the order from the cart and charge it.
    async fn charge<G: PaymentGateway + ?Sized>(
        &mut self,
        gateway: &G,
        cart: &CartStore,
    ) -> Result<(Order, PaymentConfirmation), CheckoutError> {
        let (Some(shipping), Some(method)) = (&self.shipping, &self.method) else {
            return Err(CheckoutError::InvalidStep {
                step: self.step,
                action: "place the order",
            });
        };

        if cart.owner().as_ref() != Some(&self.identity.id) {
            return Err(CheckoutError::SessionChanged);
        }
        let lines = cart.lines();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let summary = OrderSummary::from_lines(&lines);

        let request = PaymentRequest {
            order_id: next_order_id(),
            amount: summary.total,
            method: method.kind(),
            card_last4: self.card.as_ref().map(CardDetails::last4),
        };
        let order = Order {
            id: request.order_id.clone(),
            user_id: self.identity.id.clone(),
            items: lines.iter().map(OrderItem::from).collect(),
            subtotal: summary.subtotal,
            shipping: summary.shipping,
            total: summary.total,
            status: OrderStatus::Processing,
            placed_at: Utc::now(),
            shipping_address: shipping.to_address(),
            payment_method: request.method,
        };

        let charged =
            match tokio::time::timeout(self.settings.payment_timeout, gateway.charge(&request)).await {
                Ok(result) => result,
                Err(_) => Err(PaymentError::Timeout(self.settings.payment_timeout)),
            };
        let confirmation = match charged {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::error!(order = %request.order_id, error = %e, "payment failed");
                self.step = match method {
                    PaymentMethod::Card => CheckoutStep::CollectingCardDetails,
                    PaymentMethod::Upi { .. } | PaymentMethod::Cod => {
                        CheckoutStep::CollectingShippingAndMethod
                    }
                };
                return Err(e.into());
            }
        };
        Ok((order, confirmation))
    }

    fn expect_step(&self, step: CheckoutStep, action: &'static str) -> Result<(), CheckoutError> {
        if self.step == step {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep {
                step: self.step,
                action,
            })
        }
    }
}

fn next_order_id() -> OrderId {
    let short: String = Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(10)
        .collect();
    OrderId::new(format!("ORD-{short}"))
}
