//! Cart pricing rules.
//!
//! Everything here is derived on demand from cart lines; nothing is cached.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CartLine, Price};

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(999, 0, 0, false, 0);

/// Flat shipping charge below the threshold.
pub const SHIPPING_CHARGE: Decimal = Decimal::from_parts(99, 0, 0, false, 0);

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Whether `quantity` is allowed on a cart line.
#[must_use]
pub const fn is_valid_line_quantity(quantity: u32) -> bool {
    quantity >= 1 && quantity <= MAX_LINE_QUANTITY
}

/// Sum of quantities across lines, saturating at `u32::MAX`.
#[must_use]
pub fn total_items(lines: &[CartLine]) -> u32 {
    let total: u64 = lines.iter().map(|line| u64::from(line.quantity)).sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Sum of `(sale price ?? price) * quantity` across lines.
#[must_use]
pub fn total_price(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Shipping for a subtotal. The threshold is inclusive.
#[must_use]
pub fn shipping_for(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        SHIPPING_CHARGE
    }
}

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Summarize a set of lines.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self::from_subtotal(total_items(lines), total_price(lines))
    }

    /// Summary for a known item count and subtotal.
    #[must_use]
    pub fn from_subtotal(item_count: u32, subtotal: Decimal) -> Self {
        let shipping = shipping_for(subtotal);
        Self {
            item_count,
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Whether the shipping charge was waived.
    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// The final total as a displayable price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::inr(self.total)
    }
}
