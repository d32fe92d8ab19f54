//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::middleware::RequireAdmin;
use styleaura_core::{
    Email, Identity, IdentityId, Order, OrderId, OrderItem, OrderStatus, PaymentMethodKind,
    ProductId, Role, ShippingAddress,
};

pub(crate) fn admin() -> Identity {
    Identity {
        id: IdentityId::new("admin-1"),
        name: "Admin User".to_string(),
        email: Email::parse("admin@styleaura.com").unwrap(),
        role: Role::Admin,
        phone: Some("9876543210".to_string()),
        address: Some("StyleAura Office, Mumbai".to_string()),
    }
}

/// An admin proof for `admin()`.
pub(crate) fn admin_guard() -> RequireAdmin {
    RequireAdmin::check(Some(&admin())).unwrap()
}

pub(crate) fn customer(id: &str) -> Identity {
    Identity {
        id: IdentityId::new(id),
        name: format!("Customer {id}"),
        email: Email::parse(&format!("{id}@example.com")).unwrap(),
        role: Role::User,
        phone: None,
        address: None,
    }
}

/// 1 May 2025 plus `day` days, at noon UTC.
pub(crate) fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1 + day, 12, 0, 0).unwrap()
}

/// A one-item processing order for 1500 rupees.
pub(crate) fn order(id: &str, user: &str, ship_to: &str, placed_at: DateTime<Utc>) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: IdentityId::new(user),
        items: vec![OrderItem {
            product_id: ProductId::new("lehenga-1"),
            name: "Bridal Lehenga".to_string(),
            selected_size: Some("M".to_string()),
            quantity: 1,
            unit_price: Decimal::new(1500, 0),
        }],
        subtotal: Decimal::new(1500, 0),
        shipping: Decimal::ZERO,
        total: Decimal::new(1500, 0),
        status: OrderStatus::Processing,
        placed_at,
        shipping_address: ShippingAddress {
            name: ship_to.to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
            phone: "9000000000".to_string(),
        },
        payment_method: PaymentMethodKind::Cod,
    }
}
