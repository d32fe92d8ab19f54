//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Who is signed in, and account management
//! - `cart` - The signed-in identity's cart
//! - `catalog` - Products on sale
//! - `checkout` - Shipping, payment and order placement
//! - `validation` - Per-field form errors

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod validation;
