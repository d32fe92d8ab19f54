//! Core types for StyleAura.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod announcement;
pub mod cart;
pub mod email;
pub mod id;
pub mod identity;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use announcement::{Announcement, AnnouncementDraft};
pub use cart::{CartLine, LineKey};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Identity, ProfileUpdate};
pub use order::{Order, OrderItem, ShippingAddress};
pub use price::{CurrencyCode, Price};
pub use product::{Product, ProductError};
pub use status::*;
