//! StyleAura Core - Shared domain types library.
//!
//! This crate provides the types used across all StyleAura components:
//! - `storefront` - Identity, cart and checkout services
//! - `admin` - Order book and announcement board
//! - `cli` - Command-line shell over a file-backed store
//!
//! # Architecture
//!
//! The core crate contains only types, pure pricing rules and the storage
//! contract - no file I/O, no async runtime, no logging. The in-memory
//! [`storage::MemoryStore`] lives here so every crate can test against it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, products, identities, cart lines,
//!   orders and announcements
//! - [`pricing`] - Line totals, shipping and order summaries
//! - [`storage`] - The string-keyed, JSON-valued key/value store contract

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod storage;
pub mod types;

pub use types::*;
