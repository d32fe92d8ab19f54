//! StyleAura Admin library.
//!
//! Back-office state shared by every front-end: the order book customers'
//! checkouts feed into, the product list the storefront sells from, and the
//! announcement board shown across the site.
//!
//! # Security
//!
//! Every mutating or listing operation takes a [`middleware::RequireAdmin`]
//! proof, obtained from a signed-in administrator identity. Reads a customer
//! is entitled to (their own order history, the visible announcements) need
//! no proof.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod db;
pub mod error;
pub mod middleware;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
