//! StyleAura Storefront library.
//!
//! Session, cart and checkout state for the storefront, usable from any
//! front-end and testable without one.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
