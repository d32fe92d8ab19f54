//! Command implementations.
//!
//! Every command opens a [`crate::shell::Shell`], performs one operation and
//! reports the result through `tracing`.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
