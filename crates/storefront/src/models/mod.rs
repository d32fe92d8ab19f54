//! Domain models for storefront.
//!
//! Session-scoped state published by the stores, and the views the storefront
//! navigates between.

pub mod session;

pub use session::{AuthState, Route};
