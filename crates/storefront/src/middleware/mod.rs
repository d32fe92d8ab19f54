//! Access control for storefront views.

pub mod auth;

pub use auth::{Access, AuthRejection, GuardDecision, RequireAuth, guard, settled};
