//! Access checks for admin operations.

pub mod auth;

pub use auth::RequireAdmin;
