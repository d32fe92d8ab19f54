//! Business logic services for admin.
//!
//! # Services
//!
//! - `announcements` - Scheduled site-wide announcements
//! - `orders` - Placed orders and their fulfilment status
//! - `products` - The catalog administrators add to and edit

pub mod announcements;
pub mod orders;
pub mod products;

pub use announcements::AnnouncementBoard;
pub use orders::{OrderBook, OrderQuery, StatusFilter};
pub use products::{ProductDraft, ProductShelf};
