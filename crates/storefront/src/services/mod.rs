//! Storefront services.
//!
//! The two leaf components of the storefront: session management and cart
//! synchronization. Both take their provider clients by generic parameter
//! and publish state through `watch` channels for the view layer.

pub mod cart;
pub mod session;

pub use cart::{CartSummary, CartSynchronizer, SyncStatus};
pub use session::{Session, SessionManager};
