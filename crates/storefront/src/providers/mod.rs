//! Hosted provider clients.
//!
//! # Architecture
//!
//! - The hosted services are the source of truth - NO local sync beyond the
//!   cart's optimistic mirror, direct API calls everywhere
//! - Clients are explicit objects constructed once at process start and
//!   injected into the services; there are no global provider handles
//! - [`IdentityApi`] and [`CommerceApi`] are the seams the services consume,
//!   so tests can run against in-memory fakes
//!
//! # APIs
//!
//! ## Identity platform
//! - Credential sign-in/sign-up, external id-token exchange, password reset
//! - Per-user profile documents with server-set modification timestamps
//!
//! ## Commerce-cart API
//! - Cart create/fetch, line add/update/remove
//! - Cart id and checkout URL are opaque strings persisted client-side

pub mod commerce;
pub mod identity;

pub use commerce::CommerceClient;
pub use identity::IdentityClient;

use novabay_core::{Email, RemoteCartId, RemoteLineId, UserId};

use commerce::{CartLineInput, CommerceError, RemoteCart};
use identity::{AuthUser, ExternalProvider, IdentityError, Profile, ProfilePatch};

/// Operations the session manager needs from the identity platform.
///
/// `Send` bounds are not asserted: the whole storefront runs on a
/// single-threaded cooperative model (UI-triggered sequential calls).
#[allow(async_fn_in_trait)]
pub trait IdentityApi {
    /// Authenticate an existing account with email and password.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthUser, IdentityError>;

    /// Register a new account with email and password.
    async fn sign_up_with_password(
        &self,
        email: &Email,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, IdentityError>;

    /// Exchange an external provider's id token for a session
    /// (the popup flow's server half).
    async fn sign_in_with_id_token(
        &self,
        provider: ExternalProvider,
        id_token: &str,
    ) -> Result<AuthUser, IdentityError>;

    /// Ask the provider to email a password-reset link.
    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError>;

    /// Revoke a refresh token on sign-out.
    async fn revoke(&self, refresh_token: &str) -> Result<(), IdentityError>;

    /// Fetch the profile document for a user, `None` if absent.
    async fn get_profile(&self, uid: &UserId) -> Result<Option<Profile>, IdentityError>;

    /// Shallow merge-write into the profile document, creating it if
    /// absent. The server stamps the modification timestamp.
    async fn merge_profile(
        &self,
        uid: &UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, IdentityError>;
}

/// Operations the cart synchronizer needs from the commerce-cart API.
#[allow(async_fn_in_trait)]
pub trait CommerceApi {
    /// Create a new remote cart, optionally seeded with lines.
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<RemoteCart, CommerceError>;

    /// Fetch an existing cart. `CommerceError::NotFound` is the stale-id
    /// signal: the caller discards the stored id and starts over.
    async fn get_cart(&self, cart_id: &RemoteCartId) -> Result<RemoteCart, CommerceError>;

    /// Add lines to a cart.
    async fn add_lines(
        &self,
        cart_id: &RemoteCartId,
        lines: Vec<CartLineInput>,
    ) -> Result<RemoteCart, CommerceError>;

    /// Set the quantity on an existing line.
    async fn update_line(
        &self,
        cart_id: &RemoteCartId,
        line_id: &RemoteLineId,
        quantity: u32,
    ) -> Result<RemoteCart, CommerceError>;

    /// Remove a line from a cart.
    async fn remove_line(
        &self,
        cart_id: &RemoteCartId,
        line_id: &RemoteLineId,
    ) -> Result<RemoteCart, CommerceError>;
}
