//! Cart synchronization.
//!
//! The cart lives in two places: a local line list that is always
//! authoritative for display, and a remote cart mirrored to the hosted
//! commerce API so checkout can be handed off. Every mutation applies
//! locally first, persists to device storage, and then pushes to the
//! remote cart. A remote failure never loses the local change; it is
//! reported as [`SyncStatus::LocalOnly`] with a notice the view can show.
//!
//! The remote cart is created lazily on the first add; its id is persisted
//! so the same server-side cart is reused across restarts. A stored id the
//! provider no longer recognizes is discarded silently.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use novabay_core::{CurrencyCode, ItemId, Price, RemoteCartId, VariantId};

use crate::providers::CommerceApi;
use crate::providers::commerce::{CartLineInput, CommerceError, RemoteCart};
use crate::storage::{LocalStore, keys};

/// Notice shown when a cart change could not be pushed to the provider.
const OFFLINE_NOTICE: &str =
    "We couldn't update your cart online. Your changes are saved on this device.";

/// Errors surfaced by cart operations.
///
/// Sync failures are deliberately not errors; they come back as
/// [`SyncStatus::LocalOnly`] so a flaky provider never blocks shopping.
#[derive(Debug, Error)]
pub enum CartError {
    /// Checkout was requested before any line reached the remote cart.
    #[error("cart has no remote counterpart yet")]
    NoRemoteCart,

    /// The remote cart exists but the provider has not issued a checkout
    /// URL for it.
    #[error("remote cart has no checkout URL")]
    MissingCheckoutUrl,

    /// The provider returned a checkout URL that does not parse.
    #[error("invalid checkout URL: {0}")]
    InvalidCheckoutUrl(#[from] url::ParseError),
}

// =============================================================================
// Cart Types
// =============================================================================

/// A cart line as the storefront displays and persists it.
///
/// Carries the display snapshot (name, price, image) captured when the
/// item was added, so the cart renders without product fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item the variant belongs to.
    pub item_id: ItemId,
    /// Purchasable variant, the merge key for duplicate adds.
    pub variant_id: VariantId,
    /// Item name at add time.
    pub name: String,
    /// Unit price at add time.
    pub unit_price: Price,
    /// Quantity, >= 1.
    pub quantity: u32,
    /// Thumbnail URL, if the item has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Variant label ("64GB / Black"), if the variant has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_label: Option<String>,
    /// Strike-through price, when the item is on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Price>,
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// The change reached the remote cart.
    Synced,
    /// The change is saved locally but the remote push failed.
    LocalOnly {
        /// User-facing notice for the view layer.
        notice: &'static str,
    },
}

/// Snapshot of the cart published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSummary {
    /// Current lines in add order.
    pub lines: Vec<LineItem>,
    /// Sum of unit price times quantity over all lines.
    pub subtotal: Price,
    /// Total unit count across lines (the badge number).
    pub item_count: u64,
}

// =============================================================================
// CartSynchronizer
// =============================================================================

/// Keeps the local cart, device storage, and the remote cart in step.
///
/// Mutations take `&mut self`, so overlapping cart changes are serialized
/// by construction; each remote push settles before the next begins.
pub struct CartSynchronizer<C: CommerceApi, S: LocalStore> {
    commerce: C,
    store: S,
    lines: Vec<LineItem>,
    remote: Option<RemoteCart>,
    summary: watch::Sender<CartSummary>,
}

impl<C: CommerceApi, S: LocalStore> CartSynchronizer<C, S> {
    /// Restore the cart from device storage and revalidate any stored
    /// remote cart id.
    ///
    /// A stored id the provider no longer recognizes (or cannot be reached
    /// for) is discarded; the cart continues local-only and a fresh remote
    /// cart is created on the next add.
    #[instrument(skip(commerce, store))]
    pub async fn init(commerce: C, mut store: S) -> Self {
        let lines = match store.get(keys::CART_LINES) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable stored cart lines: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let remote = match store.get(keys::CART_REMOTE_ID) {
            Some(id) => {
                let cart_id = RemoteCartId::new(id);
                match commerce.get_cart(&cart_id).await {
                    Ok(cart) => Some(cart),
                    Err(e) => {
                        tracing::warn!(cart_id = %cart_id, "Discarding stored cart id: {e}");
                        store.remove(keys::CART_REMOTE_ID);
                        None
                    }
                }
            }
            None => None,
        };

        let (summary, _) = watch::channel(CartSummary::default());
        let mut cart = Self {
            commerce,
            store,
            lines,
            remote,
            summary,
        };
        cart.publish();
        cart
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current lines in add order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Sum of unit price times quantity over all lines.
    ///
    /// An empty cart totals zero in the default currency.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let currency = self
            .lines
            .first()
            .map_or(CurrencyCode::USD, |l| l.unit_price.currency_code);
        self.lines
            .iter()
            .fold(Price::zero(currency), |acc, l| acc + l.unit_price * l.quantity)
    }

    /// Total unit count across lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Current snapshot.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.summary.borrow().clone()
    }

    /// Subscribe to cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.summary.subscribe()
    }

    /// The web checkout URL for the remote cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoRemoteCart` if no line has reached the
    /// provider yet, or `CartError::MissingCheckoutUrl` if the provider
    /// has not issued one.
    pub fn checkout_url(&self) -> Result<url::Url, CartError> {
        let remote = self.remote.as_ref().ok_or(CartError::NoRemoteCart)?;
        let raw = remote
            .checkout_url
            .as_deref()
            .ok_or(CartError::MissingCheckoutUrl)?;
        Ok(url::Url::parse(raw)?)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item to the cart.
    ///
    /// A variant already in the cart has its quantity increased instead of
    /// gaining a second row. Creates the remote cart on first use.
    #[instrument(skip(self, item), fields(variant_id = %item.variant_id, quantity = item.quantity))]
    pub async fn add(&mut self, item: LineItem) -> SyncStatus {
        let input = CartLineInput {
            variant_id: item.variant_id.clone(),
            quantity: item.quantity,
        };

        match self.lines.iter_mut().find(|l| l.variant_id == item.variant_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.lines.push(item),
        }
        self.persist_lines();
        self.publish();

        let result = match &self.remote {
            Some(remote) => self.commerce.add_lines(&remote.id, vec![input]).await,
            None => self.commerce.create_cart(vec![input]).await,
        };
        self.absorb(result, "add")
    }

    /// Remove a variant's line entirely.
    ///
    /// Removing a variant that is not in the cart is a no-op.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn remove(&mut self, variant_id: &VariantId) -> SyncStatus {
        let before = self.lines.len();
        self.lines.retain(|l| &l.variant_id != variant_id);
        if self.lines.len() == before {
            return SyncStatus::Synced;
        }
        self.persist_lines();
        self.publish();

        let Some((cart_id, line_id)) = self.remote.as_ref().and_then(|r| {
            r.line_for_variant(variant_id)
                .map(|l| (r.id.clone(), l.id.clone()))
        }) else {
            // Nothing mirrored remotely for this variant
            return SyncStatus::Synced;
        };

        let result = self.commerce.remove_line(&cart_id, &line_id).await;
        self.absorb(result, "remove")
    }

    /// Set the quantity on a variant's line.
    ///
    /// A quantity of zero or less removes the line. Setting quantity on a
    /// variant that is not in the cart is a no-op.
    #[instrument(skip(self), fields(variant_id = %variant_id, quantity))]
    pub async fn update_quantity(&mut self, variant_id: &VariantId, quantity: i64) -> SyncStatus {
        if quantity <= 0 {
            return self.remove(variant_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(line) = self.lines.iter_mut().find(|l| &l.variant_id == variant_id) else {
            return SyncStatus::Synced;
        };
        line.quantity = quantity;
        self.persist_lines();
        self.publish();

        let Some((cart_id, line_id)) = self.remote.as_ref().and_then(|r| {
            r.line_for_variant(variant_id)
                .map(|l| (r.id.clone(), l.id.clone()))
        }) else {
            return SyncStatus::Synced;
        };

        let result = self.commerce.update_line(&cart_id, &line_id, quantity).await;
        self.absorb(result, "update quantity")
    }

    /// Empty the cart and forget the remote cart.
    ///
    /// Purely local: the abandoned remote cart is left to expire
    /// server-side, and the next add starts a fresh one.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.lines.clear();
        self.remote = None;
        self.store.remove(keys::CART_LINES);
        self.store.remove(keys::CART_REMOTE_ID);
        self.publish();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Fold a remote push result into sync state.
    ///
    /// Success refreshes the remote mirror and persists its id; failure is
    /// logged and reported as a local-only change.
    fn absorb(&mut self, result: Result<RemoteCart, CommerceError>, action: &str) -> SyncStatus {
        match result {
            Ok(cart) => {
                self.store.put(keys::CART_REMOTE_ID, cart.id.as_str());
                self.remote = Some(cart);
                SyncStatus::Synced
            }
            Err(e) => {
                tracing::warn!("Cart {action} not synced to provider: {e}");
                SyncStatus::LocalOnly {
                    notice: OFFLINE_NOTICE,
                }
            }
        }
    }

    fn persist_lines(&mut self) {
        match serde_json::to_string(&self.lines) {
            Ok(raw) => self.store.put(keys::CART_LINES, &raw),
            Err(e) => tracing::warn!("Failed to serialize cart lines: {e}"),
        }
    }

    fn publish(&mut self) {
        self.summary.send_replace(CartSummary {
            lines: self.lines.clone(),
            subtotal: self.subtotal(),
            item_count: self.item_count(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use novabay_core::RemoteLineId;
    use rust_decimal::Decimal;

    use super::*;
    use crate::providers::commerce::RemoteCartLine;
    use crate::storage::MemoryStore;

    /// In-memory commerce fake holding at most one cart.
    #[derive(Default)]
    struct FakeCommerce {
        cart: Rc<RefCell<Option<RemoteCart>>>,
        fail_get: Cell<bool>,
        fail_mutations: Cell<bool>,
        next_line: Cell<u32>,
    }

    impl FakeCommerce {
        fn unavailable() -> CommerceError {
            CommerceError::Api {
                status: 503,
                message: "service unavailable".to_owned(),
            }
        }

        fn recompute(cart: &mut RemoteCart) {
            let amount = cart.lines.iter().fold(Decimal::ZERO, |acc, l| {
                acc + l.unit_price.amount * Decimal::from(l.quantity)
            });
            cart.subtotal = Price::new(amount, CurrencyCode::USD);
        }

        fn push_lines(&self, cart: &mut RemoteCart, lines: Vec<CartLineInput>) {
            for input in lines {
                if let Some(line) = cart
                    .lines
                    .iter_mut()
                    .find(|l| l.variant_id == input.variant_id)
                {
                    line.quantity += input.quantity;
                } else {
                    let n = self.next_line.get() + 1;
                    self.next_line.set(n);
                    cart.lines.push(RemoteCartLine {
                        id: RemoteLineId::new(format!("line_{n}")),
                        variant_id: input.variant_id,
                        quantity: input.quantity,
                        unit_price: Price::from_minor_units(999, CurrencyCode::USD),
                    });
                }
            }
            Self::recompute(cart);
        }
    }

    impl CommerceApi for FakeCommerce {
        async fn create_cart(
            &self,
            lines: Vec<CartLineInput>,
        ) -> Result<RemoteCart, CommerceError> {
            if self.fail_mutations.get() {
                return Err(Self::unavailable());
            }
            let mut cart = RemoteCart {
                id: RemoteCartId::new("cart_1"),
                checkout_url: Some("https://checkout.test/cart_1".to_owned()),
                lines: Vec::new(),
                subtotal: Price::zero(CurrencyCode::USD),
            };
            self.push_lines(&mut cart, lines);
            *self.cart.borrow_mut() = Some(cart.clone());
            Ok(cart)
        }

        async fn get_cart(&self, cart_id: &RemoteCartId) -> Result<RemoteCart, CommerceError> {
            if self.fail_get.get() {
                return Err(Self::unavailable());
            }
            self.cart
                .borrow()
                .clone()
                .filter(|c| &c.id == cart_id)
                .ok_or_else(|| CommerceError::NotFound(cart_id.to_string()))
        }

        async fn add_lines(
            &self,
            cart_id: &RemoteCartId,
            lines: Vec<CartLineInput>,
        ) -> Result<RemoteCart, CommerceError> {
            if self.fail_mutations.get() {
                return Err(Self::unavailable());
            }
            let mut slot = self.cart.borrow_mut();
            let cart = slot
                .as_mut()
                .filter(|c| &c.id == cart_id)
                .ok_or_else(|| CommerceError::NotFound(cart_id.to_string()))?;
            self.push_lines(cart, lines);
            Ok(cart.clone())
        }

        async fn update_line(
            &self,
            cart_id: &RemoteCartId,
            line_id: &RemoteLineId,
            quantity: u32,
        ) -> Result<RemoteCart, CommerceError> {
            if self.fail_mutations.get() {
                return Err(Self::unavailable());
            }
            let mut slot = self.cart.borrow_mut();
            let cart = slot
                .as_mut()
                .filter(|c| &c.id == cart_id)
                .ok_or_else(|| CommerceError::NotFound(cart_id.to_string()))?;
            let line = cart
                .lines
                .iter_mut()
                .find(|l| &l.id == line_id)
                .ok_or_else(|| CommerceError::NotFound(line_id.to_string()))?;
            line.quantity = quantity;
            Self::recompute(cart);
            Ok(cart.clone())
        }

        async fn remove_line(
            &self,
            cart_id: &RemoteCartId,
            line_id: &RemoteLineId,
        ) -> Result<RemoteCart, CommerceError> {
            if self.fail_mutations.get() {
                return Err(Self::unavailable());
            }
            let mut slot = self.cart.borrow_mut();
            let cart = slot
                .as_mut()
                .filter(|c| &c.id == cart_id)
                .ok_or_else(|| CommerceError::NotFound(cart_id.to_string()))?;
            cart.lines.retain(|l| &l.id != line_id);
            Self::recompute(cart);
            Ok(cart.clone())
        }
    }

    /// Store handle that can outlive one synchronizer, for restart tests.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl LocalStore for SharedStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key)
        }

        fn put(&mut self, key: &str, value: &str) {
            self.0.borrow_mut().put(key, value);
        }

        fn remove(&mut self, key: &str) {
            self.0.borrow_mut().remove(key);
        }
    }

    fn line(variant: &str, quantity: u32, minor_units: i64) -> LineItem {
        LineItem {
            item_id: ItemId::new(format!("item_{variant}")),
            variant_id: VariantId::new(variant),
            name: format!("Item {variant}"),
            unit_price: Price::from_minor_units(minor_units, CurrencyCode::USD),
            quantity,
            image: None,
            variant_label: None,
            compare_at_price: None,
        }
    }

    async fn fresh_cart() -> CartSynchronizer<FakeCommerce, SharedStore> {
        CartSynchronizer::init(FakeCommerce::default(), SharedStore::default()).await
    }

    #[tokio::test]
    async fn test_duplicate_add_merges_by_variant() {
        let mut cart = fresh_cart().await;

        assert_eq!(cart.add(line("var_a", 2, 999)).await, SyncStatus::Synced);
        assert_eq!(cart.add(line("var_a", 3, 999)).await, SyncStatus::Synced);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.item_count(), 5);
        // The remote mirror merged the same way
        let remote = cart.remote.as_ref().unwrap();
        assert_eq!(remote.lines.len(), 1);
        assert_eq!(remote.lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_subtotal_tracks_mutations() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 2, 999)).await;
        cart.add(line("var_b", 1, 2500)).await;

        assert_eq!(
            cart.subtotal(),
            Price::from_minor_units(2 * 999 + 2500, CurrencyCode::USD)
        );

        cart.update_quantity(&VariantId::new("var_a"), 1).await;
        assert_eq!(
            cart.subtotal(),
            Price::from_minor_units(999 + 2500, CurrencyCode::USD)
        );

        cart.remove(&VariantId::new("var_b")).await;
        assert_eq!(cart.subtotal(), Price::from_minor_units(999, CurrencyCode::USD));
    }

    #[tokio::test]
    async fn test_remove_deletes_the_remote_line() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 2, 999)).await;
        cart.add(line("var_b", 1, 500)).await;

        let status = cart.remove(&VariantId::new("var_a")).await;

        assert_eq!(status, SyncStatus::Synced);
        let remote = cart.remote.as_ref().unwrap();
        assert!(remote.line_for_variant(&VariantId::new("var_a")).is_none());
        assert!(remote.line_for_variant(&VariantId::new("var_b")).is_some());
        assert_eq!(remote.subtotal, Price::from_minor_units(500, CurrencyCode::USD));
    }

    #[tokio::test]
    async fn test_update_quantity_pushes_to_the_remote_line() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 2, 999)).await;

        let status = cart.update_quantity(&VariantId::new("var_a"), 5).await;

        assert_eq!(status, SyncStatus::Synced);
        let remote = cart.remote.as_ref().unwrap();
        let remote_line = remote.line_for_variant(&VariantId::new("var_a")).unwrap();
        assert_eq!(remote_line.quantity, 5);
        assert_eq!(
            remote.subtotal,
            Price::from_minor_units(5 * 999, CurrencyCode::USD)
        );
    }

    #[tokio::test]
    async fn test_zero_and_negative_quantity_remove_the_line() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 2, 999)).await;
        cart.add(line("var_b", 1, 500)).await;

        cart.update_quantity(&VariantId::new("var_a"), 0).await;
        assert!(cart.lines().iter().all(|l| l.variant_id.as_str() != "var_a"));

        cart.update_quantity(&VariantId::new("var_b"), -1).await;
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_on_absent_variant_is_a_noop() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 1, 999)).await;

        let status = cart.update_quantity(&VariantId::new("var_x"), 3).await;
        assert_eq!(status, SyncStatus::Synced);
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_change() {
        let commerce = FakeCommerce::default();
        commerce.fail_mutations.set(true);
        let mut cart = CartSynchronizer::init(commerce, SharedStore::default()).await;

        let status = cart.add(line("var_a", 2, 999)).await;
        assert_eq!(
            status,
            SyncStatus::LocalOnly {
                notice: OFFLINE_NOTICE
            }
        );
        assert_eq!(cart.item_count(), 2);
        assert!(cart.remote.is_none());

        // Provider recovers; the next add creates the remote cart
        cart.commerce.fail_mutations.set(false);
        assert_eq!(cart.add(line("var_b", 1, 500)).await, SyncStatus::Synced);
        assert!(cart.remote.is_some());
    }

    #[tokio::test]
    async fn test_lines_persist_across_restart() {
        let store = SharedStore::default();
        let commerce = FakeCommerce::default();
        let shared = Rc::clone(&commerce.cart);

        let mut cart = CartSynchronizer::init(commerce, store.clone()).await;
        cart.add(line("var_a", 2, 999)).await;

        let reopened = CartSynchronizer::init(
            FakeCommerce {
                cart: shared,
                ..FakeCommerce::default()
            },
            store,
        )
        .await;

        assert_eq!(reopened.lines().len(), 1);
        assert_eq!(reopened.lines()[0].quantity, 2);
        // The stored remote id was revalidated on init
        assert!(reopened.remote.is_some());
    }

    #[tokio::test]
    async fn test_stale_remote_id_discarded_silently() {
        let store = SharedStore::default();
        store.0.borrow_mut().put(keys::CART_REMOTE_ID, "cart_gone");
        store
            .0
            .borrow_mut()
            .put(keys::CART_LINES, &serde_json::to_string(&[line("var_a", 1, 999)]).unwrap());

        let mut cart = CartSynchronizer::init(FakeCommerce::default(), store.clone()).await;

        // Local lines survive; the dead id is gone from storage
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.remote.is_none());
        assert!(store.get(keys::CART_REMOTE_ID).is_none());

        // The next add starts a fresh remote cart
        cart.add(line("var_b", 1, 500)).await;
        assert_eq!(store.get(keys::CART_REMOTE_ID).as_deref(), Some("cart_1"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_on_init_keeps_local_cart() {
        let store = SharedStore::default();
        store.0.borrow_mut().put(keys::CART_REMOTE_ID, "cart_1");
        let commerce = FakeCommerce::default();
        commerce.fail_get.set(true);

        let cart = CartSynchronizer::init(commerce, store).await;
        assert!(cart.remote.is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_cart_and_storage() {
        let store = SharedStore::default();
        let mut cart = CartSynchronizer::init(FakeCommerce::default(), store.clone()).await;
        cart.add(line("var_a", 2, 999)).await;

        cart.clear();

        assert!(cart.lines().is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(store.get(keys::CART_LINES).is_none());
        assert!(store.get(keys::CART_REMOTE_ID).is_none());

        let reopened = CartSynchronizer::init(FakeCommerce::default(), store).await;
        assert!(reopened.lines().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_url_lifecycle() {
        let mut cart = fresh_cart().await;
        assert!(matches!(cart.checkout_url(), Err(CartError::NoRemoteCart)));

        cart.add(line("var_a", 1, 999)).await;
        assert_eq!(
            cart.checkout_url().unwrap().as_str(),
            "https://checkout.test/cart_1"
        );
    }

    #[tokio::test]
    async fn test_checkout_url_missing_from_provider() {
        let mut cart = fresh_cart().await;
        cart.add(line("var_a", 1, 999)).await;
        if let Some(remote) = cart.remote.as_mut() {
            remote.checkout_url = None;
        }
        assert!(matches!(
            cart.checkout_url(),
            Err(CartError::MissingCheckoutUrl)
        ));
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let mut cart = fresh_cart().await;
        let rx = cart.subscribe();
        assert_eq!(rx.borrow().item_count, 0);

        cart.add(line("var_a", 3, 999)).await;
        assert_eq!(rx.borrow().item_count, 3);
        assert_eq!(rx.borrow().subtotal, Price::from_minor_units(2997, CurrencyCode::USD));
    }
}
