//! Application state: provider clients constructed once.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::providers::identity::Language;
use crate::providers::{CommerceClient, IdentityClient};
use crate::services::cart::CartSynchronizer;
use crate::services::session::SessionManager;
use crate::storage::FileStore;

/// Shared handles for everything the storefront talks to.
///
/// Cheaply cloneable via `Arc`. Clients are built once here and handed to
/// the services; nothing else constructs a provider client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    identity: IdentityClient,
    commerce: CommerceClient,
}

impl AppState {
    /// Build both provider clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce HTTP client fails to build.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let identity = IdentityClient::new(&config.identity);
        let commerce = CommerceClient::new(&config.commerce).map_err(AppError::Commerce)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                commerce,
            }),
        })
    }

    /// Get a reference to the loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the identity platform client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the commerce-cart API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Configured language for user-facing messages.
    #[must_use]
    pub fn language(&self) -> Language {
        self.inner.config.language
    }

    /// Create a session manager backed by the identity client.
    #[must_use]
    pub fn session_manager(&self) -> SessionManager<IdentityClient> {
        SessionManager::new(self.inner.identity.clone(), self.language())
    }

    /// Open the on-device cart store and restore the cart from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub async fn open_cart(&self) -> Result<CartSynchronizer<CommerceClient, FileStore>, AppError> {
        let store = FileStore::open(&self.inner.config.storage_dir)?;
        Ok(CartSynchronizer::init(self.inner.commerce.clone(), store).await)
    }
}
