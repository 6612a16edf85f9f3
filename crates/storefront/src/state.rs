//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::{CacheStore, MemoryStore, RedisRestStore};
use crate::cart::CartWorkflow;
use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::content::{ContentClient, ContentError};
use crate::shopify::{ShopifyError, StorefrontApi, StorefrontGateway};

/// Capacity of the in-process fallback cache.
const MEMORY_CACHE_CAPACITY: u64 = 1_000;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build storefront client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("failed to build content client: {0}")]
    Content(#[from] ContentError),
    #[error("failed to build cache store: {0}")]
    Cache(#[from] crate::cache::CacheError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    cart: CartWorkflow,
    content: Option<ContentClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Wires the storefront gateway and cache store from configuration: the
    /// Redis REST store when configured, an in-process store otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api: Arc<dyn StorefrontApi> = Arc::new(StorefrontGateway::new(&config.shopify)?);

        let store: Arc<dyn CacheStore> = match &config.redis {
            Some(redis) => Arc::new(RedisRestStore::new(redis)?),
            None => {
                tracing::info!("No Redis REST store configured, using in-process cache");
                Arc::new(MemoryStore::new(MEMORY_CACHE_CAPACITY))
            }
        };

        let catalog = CatalogService::new(api.clone(), store.clone());
        let cart = CartWorkflow::new(api);
        let content = config
            .content
            .as_ref()
            .map(|c| ContentClient::new(c, store.clone()))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart,
                content,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cached catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the cart workflow.
    #[must_use]
    pub fn cart(&self) -> &CartWorkflow {
        &self.inner.cart
    }

    /// Get the content client, when content is configured.
    #[must_use]
    pub fn content(&self) -> Option<&ContentClient> {
        self.inner.content.as_ref()
    }
}
