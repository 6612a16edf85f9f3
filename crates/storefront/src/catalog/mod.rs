//! Catalog reads with a cache-or-fetch contract.
//!
//! Listing and featured results are cached under generation-versioned keys
//! (bulk-invalidated by bumping the family's generation); per-handle point
//! lookups use direct key deletion instead. Empty upstream results are never
//! cached so a transient upstream hiccup cannot suppress real content for a
//! full TTL, and cache-store failures never fail a read.

mod key;

pub use key::{
    DEFAULT_PAGE_SIZE, PageSpec, ProductFilter, SortOrder, featured_key, product_handle_key,
    product_list_key,
};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::cache::versions::{CacheFamily, bump_cache_version, cache_version};
use crate::cache::{CacheError, CacheStore};
use crate::shopify::types::{Product, ProductPage, ProductsVariables};
use crate::shopify::{ShopifyError, StorefrontApi};

const LIST_TTL: Duration = Duration::from_secs(5 * 60);
// Point lookups expire faster than lists: a generation bump never touches
// their keys, so TTL is their only passive invalidation.
const HANDLE_TTL: Duration = Duration::from_secs(60);
const FEATURED_TTL: Duration = Duration::from_secs(60 * 60);

/// Cached catalog reads over the Storefront API.
pub struct CatalogService {
    api: Arc<dyn StorefrontApi>,
    store: Arc<dyn CacheStore>,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>, store: Arc<dyn CacheStore>) -> Self {
        Self { api, store }
    }

    /// Get one page of the product listing.
    ///
    /// Served from cache when a non-expired entry exists for the exact
    /// (filter, page, sort, generation) tuple; otherwise fetched upstream and
    /// stored unless the page came back empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream fetch fails; cache failures are
    /// logged and absorbed.
    #[instrument(skip(self))]
    pub async fn product_list(
        &self,
        filter: &ProductFilter,
        page: &PageSpec,
        sort: SortOrder,
    ) -> Result<ProductPage, ShopifyError> {
        let generation = cache_version(self.store.as_ref(), CacheFamily::Products).await;
        let cache_key = product_list_key(generation, filter, page, sort);

        if let Some(cached) = self.cached::<ProductPage>(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(cached);
        }

        let (first, after, last, before) = match page {
            PageSpec::Forward { first, after } => (Some(*first), after.clone(), None, None),
            PageSpec::Backward { last, before } => (None, None, Some(*last), before.clone()),
        };
        let (sort_key, reverse) = sort.to_upstream();

        let result = self
            .api
            .get_products(ProductsVariables {
                first,
                after,
                last,
                before,
                query: filter.to_query(),
                sort_key,
                reverse,
            })
            .await?;

        if !result.nodes.is_empty() {
            self.store_result(&cache_key, &result, LIST_TTL).await;
        }

        Ok(result)
    }

    /// Get a single product by handle; `None` when unknown upstream.
    ///
    /// Cached per handle under its own short TTL; "not found" is never
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream fetch fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        let cache_key = product_handle_key(handle);

        if let Some(cached) = self.cached::<Product>(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(cached));
        }

        let Some(product) = self.api.get_product_by_handle(handle).await? else {
            return Ok(None);
        };

        self.store_result(&cache_key, &product, HANDLE_TTL).await;
        Ok(Some(product))
    }

    /// Get the featured-products set.
    ///
    /// Backed by the fixed `tag:featured` upstream query. An empty set is
    /// indistinguishable from an upstream hiccup, so it is returned but never
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream fetch fails.
    #[instrument(skip(self))]
    pub async fn featured(&self, count: i64) -> Result<Vec<Product>, ShopifyError> {
        let generation = cache_version(self.store.as_ref(), CacheFamily::Featured).await;
        let cache_key = featured_key(generation, count);

        if let Some(cached) = self.cached::<Vec<Product>>(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(cached);
        }

        let result = self
            .api
            .get_products(ProductsVariables {
                first: Some(count),
                query: Some("tag:featured".to_string()),
                ..ProductsVariables::default()
            })
            .await?;

        if !result.nodes.is_empty() {
            self.store_result(&cache_key, &result.nodes, FEATURED_TTL).await;
        }

        Ok(result.nodes)
    }

    /// Bump the generation for `family`, orphaning all of its cached keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the new generation cannot be written.
    pub async fn invalidate(&self, family: CacheFamily) -> Result<u64, CacheError> {
        let version = bump_cache_version(self.store.as_ref(), family).await?;
        tracing::info!(family = family.as_str(), version, "Catalog cache invalidated");
        Ok(version)
    }

    /// Delete the point-lookup entry for `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn invalidate_handle(&self, handle: &str) -> Result<(), CacheError> {
        self.store.delete(&product_handle_key(handle)).await
    }

    /// Read and decode a cache entry; any failure reads as a miss.
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, fetching upstream");
                None
            }
        }
    }

    /// Store a fetched result; failures are logged, never surfaced.
    async fn store_result<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(json) => {
                if let Err(e) = self.store.set(key, json, Some(ttl)).await {
                    warn!(key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize cache entry"),
        }
    }
}
