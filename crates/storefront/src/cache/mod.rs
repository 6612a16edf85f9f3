//! Catalog cache backing stores.
//!
//! [`CacheStore`] is the seam between the catalog layer and the key-value
//! store that holds cached query results: atomic per-key get, set with
//! optional expiry, and delete. Two backends exist:
//!
//! - [`RedisRestStore`] talks to an Upstash-style Redis REST endpoint
//! - [`MemoryStore`] keeps entries in-process via `moka` (also used in tests)
//!
//! All keys are namespaced with the `wa:` prefix at this layer so the store
//! can be shared with other services.

mod memory;
mod redis_rest;
pub mod versions;

pub use memory::MemoryStore;
pub use redis_rest::RedisRestStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Namespace prefix applied to every key.
const KEY_PREFIX: &str = "wa:";

pub(crate) fn prefixed(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// Errors from the cache backing store.
///
/// The catalog read path swallows these (a broken cache must never break a
/// read); the webhook invalidation path surfaces them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// HTTP request to the store failed.
    #[error("cache transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store responded with a non-success status.
    #[error("cache store returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Stored payload could not be (de)serialized.
    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Key-value store with atomic per-key operations and optional expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value stored under `key`, if any non-expired entry exists.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl` when given.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    /// Remove the entry stored under `key`, if present.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
