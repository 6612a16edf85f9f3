//! In-process cache store backed by `moka`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;

use super::{CacheError, CacheStore, prefixed};

#[derive(Clone)]
struct StoredEntry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`CacheStore`] for single-instance deployments and tests.
///
/// Per-entry expiry is carried inside the entry and checked on read; `moka`'s
/// capacity eviction bounds memory use.
pub struct MemoryStore {
    cache: Cache<String, StoredEntry>,
}

impl MemoryStore {
    /// Create a store holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let key = prefixed(key);
        match self.cache.get(&key).await {
            Some(entry) if entry.is_expired() => {
                self.cache.invalidate(&key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = StoredEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.cache.insert(prefixed(key), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(&prefixed(key)).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryStore::new(16);
        store.set("k", json!({"a": 1}), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new(16);
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = MemoryStore::new(16);
        store
            .set("k", json!(1), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let store = MemoryStore::new(16);
        store.set("k", json!(1), None).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
