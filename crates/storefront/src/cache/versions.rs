//! Generation counters for bulk cache invalidation.
//!
//! Each cache family has a monotonically increasing version stored in the
//! cache itself. List keys embed the version at write time, so bumping it
//! orphans every previously written key for that family without enumerating
//! them.

use std::time::Duration;

use super::{CacheError, CacheStore};

/// Version entries live effectively forever; the long TTL just keeps hosted
/// stores from treating them as garbage.
const VERSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Cache families with independent invalidation generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFamily {
    /// Product listing pages.
    Products,
    /// The featured-products set.
    Featured,
}

impl CacheFamily {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Featured => "featured",
        }
    }
}

fn version_key(family: CacheFamily) -> String {
    format!("cache:{}:version", family.as_str())
}

/// Read the current generation for `family`, defaulting to 1.
///
/// Store failures and non-numeric entries also read as 1: the read path must
/// stay usable when the store is unhealthy.
pub async fn cache_version(store: &dyn CacheStore, family: CacheFamily) -> u64 {
    let value = match store.get(&version_key(family)).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(family = family.as_str(), error = %e, "Failed to read cache version");
            return 1;
        }
    };

    value.and_then(|v| parse_version(&v)).unwrap_or(1)
}

/// Bump the generation for `family`, invalidating every key that embeds the
/// previous version. Safe to call repeatedly.
///
/// # Errors
///
/// Returns an error if the new version cannot be written to the store.
pub async fn bump_cache_version(
    store: &dyn CacheStore,
    family: CacheFamily,
) -> Result<u64, CacheError> {
    let next = cache_version(store, family).await + 1;
    store
        .set(
            &version_key(family),
            serde_json::Value::from(next),
            Some(VERSION_TTL),
        )
        .await?;
    Ok(next)
}

fn parse_version(value: &serde_json::Value) -> Option<u64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    (n > 0).then_some(n)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_version_defaults_to_one() {
        let store = MemoryStore::new(16);
        assert_eq!(cache_version(&store, CacheFamily::Products).await, 1);
    }

    #[tokio::test]
    async fn test_bump_increments() {
        let store = MemoryStore::new(16);
        assert_eq!(
            bump_cache_version(&store, CacheFamily::Products).await.unwrap(),
            2
        );
        assert_eq!(
            bump_cache_version(&store, CacheFamily::Products).await.unwrap(),
            3
        );
        assert_eq!(cache_version(&store, CacheFamily::Products).await, 3);
    }

    #[tokio::test]
    async fn test_families_are_independent() {
        let store = MemoryStore::new(16);
        bump_cache_version(&store, CacheFamily::Products).await.unwrap();
        assert_eq!(cache_version(&store, CacheFamily::Featured).await, 1);
    }

    #[tokio::test]
    async fn test_garbage_version_reads_as_one() {
        let store = MemoryStore::new(16);
        store
            .set("cache:products:version", json!("not-a-number"), None)
            .await
            .unwrap();
        assert_eq!(cache_version(&store, CacheFamily::Products).await, 1);
    }

    #[tokio::test]
    async fn test_string_version_is_accepted() {
        let store = MemoryStore::new(16);
        store
            .set("cache:products:version", json!("7"), None)
            .await
            .unwrap();
        assert_eq!(cache_version(&store, CacheFamily::Products).await, 7);
    }
}
