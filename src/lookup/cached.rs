//! LRU-cached lookup decorator.
//!
//! A state file with many instances of the same resource triggers one
//! lookup per instance. The cache keeps successful answers keyed by
//! (resource group, name). Failures are never cached and never retried.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{CanonicalRecord, ResourceLookup};

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for the lookup cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            enabled: true,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
}

type CacheKey = (String, String);

/// Lookup decorator that caches canonical records.
pub struct CachingLookup<L: ResourceLookup> {
    inner: L,
    cache: Option<Arc<RwLock<LruCache<CacheKey, CanonicalRecord>>>>,
    hits: AtomicU64,
}

impl<L: ResourceLookup> CachingLookup<L> {
    /// Wrap `inner` with a cache built from `config`.
    pub fn new(inner: L, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(FALLBACK_CAPACITY);
            Some(Arc::new(RwLock::new(LruCache::new(size))))
        } else {
            None
        };

        Self {
            inner,
            cache,
            hits: AtomicU64::new(0),
        }
    }

    /// The wrapped lookup.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
                hits: self.hits.load(Ordering::Relaxed),
            }
        })
    }

    /// Clear the cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

#[async_trait]
impl<L: ResourceLookup> ResourceLookup for CachingLookup<L> {
    type Error = L::Error;

    async fn get(&self, resource_group: &str, name: &str) -> Result<CanonicalRecord, Self::Error> {
        let key = (resource_group.to_string(), name.to_string());

        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.read().peek(&key).cloned());
        if let Some(record) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(resource_group, name, "canonical record served from cache");
            return Ok(record);
        }

        let record = self.inner.get(resource_group, name).await?;

        if let Some(cache) = &self.cache {
            cache.write().put(key, record.clone());
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;

    fn lookup() -> InMemoryLookup {
        InMemoryLookup::new().with_record("rg", "vmss", "/subs/1/vmss")
    }

    #[tokio::test]
    async fn test_second_lookup_is_a_cache_hit() {
        let cached = CachingLookup::new(lookup(), CacheConfig::default());

        assert_eq!(cached.get("rg", "vmss").await.unwrap().id, "/subs/1/vmss");
        assert_eq!(cached.get("rg", "vmss").await.unwrap().id, "/subs/1/vmss");

        assert_eq!(cached.inner().calls(), 1);
        let stats = cached.cache_stats().unwrap();
        assert_eq!(stats.len, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cached = CachingLookup::new(lookup(), CacheConfig::default());

        assert!(cached.get("rg", "missing").await.is_err());
        assert!(cached.get("rg", "missing").await.is_err());

        assert_eq!(cached.inner().calls(), 2);
        assert_eq!(cached.cache_stats().unwrap().len, 0);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let config = CacheConfig {
            max_entries: 100,
            enabled: false,
        };
        let cached = CachingLookup::new(lookup(), config);

        cached.get("rg", "vmss").await.unwrap();
        cached.get("rg", "vmss").await.unwrap();

        assert!(cached.cache_stats().is_none());
        assert_eq!(cached.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let config = CacheConfig {
            max_entries: 5,
            enabled: true,
        };
        let cached = CachingLookup::new(lookup(), config);
        cached.get("rg", "vmss").await.unwrap();
        assert_eq!(cached.cache_stats().unwrap().cap, 5);

        cached.clear_cache();
        cached.get("rg", "vmss").await.unwrap();
        assert_eq!(cached.inner().calls(), 2);
    }
}
