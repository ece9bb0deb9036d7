//! Hot in-memory cache tier: a concurrent map with absolute per-entry TTL.
//!
//! Shaped after `cache::memory::MemoryCache` (concurrent map + TTL
//! bookkeeping), generalized from byte-oriented entries to plain strings,
//! since this crate always serializes through [`crate::serializer`] before
//! storing.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Cache, CacheResult, DEFAULT_FAULT_CACHE_TTL};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Thread-safe in-memory cache tier with absolute TTL per entry.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of entries currently stored, including not-yet-reaped expired
    /// ones. Exposed for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn try_get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                drop(self.entries.remove(key));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn create_entry_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let ttl = ttl.unwrap_or(DEFAULT_FAULT_CACHE_TTL);
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn dispose(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[tokio::test]
    async fn get_after_set_hits() {
        let cache = MemoryCache::new();
        cache.create_entry("k", &"v".to_string(), None).await.unwrap();
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_returns_none() {
        let cache = MemoryCache::new();
        cache
            .create_entry("k", &"v".to_string(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn remove_then_get_is_miss() {
        let cache = MemoryCache::new();
        cache.create_entry("k", &"v".to_string(), None).await.unwrap();
        cache.remove("k").await.unwrap();
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn dispose_clears_all_entries() {
        let cache = MemoryCache::new();
        cache.create_entry("k1", &"v".to_string(), None).await.unwrap();
        cache.create_entry("k2", &"v".to_string(), None).await.unwrap();
        cache.dispose().await;
        assert!(cache.is_empty());
    }
}
