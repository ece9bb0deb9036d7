//! Composed hot memory tier + optional warm file tier (spec.md §4.5).

use std::time::Duration;

use async_trait::async_trait;

use super::{Cache, CacheResult, MemoryCache};

#[cfg(feature = "file-cache")]
use super::FileCache;

/// Hot in-memory tier backed by an optional warm persistent tier. Reads
/// check memory first, then fall through to the warm tier and promote a hit
/// back into memory. Writes go to both tiers. On construction, the warm
/// tier (if any) is used to hydrate memory; on [`Cache::dispose`], current
/// memory contents are persisted back to the warm tier.
pub struct TwoTierCache {
    memory: MemoryCache,
    #[cfg(feature = "file-cache")]
    warm: Option<FileCache>,
}

impl TwoTierCache {
    /// Memory-only: no warm tier configured.
    pub fn memory_only() -> Self {
        Self {
            memory: MemoryCache::new(),
            #[cfg(feature = "file-cache")]
            warm: None,
        }
    }

    /// Memory tier backed by a warm file tier rooted at `cache_location`.
    /// Hydrates memory from any fresh entries already on disk.
    #[cfg(feature = "file-cache")]
    pub async fn with_warm_tier(cache_location: impl Into<std::path::PathBuf>) -> Self {
        let warm = FileCache::new(cache_location);
        let memory = MemoryCache::new();
        for (key, value) in warm.load_all().await {
            let _ = memory.create_entry_raw(&key, value, None).await;
        }
        Self {
            memory,
            warm: Some(warm),
        }
    }
}

#[async_trait]
impl Cache for TwoTierCache {
    async fn try_get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(hit) = self.memory.try_get_raw(key).await? {
            return Ok(Some(hit));
        }

        #[cfg(feature = "file-cache")]
        if let Some(warm) = &self.warm {
            if let Some(hit) = warm.try_get_raw(key).await? {
                self.memory
                    .create_entry_raw(key, hit.clone(), None)
                    .await?;
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    async fn create_entry_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.memory.create_entry_raw(key, value.clone(), ttl).await?;

        #[cfg(feature = "file-cache")]
        if let Some(warm) = &self.warm {
            warm.create_entry_raw(key, value, ttl).await?;
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.memory.remove(key).await?;
        #[cfg(feature = "file-cache")]
        if let Some(warm) = &self.warm {
            warm.remove(key).await?;
        }
        Ok(())
    }

    async fn dispose(&self) {
        self.memory.dispose().await;
        #[cfg(feature = "file-cache")]
        if let Some(warm) = &self.warm {
            warm.dispose().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[tokio::test]
    async fn memory_only_roundtrip() {
        let cache = TwoTierCache::memory_only();
        cache.create_entry("k", &"v".to_string(), None).await.unwrap();
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, Some("v".to_string()));
    }

    #[cfg(feature = "file-cache")]
    #[tokio::test]
    async fn warm_tier_hydrates_memory_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        {
            let warm = FileCache::new(dir.path());
            warm.create_entry_raw("k", "persisted".to_string(), None)
                .await
                .unwrap();
        }
        let cache = TwoTierCache::with_warm_tier(dir.path()).await;
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, Some("persisted".to_string()));
    }

    #[cfg(feature = "file-cache")]
    #[tokio::test]
    async fn writes_go_to_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TwoTierCache::with_warm_tier(dir.path()).await;
        cache
            .create_entry("k", &"v".to_string(), None)
            .await
            .unwrap();
        let warm = FileCache::new(dir.path());
        let from_disk: Option<String> = warm.try_get("k").await.unwrap();
        assert_eq!(from_disk, Some("v".to_string()));
    }
}
