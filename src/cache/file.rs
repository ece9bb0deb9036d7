//! Warm persistent cache tier: one sanitized file per key (spec.md §4.5, §6).
//!
//! Shaped after `cache::redis::RedisCache`'s serialize-on-write,
//! deserialize-on-read tier backed by a remote store, adapted here to a
//! local filesystem store. Both tiers use absolute expiration, so the
//! expiry timestamp is persisted alongside the value rather than relying
//! on file mtime.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Cache, CacheError, CacheResult, DEFAULT_FAULT_CACHE_TTL, sanitize_file_name};

/// On-disk envelope: the original key (for warm-load hydration, since
/// sanitization is lossy) and the absolute expiry.
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    expires_at_unix_millis: u64,
    value: String,
}

/// One file per key under `root`, named `sanitize(key) + ".cache"`.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.cache", sanitize_file_name(key)))
    }

    /// Read every `.cache` file under `root`, returning `(key, value)` pairs
    /// for entries that are neither missing, corrupt, nor expired. Used by
    /// [`super::TwoTierCache`] to hydrate its memory tier at startup.
    pub async fn load_all(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let Ok(mut dir) = tokio::fs::read_dir(&self.root).await else {
            return out;
        };
        let now = now_unix_millis();
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("cache") {
                continue;
            }
            let Ok(bytes) = tokio::fs::read(&path).await else {
                continue;
            };
            let Ok(decoded) = serde_json::from_slice::<FileEntry>(&bytes) else {
                continue;
            };
            if decoded.expires_at_unix_millis > now {
                out.push((decoded.key, decoded.value));
            }
        }
        out
    }
}

fn now_unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl Cache for FileCache {
    async fn try_get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None), // missing file -> miss, not an error
        };
        let entry: FileEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(_) => return Ok(None), // corrupt file -> miss, not an error
        };
        if entry.expires_at_unix_millis <= now_unix_millis() {
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn create_entry_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?;
        let ttl = ttl.unwrap_or(DEFAULT_FAULT_CACHE_TTL);
        let entry = FileEntry {
            key: key.to_string(),
            expires_at_unix_millis: now_unix_millis() + ttl.as_millis() as u64,
            value,
        };
        let bytes =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;
        tokio::fs::write(self.path_for(key), bytes)
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let _ = tokio::fs::remove_file(self.path_for(key)).await;
        Ok(())
    }

    async fn dispose(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;

    #[tokio::test]
    async fn miss_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let got: Option<String> = cache.try_get("nope").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn miss_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        let path = dir.path().join(format!("{}.cache", sanitize_file_name("k")));
        tokio::fs::write(&path, b"not json").await.unwrap();
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache
            .create_entry("k", &"hello".to_string(), None)
            .await
            .unwrap();
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache
            .create_entry("k", &"hello".to_string(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let got: Option<String> = cache.try_get("k").await.unwrap();
        assert_eq!(got, None);
        assert!(!cache.path_for("k").exists());
    }

    #[tokio::test]
    async fn load_all_skips_expired_and_non_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache
            .create_entry("fresh", &"v1".to_string(), None)
            .await
            .unwrap();
        cache
            .create_entry("stale", &"v2".to_string(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::fs::write(dir.path().join("unrelated.txt"), b"x")
            .await
            .unwrap();
        let loaded = cache.load_all().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "fresh");
    }
}
