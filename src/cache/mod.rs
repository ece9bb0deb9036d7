//! The two-tier cache abstraction used by fault analysis (spec.md §4.5).

mod error;
#[cfg(feature = "file-cache")]
mod file;
pub mod keys;
mod memory;
mod two_tier;

pub use error::{CacheError, CacheResult};
#[cfg(feature = "file-cache")]
pub use file::FileCache;
pub use memory::MemoryCache;
pub use two_tier::TwoTierCache;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Operations common to every cache tier: `tryGet`/`createEntry`/`remove`/
/// `dispose` (spec.md §4.5).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Raw string lookup; `Ok(None)` on miss, expiry, or a corrupt/missing
    /// backing file — never an error for "not found".
    async fn try_get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Raw string insert with an optional TTL override (default 20 minutes
    /// per spec.md §3 `FaultCacheEntry`).
    async fn create_entry_raw(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;

    async fn dispose(&self);
}

/// Typed convenience wrappers over the raw string operations, serializing
/// through the shared [`crate::serializer`].
#[async_trait]
pub trait CacheExt: Cache {
    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.try_get_raw(key).await? {
            Some(raw) => match crate::serializer::deserialize(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(_) => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn create_entry<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let raw = crate::serializer::serialize(value)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.create_entry_raw(key, raw, ttl).await
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

/// Default TTL for fault-analysis cache entries (spec.md §3).
pub const DEFAULT_FAULT_CACHE_TTL: Duration = Duration::from_secs(20 * 60);

/// Sanitize an arbitrary cache key into a filesystem-safe file name
/// component: strip characters invalid on common filesystems, avoid
/// reserved names, and cap length (spec.md §4.5).
pub(crate) fn sanitize_file_name(key: &str) -> String {
    const MAX_LEN: usize = 200;
    let mut sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        sanitized.push('_');
    }

    const RESERVED: &[&str] = &[
        "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "lpt1", "lpt2", "lpt3",
    ];
    if RESERVED.contains(&sanitized.to_lowercase().as_str()) {
        sanitized = format!("_{sanitized}");
    }

    if sanitized.len() > MAX_LEN {
        sanitized.truncate(MAX_LEN);
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_invalid_chars() {
        let sanitized = sanitize_file_name("fault:abc/123?.json");
        assert!(!sanitized.contains('/'));
        assert!(!sanitized.contains(':'));
        assert!(!sanitized.contains('?'));
    }

    #[test]
    fn sanitize_handles_reserved_names() {
        let sanitized = sanitize_file_name("con");
        assert_ne!(sanitized, "con");
    }

    #[test]
    fn sanitize_caps_length() {
        let long_key = "a".repeat(500);
        let sanitized = sanitize_file_name(&long_key);
        assert!(sanitized.len() <= 200);
    }
}
