//! Namespaced cache-key derivation (spec.md §4.5).
//!
//! Shaped after `cache::keys::CacheKeys`, which builds `<kind>:<id>`-style
//! keys from a fixed prefix plus identifying parts; here the parts are a
//! prefix, a primary key, and an optional content hash.

use sha2::{Digest, Sha256};

/// Combine a prefix, primary key, and optional content hash into a single
/// namespaced cache key, e.g. `fault:<fingerprint>` or
/// `fault:<fingerprint>:<hash>`.
pub fn derive(prefix: &str, primary_key: &str, content_hash: Option<&str>) -> String {
    match content_hash {
        Some(hash) => format!("{prefix}:{primary_key}:{hash}"),
        None => format!("{prefix}:{primary_key}"),
    }
}

/// Convenience: derive a key hashing arbitrary content rather than
/// requiring the caller to hash it first.
pub fn derive_with_content(prefix: &str, primary_key: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = hex::encode(hasher.finalize());
    derive(prefix, primary_key, Some(&hash))
}
