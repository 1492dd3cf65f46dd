//! Core traits and types for the named response caches.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use sha2::{Digest, Sha256};

use crate::http::{Request, Response};

/// A response read back from a named cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub response: Response,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Each named cache maps a request key (method + URL) to a response snapshot.
/// Writing an existing key replaces the previous entry. Backends provide
/// atomic get/put per key; callers do no locking of their own.
pub trait CacheStore: Send + Sync {
  /// Create the named cache if it doesn't exist yet.
  fn open(&self, cache: &str) -> Result<()>;

  /// Look up a single entry.
  fn get(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>>;

  /// Store a single entry, creating the cache if needed.
  fn put(&self, cache: &str, key: &str, response: &Response) -> Result<()>;

  /// Store all entries or none of them.
  fn put_all(&self, cache: &str, entries: &[(String, Response)]) -> Result<()>;

  /// Delete a named cache and everything in it. Returns false if it didn't exist.
  fn delete(&self, cache: &str) -> Result<bool>;

  /// Names of all caches, in creation order.
  fn list_names(&self) -> Result<Vec<String>>;

  /// Request keys stored in a cache.
  fn keys(&self, cache: &str) -> Result<Vec<String>>;

  /// Search the given caches in order and return the first hit.
  fn match_any(&self, caches: &[&str], key: &str) -> Result<Option<CachedResponse>> {
    for cache in caches {
      if let Some(hit) = self.get(cache, key)? {
        return Ok(Some(hit));
      }
    }
    Ok(None)
  }

  /// Convenience wrapper keyed by request identity.
  fn match_request(&self, caches: &[&str], request: &Request) -> Result<Option<CachedResponse>> {
    self.match_any(caches, &request.cache_key())
  }
}

/// Stable fixed-length hash of a request key, used as a storage primary key.
pub fn key_hash(key: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(key.as_bytes());
  hex::encode(hasher.finalize())
}
