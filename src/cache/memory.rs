//! In-memory cache storage, used by tests and by `--no-persist` runs.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::traits::{CacheStore, CachedResponse};
use crate::http::Response;

/// Cache storage backed by a process-local map.
#[derive(Default)]
pub struct MemoryStorage {
  /// Named caches in creation order
  caches: Mutex<Vec<(String, BTreeMap<String, CachedResponse>)>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

fn entries_mut<'a>(
  caches: &'a mut Vec<(String, BTreeMap<String, CachedResponse>)>,
  cache: &str,
) -> &'a mut BTreeMap<String, CachedResponse> {
  let index = match caches.iter().position(|(name, _)| name == cache) {
    Some(index) => index,
    None => {
      caches.push((cache.to_string(), BTreeMap::new()));
      caches.len() - 1
    }
  };
  &mut caches[index].1
}

impl CacheStore for MemoryStorage {
  fn open(&self, cache: &str) -> Result<()> {
    let mut caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries_mut(&mut caches, cache);
    Ok(())
  }

  fn get(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>> {
    let caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      caches
        .iter()
        .find(|(name, _)| name == cache)
        .and_then(|(_, entries)| entries.get(key).cloned()),
    )
  }

  fn put(&self, cache: &str, key: &str, response: &Response) -> Result<()> {
    self.put_all(cache, &[(key.to_string(), response.clone())])
  }

  fn put_all(&self, cache: &str, entries: &[(String, Response)]) -> Result<()> {
    let mut caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let target = entries_mut(&mut caches, cache);
    let cached_at = Utc::now();
    for (key, response) in entries {
      target.insert(
        key.clone(),
        CachedResponse {
          response: response.clone(),
          cached_at,
        },
      );
    }
    Ok(())
  }

  fn delete(&self, cache: &str) -> Result<bool> {
    let mut caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let before = caches.len();
    caches.retain(|(name, _)| name != cache);
    Ok(caches.len() != before)
  }

  fn list_names(&self) -> Result<Vec<String>> {
    let caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(caches.iter().map(|(name, _)| name.clone()).collect())
  }

  fn keys(&self, cache: &str) -> Result<Vec<String>> {
    let caches = self
      .caches
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      caches
        .iter()
        .find(|(name, _)| name == cache)
        .map(|(_, entries)| entries.keys().cloned().collect())
        .unwrap_or_default(),
    )
  }
}
