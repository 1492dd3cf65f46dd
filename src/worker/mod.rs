//! The offline worker: cache lifecycle, request routing, fetch strategies and
//! the push/sync/notification hooks.
//!
//! Every handler is an async method; the host awaits it before it treats the
//! event as settled. Independent events may be in flight at the same time and
//! share the cache store without any locking beyond what the store provides.

mod events;
mod fallback;
mod hooks;
mod lifecycle;
mod router;
mod strategy;

pub use events::{EventOutcome, WorkerEvent};
pub use hooks::{ClickOutcome, Notification, NotificationAction, SyncOutcome, BACKGROUND_SYNC_TAG};
pub use lifecycle::{ActivateOutcome, InstallOutcome};
pub use router::{classify, RequestClass};

use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::cache::CacheStore;
use crate::config::{Config, NotificationConfig};
use crate::network::Fetcher;

/// Values the worker needs at runtime, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
  pub origin: Url,
  pub static_cache: String,
  pub dynamic_cache: String,
  pub api_prefix: String,
  /// Install manifest, as given (paths or absolute URLs)
  pub manifest: Vec<String>,
  pub notifications: NotificationConfig,
}

impl WorkerSettings {
  pub fn from_config(config: &Config) -> Result<Self> {
    Ok(Self {
      origin: config.origin()?.clone(),
      static_cache: config.cache.static_name.clone(),
      dynamic_cache: config.cache.dynamic_name.clone(),
      api_prefix: config.cache.api_prefix.clone(),
      manifest: config.cache.manifest.clone(),
      notifications: config.notifications.clone(),
    })
  }

  /// Resolve a path (or absolute URL) against the origin.
  pub fn resolve(&self, path: &str) -> Result<Url> {
    self
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid URL '{}': {}", path, e))
  }

  /// The two caches that survive activation.
  pub fn cache_names(&self) -> [&str; 2] {
    [&self.static_cache, &self.dynamic_cache]
  }
}

/// Offline worker over an injected cache store and network.
///
/// The worker itself is stateless between events: everything that has to
/// outlive an event lives in the cache store.
pub struct ServiceWorker<S: CacheStore, F: Fetcher> {
  store: S,
  fetcher: F,
  settings: WorkerSettings,
}

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
  pub fn new(store: S, fetcher: F, settings: WorkerSettings) -> Self {
    Self {
      store,
      fetcher,
      settings,
    }
  }

  pub fn settings(&self) -> &WorkerSettings {
    &self.settings
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn fetcher(&self) -> &F {
    &self.fetcher
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::network::testing::StubFetcher;

  pub const ORIGIN: &str = "https://muloqot.uz";

  pub fn settings() -> WorkerSettings {
    WorkerSettings {
      origin: Url::parse(ORIGIN).unwrap(),
      static_cache: "muloqot-static-v1".to_string(),
      dynamic_cache: "muloqot-dynamic-v1".to_string(),
      api_prefix: "/api/".to_string(),
      manifest: vec!["/".to_string(), "/auth".to_string()],
      notifications: NotificationConfig::default(),
    }
  }

  pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
  }

  pub fn worker(fetcher: StubFetcher) -> ServiceWorker<MemoryStorage, StubFetcher> {
    ServiceWorker::new(MemoryStorage::new(), fetcher, settings())
  }
}
