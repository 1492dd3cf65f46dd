//! Install and activate: populate the static cache, retire old caches.

use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::ServiceWorker;
use crate::cache::CacheStore;
use crate::http::{Request, Response};
use crate::network::Fetcher;

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
  /// Request keys written to the static cache
  pub cached: Vec<String>,
  /// Take over from the previous worker without waiting
  pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutcome {
  /// Stale caches that were removed
  pub deleted: Vec<String>,
  /// Open pages are controlled immediately, without a reload
  pub clients_claimed: bool,
}

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
  /// Fetch the whole manifest and store it in the static cache.
  ///
  /// All or nothing: if any entry fails to fetch or isn't OK, nothing is
  /// stored and the install fails. The host is expected to retry later.
  pub async fn install(&self) -> Result<InstallOutcome> {
    let cache = &self.settings.static_cache;
    info!(cache = %cache, entries = self.settings.manifest.len(), "installing");

    self.store.open(cache)?;

    let requests = self
      .settings
      .manifest
      .iter()
      .map(|path| self.settings.resolve(path).map(Request::get))
      .collect::<Result<Vec<_>>>()?;

    let responses = try_join_all(requests.iter().map(|r| self.fetch_manifest_entry(r)))
      .await
      .map_err(|e| {
        warn!(error = %e, "install failed, static cache left untouched");
        e
      })?;

    let entries: Vec<(String, Response)> = requests
      .iter()
      .map(Request::cache_key)
      .zip(responses)
      .collect();

    self.store.put_all(cache, &entries)?;

    let cached: Vec<String> = entries.into_iter().map(|(key, _)| key).collect();
    info!(cache = %cache, cached = cached.len(), "installed");

    Ok(InstallOutcome {
      cached,
      skip_waiting: true,
    })
  }

  async fn fetch_manifest_entry(&self, request: &Request) -> Result<Response> {
    let response = self.fetcher.fetch(request).await?;
    if !response.ok() {
      return Err(eyre!(
        "Manifest entry {} returned {} {}",
        request.url,
        response.status,
        response.status_text
      ));
    }
    Ok(response)
  }

  /// Delete every cache other than the static and dynamic ones, then claim clients.
  pub async fn activate(&self) -> Result<ActivateOutcome> {
    let keep = self.settings.cache_names();

    let mut deleted = Vec::new();
    for name in self.store.list_names()? {
      if keep.contains(&name.as_str()) {
        continue;
      }
      info!(cache = %name, "deleting stale cache");
      self.store.delete(&name)?;
      deleted.push(name);
    }

    info!(deleted = deleted.len(), "activated, claiming clients");

    Ok(ActivateOutcome {
      deleted,
      clients_claimed: true,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::network::testing::StubFetcher;
  use crate::worker::test_support::{url, worker};

  fn page(body: &str) -> Response {
    Response::new(200, body).with_header("Content-Type", "text/html")
  }

  #[tokio::test]
  async fn test_install_stores_whole_manifest() {
    let fetcher = StubFetcher::new()
      .route(url("/").as_str(), page("shell"))
      .route(url("/auth").as_str(), page("auth"));
    let worker = worker(fetcher);

    let outcome = worker.install().await.unwrap();

    assert!(outcome.skip_waiting);
    assert_eq!(outcome.cached.len(), 2);
    assert_eq!(worker.store().keys("muloqot-static-v1").unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing() {
    // "/auth" is unreachable
    let fetcher = StubFetcher::new().route(url("/").as_str(), page("shell"));
    let worker = worker(fetcher);

    assert!(worker.install().await.is_err());
    assert!(worker.store().keys("muloqot-static-v1").unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_install_rejects_non_ok_entry() {
    let fetcher = StubFetcher::new()
      .route(url("/").as_str(), page("shell"))
      .route(url("/auth").as_str(), Response::new(404, "missing"));
    let worker = worker(fetcher);

    assert!(worker.install().await.is_err());
    assert!(worker.store().keys("muloqot-static-v1").unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_activate_removes_only_stale_caches() {
    let worker = worker(StubFetcher::new());
    let store = worker.store();
    store.put("muloqot-static-v0", "GET /", &page("old")).unwrap();
    store.put("muloqot-static-v1", "GET /", &page("new")).unwrap();
    store.open("muloqot-dynamic-v1").unwrap();
    store.open("someone-elses-cache").unwrap();

    let outcome = worker.activate().await.unwrap();

    assert!(outcome.clients_claimed);
    assert_eq!(
      outcome.deleted,
      vec!["muloqot-static-v0", "someone-elses-cache"]
    );
    assert_eq!(
      store.list_names().unwrap(),
      vec!["muloqot-static-v1", "muloqot-dynamic-v1"]
    );
  }

  #[tokio::test]
  async fn test_activate_with_nothing_stale() {
    let worker = worker(StubFetcher::new());
    worker.store().open("muloqot-static-v1").unwrap();

    let outcome = worker.activate().await.unwrap();
    assert!(outcome.deleted.is_empty());
    assert_eq!(worker.store().list_names().unwrap(), vec!["muloqot-static-v1"]);
  }
}
