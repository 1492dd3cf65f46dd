//! Fetch strategies per request class.

use color_eyre::Result;
use tracing::{debug, warn};

use super::fallback::{offline_api_response, offline_image_response, offline_page_response};
use super::router::{classify, RequestClass};
use super::ServiceWorker;
use crate::cache::CacheStore;
use crate::http::{Destination, Method, Request, Response};
use crate::network::Fetcher;

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
  /// Answer an intercepted request.
  ///
  /// Only a non-image asset with neither network nor cached copy produces an
  /// error; every other failure degrades to a cached or synthesized response.
  pub async fn handle_fetch(&self, request: &Request) -> Result<Response> {
    let class = classify(request, &self.settings.api_prefix);
    debug!(class = class.as_str(), method = %request.method, url = %request.url, "fetch");

    match class {
      RequestClass::Api => Ok(self.network_first_api(request).await),
      RequestClass::Navigation => Ok(self.network_first_navigation(request).await),
      RequestClass::Asset => self.cache_first_asset(request).await,
    }
  }

  /// Network first; successful GETs refresh the dynamic cache.
  async fn network_first_api(&self, request: &Request) -> Response {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.ok() && request.method == Method::Get {
          self.store_dynamic(request, &response);
        }
        response
      }
      Err(e) => {
        debug!(url = %request.url, error = %e, "api fetch failed, trying dynamic cache");
        match self.lookup(&[self.settings.dynamic_cache.as_str()], request) {
          Some(cached) => cached,
          None => {
            warn!(url = %request.url, "api request unavailable offline");
            offline_api_response()
          }
        }
      }
    }
  }

  /// Network first; offline falls back to this page, then the app shell.
  async fn network_first_navigation(&self, request: &Request) -> Response {
    match self.fetcher.fetch(request).await {
      Ok(response) => response,
      Err(e) => {
        debug!(url = %request.url, error = %e, "navigation failed, serving from cache");
        let caches = self.settings.cache_names();

        if let Some(cached) = self.lookup(&caches, request) {
          return cached;
        }

        let shell = match self.settings.resolve("/") {
          Ok(url) => self.lookup(&caches, &Request::get(url)),
          Err(_) => None,
        };
        shell.unwrap_or_else(|| {
          warn!(url = %request.url, "no app shell cached");
          offline_page_response()
        })
      }
    }
  }

  /// Cache first; a hit never touches the network.
  async fn cache_first_asset(&self, request: &Request) -> Result<Response> {
    if let Some(cached) = self.lookup(&self.settings.cache_names(), request) {
      return Ok(cached);
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.ok() && request.method == Method::Get {
          self.store_dynamic(request, &response);
        }
        Ok(response)
      }
      Err(e) if request.destination == Destination::Image => {
        debug!(url = %request.url, error = %e, "image unavailable, serving placeholder");
        Ok(offline_image_response())
      }
      Err(e) => Err(e),
    }
  }

  /// Cache lookup where a storage error counts as a miss.
  fn lookup(&self, caches: &[&str], request: &Request) -> Option<Response> {
    match self.store.match_request(caches, request) {
      Ok(hit) => hit.map(|cached| cached.response),
      Err(e) => {
        warn!(url = %request.url, error = %e, "cache lookup failed");
        None
      }
    }
  }

  /// Store a copy in the dynamic cache. Failures never affect the response.
  fn store_dynamic(&self, request: &Request, response: &Response) {
    let key = request.cache_key();
    if let Err(e) = self.store.put(&self.settings.dynamic_cache, &key, response) {
      warn!(key = %key, error = %e, "failed to update dynamic cache");
    }
  }
}
