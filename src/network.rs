//! Live network access.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::NetworkConfig;
use crate::http::{Method, Request, Response};

/// Something that can perform a live fetch.
///
/// Transport failures (DNS, refused connection, timeout) are errors. Any HTTP
/// status, including 4xx and 5xx, is a successful fetch.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send;
}

/// reqwest-backed fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new(config: &NetworkConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .gzip(true)
      .deflate(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Head => reqwest::Method::HEAD,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Patch => reqwest::Method::PATCH,
    Method::Delete => reqwest::Method::DELETE,
    Method::Options => reqwest::Method::OPTIONS,
  }
}

impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    debug!(method = %request.method, url = %request.url, "fetching");

    let mut outgoing = self
      .client
      .request(to_reqwest_method(request.method), request.url.clone());
    for (name, value) in &request.headers {
      outgoing = outgoing.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
      outgoing = outgoing.body(body.clone());
    }

    let live = outgoing
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", request.url, e))?;

    let status = live.status();
    let mut response = Response::new(status.as_u16(), Vec::new());
    if let Some(reason) = status.canonical_reason() {
      response.status_text = reason.to_string();
    }
    for (name, value) in live.headers() {
      let value = match value.to_str() {
        Ok(value) => value.to_string(),
        Err(_) => {
          debug!(header = %name, url = %request.url, "non-UTF-8 header value, decoding lossily");
          String::from_utf8_lossy(value.as_bytes()).into_owned()
        }
      };
      response.append_header(name.as_str(), &value);
    }

    let body = live
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?;
    response.body = body.to_vec();

    Ok(response)
  }
}

#[cfg(test)]
pub mod testing {
  //! Scripted fetcher for strategy tests.

  use super::*;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// Answers from a fixed route table; unknown URLs fail like a dropped connection.
  #[derive(Default)]
  pub struct StubFetcher {
    routes: Mutex<HashMap<String, Response>>,
    calls: AtomicUsize,
    received: Mutex<Vec<Request>>,
  }

  impl StubFetcher {
    pub fn new() -> Self {
      Self::default()
    }

    /// Serve `response` for `url` (matched on the full URL string).
    pub fn route(self, url: &str, response: Response) -> Self {
      self.set(url, response);
      self
    }

    pub fn set(&self, url: &str, response: Response) {
      self
        .routes
        .lock()
        .unwrap()
        .insert(url.to_string(), response);
    }

    /// Drop every route, simulating loss of connectivity.
    pub fn go_offline(&self) {
      self.routes.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen so far, in arrival order.
    pub fn received(&self) -> Vec<Request> {
      self.received.lock().unwrap().clone()
    }
  }

  impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.received.lock().unwrap().push(request.clone());
      self
        .routes
        .lock()
        .unwrap()
        .get(request.url.as_str())
        .cloned()
        .ok_or_else(|| eyre!("network unreachable: {}", request.url))
    }
  }
}
