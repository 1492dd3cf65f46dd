use crate::http::{Request, RequestMode};

/// Strategy class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Backend call, network-first with the dynamic cache as fallback
  Api,
  /// Page load, network-first with the app shell as fallback
  Navigation,
  /// Everything else, cache-first
  Asset,
}

impl RequestClass {
  pub fn as_str(&self) -> &'static str {
    match self {
      RequestClass::Api => "api",
      RequestClass::Navigation => "navigation",
      RequestClass::Asset => "asset",
    }
  }
}

/// Classify a request. First match wins: API prefix, then navigation mode.
pub fn classify(request: &Request, api_prefix: &str) -> RequestClass {
  if request.url.path().starts_with(api_prefix) {
    RequestClass::Api
  } else if request.mode == RequestMode::Navigate {
    RequestClass::Navigation
  } else {
    RequestClass::Asset
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Destination;
  use crate::worker::test_support::url;

  #[test]
  fn test_api_prefix_wins_over_navigation() {
    let request = Request::navigate(url("/api/posts"));
    assert_eq!(classify(&request, "/api/"), RequestClass::Api);
  }

  #[test]
  fn test_navigation_mode() {
    let request = Request::navigate(url("/complaints/12"));
    assert_eq!(classify(&request, "/api/"), RequestClass::Navigation);
  }

  #[test]
  fn test_everything_else_is_asset() {
    let script = Request::get(url("/static/js/main.js")).with_destination(Destination::Script);
    let image = Request::get(url("/icon-192x192.png")).with_destination(Destination::Image);
    assert_eq!(classify(&script, "/api/"), RequestClass::Asset);
    assert_eq!(classify(&image, "/api/"), RequestClass::Asset);
  }

  #[test]
  fn test_prefix_matches_path_not_query() {
    let request = Request::get(url("/search?next=/api/posts"));
    assert_eq!(classify(&request, "/api/"), RequestClass::Asset);
    // "/apiary" does not start with "/api/"
    assert_eq!(classify(&Request::get(url("/apiary")), "/api/"), RequestClass::Asset);
  }
}
