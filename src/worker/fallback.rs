//! Responses synthesized when neither the network nor the cache can answer.

use serde::Serialize;

use crate::http::Response;

const OFFLINE_IMAGE_SVG: &str = concat!(
  r##"<svg width="200" height="200" xmlns="http://www.w3.org/2000/svg">"##,
  r##"<rect width="200" height="200" fill="#f0f0f0"/>"##,
  r##"<text x="50%" y="50%" text-anchor="middle" dy=".3em" fill="#999">Offline</text>"##,
  r##"</svg>"##
);

const OFFLINE_PAGE_TEXT: &str = "Offline: Muloqot Plus is not available without a network connection.";

#[derive(Serialize)]
struct OfflineApiError {
  error: &'static str,
  message: &'static str,
  offline: bool,
}

/// 503 JSON body returned for API calls with no network and no cached copy.
pub fn offline_api_response() -> Response {
  let body = OfflineApiError {
    error: "No network connection",
    message: "This data is not available offline",
    offline: true,
  };
  // Serializing a struct of static strings can't fail.
  let body = serde_json::to_vec(&body).unwrap_or_default();
  Response::new(503, body).with_header("Content-Type", "application/json")
}

/// Placeholder image so the page doesn't show a broken-image icon.
pub fn offline_image_response() -> Response {
  Response::new(200, OFFLINE_IMAGE_SVG).with_header("Content-Type", "image/svg+xml")
}

/// Last-resort notice for a navigation with no cached page and no app shell.
pub fn offline_page_response() -> Response {
  Response::new(503, OFFLINE_PAGE_TEXT).with_header("Content-Type", "text/plain; charset=utf-8")
}
