//! Polling fallback for notification delivery.
//!
//! Periodically requests the notifications endpoint through the worker's own
//! fetch path and turns unread items it hasn't seen before into notifications.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::http::Request;
use crate::network::Fetcher;
use crate::template;
use crate::worker::{Notification, ServiceWorker};

#[derive(Debug, Deserialize)]
struct PolledItem {
  id: serde_json::Value,
  message: String,
  #[serde(default)]
  read: bool,
}

pub struct NotificationPoller<'a, S: CacheStore, F: Fetcher> {
  worker: &'a ServiceWorker<S, F>,
  request: Request,
  seen: HashSet<String>,
}

impl<'a, S: CacheStore, F: Fetcher> NotificationPoller<'a, S, F> {
  pub fn new(worker: &'a ServiceWorker<S, F>) -> Result<Self> {
    let url = worker
      .settings()
      .resolve(&worker.settings().notifications.poll_path)?;

    Ok(Self {
      worker,
      request: Request::get(url),
      seen: HashSet::new(),
    })
  }

  /// Poll once. Returns at most one notification: the item itself when a
  /// single new one arrived, a summary when there were several.
  pub async fn poll_once(&mut self) -> Result<Option<Notification>> {
    let response = self.worker.handle_fetch(&self.request).await?;
    if !response.ok() {
      debug!(status = response.status, "notification poll returned no data");
      return Ok(None);
    }

    let items: Vec<PolledItem> = serde_json::from_slice(&response.body)
      .map_err(|e| eyre!("Failed to parse notifications from {}: {}", self.request.url, e))?;

    // Only ids still in the feed are remembered
    let current: HashSet<String> = items.iter().map(|item| item.id.to_string()).collect();
    let previous = std::mem::replace(&mut self.seen, current);
    let fresh: Vec<PolledItem> = items
      .into_iter()
      .filter(|item| !item.read)
      .filter(|item| !previous.contains(&item.id.to_string()))
      .collect();

    let body = match fresh.as_slice() {
      [] => return Ok(None),
      [single] => single.message.clone(),
      many => {
        let settings = &self.worker.settings().notifications;
        let vars = BTreeMap::from([
          ("count", many.len().to_string()),
          ("title", settings.title.clone()),
        ]);
        template::fill(&settings.summary_template, &vars)
      }
    };

    self.worker.push(Some(body.as_str())).await.map(Some)
  }

  /// Poll on a fixed interval until Ctrl-C, handing notifications to `show`.
  pub async fn run<H>(&mut self, interval: Duration, mut show: H) -> Result<()>
  where
    H: FnMut(&Notification),
  {
    let mut ticker = tokio::time::interval(interval);

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          match self.poll_once().await {
            Ok(Some(notification)) => show(&notification),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "notification poll failed"),
          }
        }
        _ = tokio::signal::ctrl_c() => {
          debug!("stopping notification poller");
          return Ok(());
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Response;
  use crate::network::testing::StubFetcher;
  use crate::worker::test_support::{url, worker};

  fn feed(body: &str) -> Response {
    Response::new(200, body).with_header("Content-Type", "application/json")
  }

  #[tokio::test]
  async fn test_single_new_item_is_shown_verbatim() {
    let fetcher = StubFetcher::new().route(
      url("/api/notifications").as_str(),
      feed(r#"[{"id": 1, "message": "Javob keldi"}]"#),
    );
    let worker = worker(fetcher);
    let mut poller = NotificationPoller::new(&worker).unwrap();

    let notification = poller.poll_once().await.unwrap().unwrap();
    assert_eq!(notification.body, "Javob keldi");

    // Same feed again: nothing new
    assert!(poller.poll_once().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_several_items_collapse_into_summary() {
    let fetcher = StubFetcher::new().route(
      url("/api/notifications").as_str(),
      feed(
        r#"[
          {"id": "a", "message": "one"},
          {"id": "b", "message": "two"},
          {"id": "c", "message": "old", "read": true}
        ]"#,
      ),
    );
    let worker = worker(fetcher);
    let mut poller = NotificationPoller::new(&worker).unwrap();

    let notification = poller.poll_once().await.unwrap().unwrap();
    assert_eq!(notification.body, "2 new notifications in Muloqot Plus");
  }

  #[tokio::test]
  async fn test_offline_poll_yields_nothing() {
    let worker = worker(StubFetcher::new());
    let mut poller = NotificationPoller::new(&worker).unwrap();
    assert!(poller.poll_once().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_offline_poll_reuses_cached_feed_without_repeats() {
    let fetcher = StubFetcher::new().route(
      url("/api/notifications").as_str(),
      feed(r#"[{"id": 7, "message": "hello"}]"#),
    );
    let worker = worker(fetcher);
    let mut poller = NotificationPoller::new(&worker).unwrap();
    assert!(poller.poll_once().await.unwrap().is_some());

    worker.fetcher().go_offline();
    assert!(poller.poll_once().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_seen_ids_follow_the_latest_feed() {
    let fetcher = StubFetcher::new().route(
      url("/api/notifications").as_str(),
      feed(r#"[{"id": 1, "message": "first"}, {"id": 2, "message": "second"}]"#),
    );
    let worker = worker(fetcher);
    let mut poller = NotificationPoller::new(&worker).unwrap();
    poller.poll_once().await.unwrap();

    worker
      .fetcher()
      .set(url("/api/notifications").as_str(), feed(r#"[{"id": 2, "message": "second"}]"#));
    assert!(poller.poll_once().await.unwrap().is_none());
    assert_eq!(poller.seen, HashSet::from(["2".to_string()]));

    // Id 1 was dropped from the feed, so it counts as new if it comes back
    worker.fetcher().set(
      url("/api/notifications").as_str(),
      feed(r#"[{"id": 1, "message": "first"}, {"id": 2, "message": "second"}]"#),
    );
    let notification = poller.poll_once().await.unwrap().unwrap();
    assert_eq!(notification.body, "first");
  }

  #[tokio::test]
  async fn test_malformed_feed_is_an_error() {
    let fetcher =
      StubFetcher::new().route(url("/api/notifications").as_str(), feed(r#"{"oops": true}"#));
    let worker = worker(fetcher);
    let mut poller = NotificationPoller::new(&worker).unwrap();
    assert!(poller.poll_once().await.is_err());
  }
}
