//! Push, notification-click and background-sync hooks.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use super::ServiceWorker;
use crate::cache::CacheStore;
use crate::network::Fetcher;

/// Tag of the background-sync extension point.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

const EXPLORE_ACTION: &str = "explore";
const CLOSE_ACTION: &str = "close";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
  pub action: &'static str,
  pub title: &'static str,
}

/// A system notification ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
  pub date_of_arrival: DateTime<Utc>,
  pub actions: Vec<NotificationAction>,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickOutcome {
  pub close: bool,
  /// Window to open, if any
  pub open: Option<Url>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
  /// Known tag; nothing to replay yet
  Completed,
  /// Tag this worker doesn't handle
  Ignored,
}

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
  /// Build the notification for a push message. Empty payloads use the welcome text.
  pub async fn push(&self, payload: Option<&str>) -> Result<Notification> {
    let settings = &self.settings.notifications;
    let body = match payload {
      Some(text) if !text.trim().is_empty() => text.to_string(),
      _ => settings.default_body.clone(),
    };

    info!(body = %body, "showing push notification");

    Ok(Notification {
      title: settings.title.clone(),
      body,
      icon: settings.icon.clone(),
      badge: settings.badge.clone(),
      vibrate: vec![100, 50, 100],
      date_of_arrival: Utc::now(),
      actions: vec![
        NotificationAction {
          action: EXPLORE_ACTION,
          title: "Open app",
        },
        NotificationAction {
          action: CLOSE_ACTION,
          title: "Close",
        },
      ],
    })
  }

  /// Route a click. `explore` opens the dashboard; anything else only dismisses.
  pub async fn notification_click(&self, action: Option<&str>) -> Result<ClickOutcome> {
    let open = match action {
      Some(EXPLORE_ACTION) => Some(self.settings.resolve(&self.settings.notifications.explore_url)?),
      _ => None,
    };
    debug!(action = action.unwrap_or(""), open = ?open.as_ref().map(Url::as_str), "notification click");

    Ok(ClickOutcome { close: true, open })
  }

  /// Background sync. Replaying failed mutations is not implemented; the
  /// known tag completes immediately.
  pub async fn sync(&self, tag: &str) -> Result<SyncOutcome> {
    if tag == BACKGROUND_SYNC_TAG {
      info!(tag, "background sync");
      Ok(SyncOutcome::Completed)
    } else {
      debug!(tag, "ignoring unknown sync tag");
      Ok(SyncOutcome::Ignored)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::network::testing::StubFetcher;
  use crate::worker::test_support::worker;

  #[tokio::test]
  async fn test_push_with_text_payload() {
    let worker = worker(StubFetcher::new());
    let notification = worker.push(Some("Murojaatingizga javob berildi")).await.unwrap();

    assert_eq!(notification.title, "Muloqot Plus");
    assert_eq!(notification.body, "Murojaatingizga javob berildi");
    assert_eq!(notification.icon, "/icon-192x192.png");
    let actions: Vec<_> = notification.actions.iter().map(|a| a.action).collect();
    assert_eq!(actions, vec!["explore", "close"]);
  }

  #[tokio::test]
  async fn test_push_keeps_payload_text_as_sent() {
    let worker = worker(StubFetcher::new());
    assert_eq!(worker.push(Some(" salom ")).await.unwrap().body, " salom ");
  }

  #[tokio::test]
  async fn test_push_without_payload_uses_welcome_text() {
    let worker = worker(StubFetcher::new());
    let expected = worker.settings().notifications.default_body.clone();

    assert_eq!(worker.push(None).await.unwrap().body, expected);
    assert_eq!(worker.push(Some("  ")).await.unwrap().body, expected);
  }

  #[tokio::test]
  async fn test_explore_opens_dashboard() {
    let worker = worker(StubFetcher::new());
    let outcome = worker.notification_click(Some("explore")).await.unwrap();

    assert!(outcome.close);
    assert_eq!(outcome.open.unwrap().as_str(), "https://muloqot.uz/dashboard");
  }

  #[tokio::test]
  async fn test_close_and_body_click_only_dismiss() {
    let worker = worker(StubFetcher::new());
    for action in [Some("close"), None, Some("unknown")] {
      let outcome = worker.notification_click(action).await.unwrap();
      assert!(outcome.close);
      assert!(outcome.open.is_none());
    }
  }

  #[tokio::test]
  async fn test_sync_tags() {
    let worker = worker(StubFetcher::new());
    assert_eq!(worker.sync("background-sync").await.unwrap(), SyncOutcome::Completed);
    assert_eq!(worker.sync("other").await.unwrap(), SyncOutcome::Ignored);
  }
}
