//! Dispatch table from event kind to handler.

use color_eyre::Result;
use tracing::debug;

use super::hooks::{ClickOutcome, Notification, SyncOutcome};
use super::lifecycle::{ActivateOutcome, InstallOutcome};
use super::ServiceWorker;
use crate::cache::CacheStore;
use crate::http::{Request, Response};
use crate::network::Fetcher;

/// Events the host delivers to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
  Install,
  Activate,
  Fetch(Request),
  Push(Option<String>),
  Sync(String),
  NotificationClick(Option<String>),
}

impl WorkerEvent {
  pub fn kind(&self) -> &'static str {
    match self {
      WorkerEvent::Install => "install",
      WorkerEvent::Activate => "activate",
      WorkerEvent::Fetch(_) => "fetch",
      WorkerEvent::Push(_) => "push",
      WorkerEvent::Sync(_) => "sync",
      WorkerEvent::NotificationClick(_) => "notificationclick",
    }
  }
}

/// Result of a settled event.
#[derive(Debug, Clone)]
pub enum EventOutcome {
  Installed(InstallOutcome),
  Activated(ActivateOutcome),
  Response(Response),
  Notification(Notification),
  Synced(SyncOutcome),
  Clicked(ClickOutcome),
}

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
  /// Run the handler for `event`. The event is settled once this resolves.
  pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
    debug!(event = event.kind(), "dispatch");

    let outcome = match event {
      WorkerEvent::Install => EventOutcome::Installed(self.install().await?),
      WorkerEvent::Activate => EventOutcome::Activated(self.activate().await?),
      WorkerEvent::Fetch(request) => EventOutcome::Response(self.handle_fetch(&request).await?),
      WorkerEvent::Push(payload) => {
        EventOutcome::Notification(self.push(payload.as_deref()).await?)
      }
      WorkerEvent::Sync(tag) => EventOutcome::Synced(self.sync(&tag).await?),
      WorkerEvent::NotificationClick(action) => {
        EventOutcome::Clicked(self.notification_click(action.as_deref()).await?)
      }
    };

    Ok(outcome)
  }
}
