//! Tracks the deferred "add to home screen" prompt.
//!
//! The platform announces installability once per page load. The announcement
//! is kept until the user answers it (used at most once), the app gets
//! installed by other means, or the page reloads.

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info};

/// User's answer to the install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
  Accepted,
  Dismissed,
}

/// Captured install-eligibility announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredPrompt {
  /// Platforms the app can be installed on, as reported by the platform
  pub platforms: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InstallPromptTracker {
  deferred: Option<DeferredPrompt>,
  installed: bool,
}

impl InstallPromptTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// The platform says the app can be installed. A later announcement replaces
  /// an unused earlier one.
  pub fn on_eligible(&mut self, platforms: Vec<String>) {
    if self.installed {
      debug!("ignoring install eligibility, app already installed");
      return;
    }
    self.deferred = Some(DeferredPrompt { platforms });
  }

  /// Whether an install button should be offered.
  pub fn is_available(&self) -> bool {
    self.deferred.is_some()
  }

  pub fn is_installed(&self) -> bool {
    self.installed
  }

  /// Show the prompt and record the answer. Consumes the deferred prompt
  /// regardless of the answer.
  pub fn prompt(&mut self, choice: PromptChoice) -> Result<PromptChoice> {
    let deferred = self
      .deferred
      .take()
      .ok_or_else(|| eyre!("Install prompt is not available"))?;

    info!(platforms = ?deferred.platforms, choice = ?choice, "install prompt answered");
    if choice == PromptChoice::Accepted {
      self.installed = true;
    }
    Ok(choice)
  }

  /// The app was installed (through the prompt or the browser menu).
  pub fn on_installed(&mut self) {
    self.deferred = None;
    self.installed = true;
  }

  /// Page reload drops the announcement; the platform will send a new one.
  pub fn on_reload(&mut self) {
    self.deferred = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prompt_usable_once() {
    let mut tracker = InstallPromptTracker::new();
    assert!(!tracker.is_available());

    tracker.on_eligible(vec!["web".to_string()]);
    assert!(tracker.is_available());

    assert_eq!(tracker.prompt(PromptChoice::Accepted).unwrap(), PromptChoice::Accepted);
    assert!(tracker.is_installed());
    assert!(!tracker.is_available());
    assert!(tracker.prompt(PromptChoice::Accepted).is_err());
  }

  #[test]
  fn test_dismissed_prompt_is_still_consumed() {
    let mut tracker = InstallPromptTracker::new();
    tracker.on_eligible(vec![]);

    tracker.prompt(PromptChoice::Dismissed).unwrap();
    assert!(!tracker.is_installed());
    assert!(!tracker.is_available());
  }

  #[test]
  fn test_installed_and_reload_invalidate() {
    let mut tracker = InstallPromptTracker::new();
    tracker.on_eligible(vec![]);
    tracker.on_reload();
    assert!(!tracker.is_available());

    tracker.on_eligible(vec![]);
    tracker.on_installed();
    assert!(!tracker.is_available());

    // No new prompt once installed
    tracker.on_eligible(vec![]);
    assert!(!tracker.is_available());
  }
}
