use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Origin the app is served from, e.g. https://muloqot.uz
  pub origin: Option<Url>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub network: NetworkConfig,
  #[serde(default)]
  pub notifications: NotificationConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Cache populated at install time
  pub static_name: String,
  /// Cache grown from live responses
  pub dynamic_name: String,
  /// Requests whose path starts with this prefix are API traffic
  pub api_prefix: String,
  /// Paths fetched and stored at install time. Any failure aborts the install.
  pub manifest: Vec<String>,
  /// Cache database location (default: $XDG_DATA_HOME/muloqot-sw/cache.db)
  pub db_path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      static_name: "muloqot-static-v1".to_string(),
      dynamic_name: "muloqot-dynamic-v1".to_string(),
      api_prefix: "/api/".to_string(),
      manifest: vec![
        "/".to_string(),
        "/auth".to_string(),
        "/dashboard".to_string(),
        "/manifest.json".to_string(),
      ],
      db_path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  pub connect_timeout_secs: u64,
  pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      connect_timeout_secs: 10,
      request_timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
  pub title: String,
  /// Body used when a push message carries no text
  pub default_body: String,
  pub icon: String,
  pub badge: String,
  /// Where the "explore" action leads
  pub explore_url: String,
  /// Endpoint polled by `watch`
  pub poll_path: String,
  pub poll_interval_secs: u64,
  /// Body used when several notifications arrive in one poll. Placeholders: {count}, {title}
  pub summary_template: String,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      title: "Muloqot Plus".to_string(),
      default_body: "Muloqot Plus platformasiga xush kelibsiz!".to_string(),
      icon: "/icon-192x192.png".to_string(),
      badge: "/icon-72x72.png".to_string(),
      explore_url: "/dashboard".to_string(),
      poll_path: "/api/notifications".to_string(),
      poll_interval_secs: 30,
      summary_template: "{count} new notifications in {title}".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Write logs to a daily-rotated file instead of stderr
  pub file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./muloqot-sw.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/muloqot-sw/config.yaml
  ///
  /// Without any file the defaults are used; the origin then has to come from
  /// the command line.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("muloqot-sw.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("muloqot-sw").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.cache.static_name == self.cache.dynamic_name {
      return Err(eyre!(
        "cache.static_name and cache.dynamic_name must differ (both are '{}')",
        self.cache.static_name
      ));
    }
    if !self.cache.api_prefix.starts_with('/') {
      return Err(eyre!(
        "cache.api_prefix must start with '/': {}",
        self.cache.api_prefix
      ));
    }
    // Polls must take the network-first API path
    if !self.notifications.poll_path.starts_with(&self.cache.api_prefix) {
      return Err(eyre!(
        "notifications.poll_path must start with cache.api_prefix '{}': {}",
        self.cache.api_prefix,
        self.notifications.poll_path
      ));
    }
    Ok(())
  }

  /// The configured origin, or an error explaining how to set one.
  pub fn origin(&self) -> Result<&Url> {
    self.origin.as_ref().ok_or_else(|| {
      eyre!("No origin configured. Pass --origin or set `origin` in muloqot-sw.yaml")
    })
  }

  /// Cache database location.
  pub fn db_path(&self) -> Result<PathBuf> {
    match &self.cache.db_path {
      Some(p) => Ok(p.clone()),
      None => crate::cache::SqliteStorage::default_path(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert!(config.origin.is_none());
    assert_eq!(config.cache.api_prefix, "/api/");
    assert_eq!(config.cache.manifest[0], "/");
    assert_eq!(config.notifications.explore_url, "/dashboard");
  }

  #[test]
  fn test_partial_sections_keep_other_defaults() {
    let yaml = r#"
origin: https://muloqot.uz
cache:
  static_name: app-static-v2
  manifest: ["/", "/auth"]
notifications:
  poll_interval_secs: 5
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.origin().unwrap().as_str(), "https://muloqot.uz/");
    assert_eq!(config.cache.static_name, "app-static-v2");
    assert_eq!(config.cache.dynamic_name, "muloqot-dynamic-v1");
    assert_eq!(config.cache.manifest, vec!["/", "/auth"]);
    assert_eq!(config.notifications.poll_interval_secs, 5);
    assert_eq!(config.notifications.title, "Muloqot Plus");
  }

  #[test]
  fn test_same_cache_names_rejected() {
    let yaml = "cache:\n  static_name: x\n  dynamic_name: x\n";
    assert!(Config::parse(yaml).is_err());
  }

  #[test]
  fn test_poll_path_outside_api_prefix_rejected() {
    let yaml = "notifications:\n  poll_path: /notifications\n";
    let err = Config::parse(yaml).unwrap_err();
    assert!(err.to_string().contains("poll_path"));

    let yaml = "cache:\n  api_prefix: /v2/\nnotifications:\n  poll_path: /v2/notifications\n";
    assert!(Config::parse(yaml).is_ok());
  }

  #[test]
  fn test_missing_origin_is_an_error() {
    let config = Config::default();
    assert!(config.origin().is_err());
  }
}
