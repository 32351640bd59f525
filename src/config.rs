use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::hardcover::params::{BookStatus, ListKey, SortSpec, DEFAULT_LIMIT};

pub const DEFAULT_API_URL: &str = "https://api.hardcover.app/v1/graphql";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default = "default_api_url")]
  pub api_url: String,
  /// Which list to show on startup
  #[serde(default)]
  pub list: ListConfig,
  /// Quiet period before coalesced progress changes are written
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
  /// Age after which a cached list is refetched on the next read
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
  #[serde(default)]
  pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
  #[serde(default)]
  pub status: BookStatus,
  #[serde(default = "default_limit")]
  pub limit: u32,
  /// `progress|added|updated`, optionally `.asc`/`.desc`; per-status default if unset
  pub sort: Option<SortSpec>,
}

impl Default for ListConfig {
  fn default() -> Self {
    Self {
      status: BookStatus::default(),
      limit: DEFAULT_LIMIT,
      sort: None,
    }
  }
}

/// Backoff for transient network failures
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
  #[serde(default = "default_attempts")]
  pub attempts: u32,
  #[serde(default = "default_base_delay_ms")]
  pub base_delay_ms: u64,
}

impl RetryConfig {
  pub fn base_delay(&self) -> Duration {
    Duration::from_millis(self.base_delay_ms)
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      attempts: default_attempts(),
      base_delay_ms: default_base_delay_ms(),
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_limit() -> u32 {
  DEFAULT_LIMIT
}

fn default_debounce_ms() -> u64 {
  1000
}

fn default_stale_secs() -> u64 {
  5 * 60
}

fn default_attempts() -> u32 {
  3
}

fn default_base_delay_ms() -> u64 {
  250
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      list: ListConfig::default(),
      debounce_ms: default_debounce_ms(),
      stale_secs: default_stale_secs(),
      retry: RetryConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./hardshelf.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/hardshelf/config.yaml
  ///
  /// Without any file the defaults are used.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("hardshelf.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("hardshelf").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to unit, not a mapping
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    self.api_url()?;
    self.list_key()?;
    Ok(())
  }

  pub fn api_url(&self) -> Result<Url> {
    Url::parse(&self.api_url).map_err(|e| eyre!("Invalid api_url '{}': {}", self.api_url, e))
  }

  /// The configured startup list
  pub fn list_key(&self) -> Result<ListKey> {
    ListKey::new(self.list.status, self.list.limit, self.list.sort)
      .map_err(|e| eyre!("Invalid list configuration: {}", e))
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_secs)
  }

  /// Get the Hardcover API token from environment variables.
  ///
  /// Checks HARDSHELF_TOKEN first, then HARDCOVER_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("HARDSHELF_TOKEN")
      .or_else(|_| std::env::var("HARDCOVER_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Hardcover API token not found. Set HARDSHELF_TOKEN or HARDCOVER_API_TOKEN environment variable."
        )
      })
  }
}
