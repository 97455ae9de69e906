//! config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order; the first existing file wins:
//! 1. `$SCRIVENER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/scrivener/config.toml`
//! 3. `~/.scrivener/config.toml`
//!
//! A missing file is not an error; every field has a default.
//!
//! # Example
//!
//! ```toml
//! api_base = "https://github.example.com/api/v3"
//! branch_prefix = "drafts"
//! stats_poll_interval_ms = 500
//! stats_poll_max_retries = 20
//! offer_browser = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::PollSettings;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Scrivener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// GitHub API base URL (override for GitHub Enterprise).
    pub api_base: String,

    /// Prefix for branches created by the fresh-branch remediation.
    pub branch_prefix: String,

    /// Fixed interval between retries of asynchronously computed
    /// endpoints, in milliseconds.
    pub stats_poll_interval_ms: u64,

    /// Maximum retries of asynchronously computed endpoints before giving
    /// up.
    pub stats_poll_max_retries: u32,

    /// Whether to offer opening comparison links in the browser.
    pub offer_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            branch_prefix: "scriv".to_string(),
            stats_poll_interval_ms: 1000,
            stats_poll_max_retries: 10,
            offer_browser: true,
        }
    }
}

impl Config {
    /// Load configuration from the default locations.
    pub fn load() -> Result<Self, ConfigError> {
        match find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The long-poll settings derived from this configuration.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.stats_poll_interval_ms),
            max_retries: self.stats_poll_max_retries,
        }
    }
}

/// First existing config file among the default locations.
fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SCRIVENER_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("scrivener").join("config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".scrivener").join("config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.branch_prefix, "scriv");
        assert_eq!(config.stats_poll_max_retries, 10);
        assert!(config.offer_browser);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "branch_prefix = \"drafts\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.branch_prefix, "drafts");
        assert_eq!(config.api_base, "https://api.github.com");
    }

    #[test]
    fn full_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            api_base: "https://github.example.com/api/v3".into(),
            branch_prefix: "wip".into(),
            stats_poll_interval_ms: 250,
            stats_poll_max_retries: 3,
            offer_browser: false,
        };
        fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "branch_prefix = [1, 2]\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn poll_settings_conversion() {
        let config = Config {
            stats_poll_interval_ms: 250,
            stats_poll_max_retries: 3,
            ..Config::default()
        };
        let poll = config.poll_settings();
        assert_eq!(poll.interval, Duration::from_millis(250));
        assert_eq!(poll.max_retries, 3);
    }
}
