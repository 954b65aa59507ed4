//! Persistent configuration for tapline.
//!
//! Stores user settings in `~/.tapline/config.json`: where the WebDriver
//! endpoint lives, which session to attach to, and the defaults the CLI
//! applies to waits and scroll loops when no flag overrides them.
//!
//! # Example
//!
//! ```no_run
//! use tapline_core::config::TaplineConfig;
//!
//! // Load (returns defaults if the file doesn't exist)
//! let config = TaplineConfig::load();
//! println!("endpoint: {}", config.webdriver_url);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIRNAME: &str = ".tapline";
const CONFIG_FILENAME: &str = "config.json";

/// Appium's default listen address.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:4723";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Returns the tapline state directory (`~/.tapline`), creating it if needed.
pub fn tapline_dir() -> Result<PathBuf, ConfigError> {
    let dir = dirs::home_dir()
        .ok_or(ConfigError::NoHomeDir)?
        .join(CONFIG_DIRNAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistent tapline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaplineConfig {
    /// Base URL of the WebDriver/Appium endpoint.
    pub webdriver_url: String,
    /// Session to attach to when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Default timeout for `wait`, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Default poll interval for `wait`, in milliseconds.
    pub wait_poll_interval_ms: u64,
    /// Default attempt budget for `scroll-until`.
    pub scroll_max_attempts: u32,
}

impl Default for TaplineConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            session_id: None,
            wait_timeout_ms: crate::wait::DEFAULT_TIMEOUT.as_millis() as u64,
            wait_poll_interval_ms: crate::wait::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            scroll_max_attempts: crate::scroll_until::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl TaplineConfig {
    /// Load config from `~/.tapline/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        tapline_dir()
            .map(|dir| Self::load_from(&dir.join(CONFIG_FILENAME)))
            .unwrap_or_default()
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.tapline/config.json`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&tapline_dir()?.join(CONFIG_FILENAME))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }
}
