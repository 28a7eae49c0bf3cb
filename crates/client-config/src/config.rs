//! Configuration management for the client.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default API base URL (can be overridden at compile time via the
/// GATEWELL_API_BASE_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("GATEWELL_API_BASE_URL") {
    Some(url) => url,
    None => "https://api.gatewell.dev",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default floor on perceived form submission time, in milliseconds.
pub const DEFAULT_MIN_EXEC_TIME_MS: u64 = 1000;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Floor on perceived form submission time, in milliseconds.
    #[serde(default = "default_min_exec_time_ms")]
    pub min_exec_time_ms: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_min_exec_time_ms() -> u64 {
    DEFAULT_MIN_EXEC_TIME_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            min_exec_time_ms: DEFAULT_MIN_EXEC_TIME_MS,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from
    /// environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    /// Note: api_base_url is compile-time only and always uses the
    /// built-in default, regardless of what's in the config file.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force the compile-time value (never from config file)
        config.api_base_url = DEFAULT_API_BASE_URL.to_string();

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables. Only log_level
    /// can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("GATEWELL_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.api_base_url).map_err(ConfigError::from)
    }

    pub fn min_exec_time(&self) -> Duration {
        Duration::from_millis(self.min_exec_time_ms)
    }
}
