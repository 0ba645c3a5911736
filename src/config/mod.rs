//! Configuration loading and validation.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::sync::SyncConfig;
use crate::upstream::CardDbConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API base, must end with a slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://marvelcdb.com/api/public/".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Resolve into the HTTP client configuration.
    pub fn client_config(&self) -> Result<CardDbConfig, ConfigError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::ValidationError(format!("invalid upstream base_url: {}", e))
        })?;
        Ok(CardDbConfig {
            base_url,
            timeout: StdDuration::from_secs(self.timeout_seconds),
            ..CardDbConfig::default()
        })
    }
}

/// Valuation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Maximum age of cached derived data, in hours.
    #[serde(default = "default_refresh_window_hours")]
    pub refresh_window_hours: i64,

    /// First day of the deck crawl on an empty store, `YYYY-MM-DD`.
    #[serde(default = "default_crawl_epoch")]
    pub crawl_epoch: String,
}

fn default_refresh_window_hours() -> i64 {
    12
}

fn default_crawl_epoch() -> String {
    "2020-01-01".to_string()
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            refresh_window_hours: default_refresh_window_hours(),
            crawl_epoch: default_crawl_epoch(),
        }
    }
}

impl ValuationConfig {
    /// Resolve into the sync controller configuration.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let crawl_epoch = NaiveDate::parse_from_str(&self.crawl_epoch, "%Y-%m-%d")
            .map_err(|e| {
                ConfigError::ValidationError(format!("invalid crawl_epoch: {}", e))
            })?;
        Ok(SyncConfig {
            refresh_window: chrono::Duration::hours(self.refresh_window_hours),
            crawl_epoch,
        })
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub valuation: ValuationConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            valuation: ValuationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.upstream.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        if self.valuation.refresh_window_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "Refresh window must be greater than 0".to_string(),
            ));
        }

        self.upstream.client_config()?;
        self.valuation.sync_config()?;
        Ok(())
    }
}
