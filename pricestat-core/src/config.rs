//! TOML configuration for the provider connection.
//!
//! Every field is optional; a missing file section falls back to the Nasdaq
//! defaults (5 second timeout, 5 year lookback).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.nasdaq.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
}

/// Connection settings for the chart endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub lookback_years: u32,
    pub user_agent: String,
    pub asset_class: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            user_agent: DEFAULT_USER_AGENT.into(),
            asset_class: "stocks".into(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.provider;
        if p.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url must not be empty".into()));
        }
        if let Err(e) = reqwest::Url::parse(p.base_url.trim()) {
            return Err(ConfigError::Invalid(format!(
                "provider.base_url {:?} is not a URL: {e}",
                p.base_url
            )));
        }
        if p.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be greater than zero".into(),
            ));
        }
        if p.lookback_years == 0 {
            return Err(ConfigError::Invalid(
                "provider.lookback_years must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
