//! Configuration management for sastop
//!
//! The config file only carries non-secret settings. The API token is supplied
//! at process start (`--token` / `SNYK_TOKEN`) and never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::retry::RetryPolicy;
use crate::error::{ConfigError, Result};
use crate::input::Identifier;
use crate::output::report::ReportSelection;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "SASTOP_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default group to audit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Custom API host (scheme + host, no path), for proxies and testing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Remote call settings
    #[serde(default)]
    pub requests: RequestSettings,

    /// Report defaults
    #[serde(default)]
    pub report: ReportSettings,
}

/// Concurrency, paging and retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Maximum number of in-flight remote calls
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Page size for list endpoints
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Attempts per call before a retryable failure is surfaced
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_concurrency() -> usize {
    8
}

fn default_page_size() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_size: default_page_size(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RequestSettings {
    /// Build the retry policy described by these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Report output defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Default report format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportSelection>,

    /// Directory reports are written to when the prefix has no directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".sastop").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or fall back to the default
    /// location.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just yields the defaults.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(ConfigError::NotFound(p.to_string()).into());
                }
                Self::load_from(&path)
            }
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall or disable the engine
    pub fn validate(&self) -> Result<()> {
        if self.requests.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()).into());
        }
        if self.requests.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()).into());
        }
        if self.requests.max_attempts == 0 {
            return Err(
                ConfigError::Invalid("max_attempts must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Resolve the group to operate on: explicit flag first, then config.
    pub fn require_group_id<'a>(&'a self, flag: Option<&'a str>) -> Result<&'a str> {
        let group_id = flag
            .or(self.group_id.as_deref())
            .ok_or(ConfigError::MissingGroupId)?;
        Identifier::parse(group_id)
            .map_err(|message| ConfigError::Invalid(format!("group {}", message)))?;
        Ok(group_id)
    }
}
