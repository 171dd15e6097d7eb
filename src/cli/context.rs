//! Command execution context
//!
//! Provides a unified context for command execution: config loading, token
//! validation, client construction and the settings every handler needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{CancelToken, RetryingClient, SastApi, SnykClient};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::output::report::ReportSelection;

/// Context for command execution containing config, client, and runtime options.
pub struct CommandContext {
    /// Loaded and validated configuration
    pub config: Config,
    /// Authenticated API client with retries (Arc-wrapped for parallel request support)
    pub client: Arc<RetryingClient<SnykClient>>,
    /// Output format preference
    pub format: OutputFormat,
    /// Effective concurrency bound
    pub concurrency: usize,
    /// Tripped by Ctrl-C or an authentication failure
    pub cancel: CancelToken,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// Loads the config file, resolves the token, API host and concurrency
    /// (flag/env first, then config), and builds the retrying client.
    ///
    /// # Errors
    /// Returns error if the config cannot be loaded, the token is missing or
    /// the concurrency override is zero.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;
        let token = opts.token_ref().ok_or(ConfigError::MissingToken)?;

        let concurrency = opts.concurrency.unwrap_or(config.requests.concurrency);
        if concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()).into());
        }

        let api_host = opts.api_host_ref().or(config.api_host.as_deref());
        let raw_client = SnykClient::new(token, api_host, config.requests.page_size)?;
        let client = Arc::new(RetryingClient::new(
            raw_client,
            config.requests.retry_policy(),
        ));

        debug!(
            "Command context ready: host={}, concurrency={}",
            api_host.unwrap_or(crate::client::snyk::DEFAULT_API_HOST),
            concurrency
        );

        Ok(Self {
            config,
            client,
            format: opts.format,
            concurrency,
            cancel: opts.cancel.clone(),
        })
    }

    /// The client as the trait object the engines take.
    pub fn api(&self) -> &dyn SastApi {
        self.client.as_ref()
    }

    /// Report format: flag first, then config, then JSON.
    pub fn report_selection(&self, flag: Option<ReportSelection>) -> ReportSelection {
        flag.or(self.config.report.format).unwrap_or_default()
    }

    /// Report file prefix.
    ///
    /// A bare file name is placed under the configured `output_dir`; a prefix
    /// that already names a directory is used as given.
    pub fn report_prefix(&self, flag: Option<&Path>, default_name: &str) -> PathBuf {
        let prefix = flag.unwrap_or_else(|| Path::new(default_name));
        let has_dir = prefix
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());

        match &self.config.report.output_dir {
            Some(dir) if !has_dir && !prefix.is_absolute() => dir.join(prefix),
            _ => prefix.to_path_buf(),
        }
    }
}
