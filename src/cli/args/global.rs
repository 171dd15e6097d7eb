//! Global CLI options shared across all commands
//!
//! Consolidates the global flags into one struct so handler signatures stay
//! small. Precedence is CLI flag > environment variable > config file >
//! default; this struct captures the flag/env layer and `CommandContext`
//! resolves the rest.

use std::fmt;

use crate::cli::{Cli, OutputFormat};
use crate::client::CancelToken;

/// Global CLI options passed to all command handlers.
#[derive(Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// API token; never written to disk
    pub token: Option<String>,

    /// Custom config file path (defaults to ~/.sastop/config.yaml)
    pub config: Option<String>,

    /// Custom API host for proxies and testing
    pub api_host: Option<String>,

    /// Concurrency override
    pub concurrency: Option<usize>,

    /// Tripped by Ctrl-C
    pub cancel: CancelToken,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    ///
    /// Called once in main.rs after parsing. The cancel token is the one the
    /// interrupt handler trips.
    pub fn from_cli(cli: &Cli, cancel: CancelToken) -> Self {
        Self {
            format: cli.format,
            token: cli.token.clone(),
            config: cli.config.clone(),
            api_host: cli.api_host.clone(),
            concurrency: cli.concurrency,
            cancel,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get API host override as `Option<&str>`.
    pub fn api_host_ref(&self) -> Option<&str> {
        self.api_host.as_deref()
    }

    /// Get the token, treating an empty value as absent.
    pub fn token_ref(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for GlobalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalOptions")
            .field("format", &self.format)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("config", &self.config)
            .field("api_host", &self.api_host)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
