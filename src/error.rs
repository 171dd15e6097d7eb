//! Error types for sastop

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for sastop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

impl Error {
    /// Whether this error must stop the whole process rather than one target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_fatal())
    }
}

/// Remote API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check the token in SNYK_TOKEN or --token.")]
    Unauthorized,

    #[error("Rate limit still exceeded after {attempts} attempts")]
    RateLimited {
        attempts: u32,
        /// Server-provided `Retry-After` hint, if any
        retry_after: Option<Duration>,
    },

    #[error("Request for {target} rejected ({status}): {message}")]
    ClientError {
        target: String,
        status: u16,
        message: String,
    },

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Rate limiting and transient faults are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::Transient(_))
    }

    /// Authentication failures cannot succeed on any target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transient("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Transient("Failed to connect to API".to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Transient(err.to_string())
        }
    }
}

/// A single rejected record in a bulk input file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ValidationError {
    /// 1-based line (text/CSV) or record (JSON) number
    pub line: usize,
    pub message: String,
}

impl ValidationError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Errors that make a whole input source unusable
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported input format for {}: {hint}", path.display())]
    UnsupportedFormat { path: PathBuf, hint: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(ValidationError),

    #[error("No valid targets found in {0}")]
    Empty(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("API token not configured. Set SNYK_TOKEN or pass --token.")]
    MissingToken,

    #[error("Group not configured. Pass --group or set group_id in the config file.")]
    MissingGroupId,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
