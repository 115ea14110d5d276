//! Error types for hashfetch
//!
//! Two families live here. [`FetchError`] is the per-task taxonomy: it is
//! never returned across a task boundary, it travels inside a
//! [`DigestResult`](crate::app::DigestResult). Everything else describes
//! failures of the tool itself (bad configuration, misuse of a pool) and
//! rolls up into [`AppError`].

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`FetchError`], convenient for comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Network,
    BodyRead,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidUrl => "invalid url",
            ErrorKind::Network => "network error",
            ErrorKind::BodyRead => "body read error",
        };
        f.write_str(name)
    }
}

/// Failure of a single fetch-and-digest task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Input could not be parsed or exceeds the length limit
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection, request or timeout failure
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response body could not be read to the end
    #[error("reading body of {url} failed: {reason}")]
    BodyRead { url: String, reason: String },
}

impl FetchError {
    pub fn invalid_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn network(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn body_read(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::BodyRead {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::BodyRead { .. } => ErrorKind::BodyRead,
        }
    }

    /// The human-readable cause without the URL prefix
    pub fn reason(&self) -> &str {
        match self {
            FetchError::InvalidUrl { reason, .. }
            | FetchError::Network { reason, .. }
            | FetchError::BodyRead { reason, .. } => reason,
        }
    }
}

/// HTTP client construction errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// reqwest refused the builder settings
    #[error("failed to build HTTP client")]
    Build(#[from] reqwest::Error),
}

/// Pool construction and lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Parallelism must be a positive integer
    #[error("parallelism must be greater than zero, got {value}")]
    InvalidParallelism { value: i64 },

    /// Configuration rejected by validation
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig { reason: String },

    /// `run` was called while another dispatch loop owns the input queue
    #[error("dispatch loop already started (state: {state})")]
    AlreadyRunning { state: String },

    /// Operation attempted on a closed pool
    #[error("pool is closed")]
    Closed,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Config file could not be read
    #[error("Failed to read configuration file")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Client(_) => "client",
            AppError::Pool(_) => "pool",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Per-task result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Pool result type alias
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Client result type alias
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
