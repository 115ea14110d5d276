//! Configuration management for hashfetch
//!
//! This module loads an optional TOML file and converts it into the runtime
//! configuration structs. Every setting has a default, so the tool runs
//! without any file at all; command-line flags override whatever the file
//! says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{ClientConfig, DispatchMode, PoolConfig};
use crate::constants::{config as paths, http, logging, pool, urls};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Pool settings
    pub pool: PoolConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// File this configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// TOML-friendly pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfigToml {
    /// Maximum concurrent fetches
    pub parallelism: i64,
    /// Per-fetch timeout in seconds
    pub request_timeout_secs: u64,
    /// Inputs at or above this length are rejected
    pub max_url_len: usize,
    /// `spawn-per-task` or `fixed-workers`
    pub dispatch_mode: DispatchMode,
}

impl Default for PoolConfigToml {
    fn default() -> Self {
        Self {
            parallelism: pool::DEFAULT_PARALLELISM as i64,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            max_url_len: urls::MAX_URL_LEN,
            dispatch_mode: DispatchMode::default(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            tcp_nodelay: true,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration:
    /// 1. Explicit file (must exist)
    /// 2. `./hashfetch.toml`
    /// 3. `<user config dir>/hashfetch/config.toml`
    /// 4. Built-in defaults
    ///
    /// Values are not validated here; command-line overrides are applied
    /// first, then [`validate`](Self::validate).
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Self::load_from_file(&path).await,
            None => Ok(Self::default()),
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(paths::LOCAL_CONFIG_FILE)];
        if let Some(user) = Self::default_config_path() {
            search_paths.push(user);
        }

        search_paths.into_iter().find(|path| path.exists())
    }

    /// The per-user config file path, if the platform has a config dir
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(paths::CONFIG_DIR_NAME).join(paths::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;

        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Reject values that cannot produce a working pool
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool.parallelism <= 0 {
            return Err(invalid(
                "pool.parallelism",
                self.pool.parallelism,
                "must be greater than zero",
            ));
        }

        if usize::try_from(self.pool.parallelism).map_or(true, |n| n > pool::MAX_PARALLELISM) {
            return Err(invalid(
                "pool.parallelism",
                self.pool.parallelism,
                &format!("must not exceed {}", pool::MAX_PARALLELISM),
            ));
        }

        if self.pool.request_timeout_secs == 0 {
            return Err(invalid(
                "pool.request_timeout_secs",
                self.pool.request_timeout_secs,
                "must be greater than zero",
            ));
        }

        if self.pool.max_url_len == 0 {
            return Err(invalid(
                "pool.max_url_len",
                self.pool.max_url_len,
                "must be greater than zero",
            ));
        }

        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(invalid(
                "logging.level",
                &self.logging.level,
                "expected one of error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }

    /// Validate, then convert to runtime configuration
    pub fn to_runtime_config(&self) -> ConfigResult<(PoolConfig, ClientConfig)> {
        self.validate()?;
        Ok((
            self.pool.to_runtime_config()?,
            self.client.to_runtime_config(&self.pool),
        ))
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl PoolConfigToml {
    /// Convert to runtime PoolConfig
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` if the values cannot size a pool.
    pub fn to_runtime_config(&self) -> ConfigResult<PoolConfig> {
        let parallelism = usize::try_from(self.parallelism)
            .map_err(|_| invalid("pool.parallelism", self.parallelism, "must be greater than zero"))?;

        let config = PoolConfig {
            parallelism,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_url_len: self.max_url_len,
            dispatch_mode: self.dispatch_mode,
        };
        config
            .validate()
            .map_err(|e| invalid("pool", self.parallelism, &e.to_string()))?;
        Ok(config)
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    ///
    /// reqwest's own timeout mirrors the pool's request timeout.
    pub fn to_runtime_config(&self, pool: &PoolConfigToml) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(pool.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..ClientConfig::default()
        }
    }
}
