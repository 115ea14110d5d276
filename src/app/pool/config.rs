//! Pool configuration management
//!
//! Everything that shapes a pool is fixed at construction: the parallelism
//! (which sizes both queues and the gate), the per-request timeout, the URL
//! length limit and the dispatch strategy.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{http, pool, urls};
use crate::errors::{PoolError, PoolResult};

/// How submitted tasks are turned into running units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// One lightweight task per submission, admitted through the gate
    #[default]
    SpawnPerTask,
    /// `parallelism` long-lived workers pulling from the input queue
    FixedWorkers,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::SpawnPerTask => f.write_str("spawn-per-task"),
            DispatchMode::FixedWorkers => f.write_str("fixed-workers"),
        }
    }
}

impl FromStr for DispatchMode {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spawn-per-task" => Ok(DispatchMode::SpawnPerTask),
            "fixed-workers" => Ok(DispatchMode::FixedWorkers),
            other => Err(PoolError::InvalidConfig {
                reason: format!("unknown dispatch mode {:?}", other),
            }),
        }
    }
}

/// Configuration for a [`Pool`](super::Pool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum concurrently executing fetches; also the capacity of the
    /// input and output queues
    pub parallelism: usize,
    /// Upper bound on one fetch including the body read
    pub request_timeout: Duration,
    /// Inputs this long or longer are rejected without a request
    pub max_url_len: usize,
    /// Dispatch strategy
    pub dispatch_mode: DispatchMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            parallelism: pool::DEFAULT_PARALLELISM,
            request_timeout: http::DEFAULT_TIMEOUT,
            max_url_len: urls::MAX_URL_LEN,
            dispatch_mode: DispatchMode::default(),
        }
    }
}

impl PoolConfig {
    /// Configuration with the given parallelism and defaults elsewhere
    ///
    /// Takes a signed value because callers usually forward user input;
    /// anything below one is rejected.
    pub fn with_parallelism(parallelism: i64) -> PoolResult<Self> {
        if parallelism <= 0 {
            return Err(PoolError::InvalidParallelism { value: parallelism });
        }
        let parallelism = usize::try_from(parallelism).map_err(|_| PoolError::InvalidConfig {
            reason: format!("parallelism {} does not fit in usize", parallelism),
        })?;
        let config = Self {
            parallelism,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> PoolResult<()> {
        if self.parallelism == 0 {
            return Err(PoolError::InvalidParallelism { value: 0 });
        }

        if self.parallelism > pool::MAX_PARALLELISM {
            return Err(PoolError::InvalidConfig {
                reason: format!(
                    "parallelism {} exceeds the maximum of {}",
                    self.parallelism,
                    pool::MAX_PARALLELISM
                ),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(PoolError::InvalidConfig {
                reason: "request timeout must be greater than zero".to_string(),
            });
        }

        if self.max_url_len == 0 {
            return Err(PoolError::InvalidConfig {
                reason: "maximum URL length must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for PoolConfig
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_url_len(mut self, len: usize) -> Self {
        self.config.max_url_len = len;
        self
    }

    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.config.dispatch_mode = mode;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> PoolResult<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
