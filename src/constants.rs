//! Application constants for hashfetch
//!
//! Defaults only. Anything a caller can change lives in the runtime
//! configuration structs ([`PoolConfig`](crate::app::PoolConfig),
//! [`ClientConfig`](crate::app::ClientConfig)); these values seed them.

use std::time::Duration;

/// URL validation limits
pub mod urls {
    /// URLs at or above this many bytes are rejected; several browsers
    /// refuse to load anything longer.
    pub const MAX_URL_LEN: usize = 2048;

    /// Scheme prepended to inputs that carry none
    pub const DEFAULT_SCHEME_PREFIX: &str = "http://";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("hashfetch/", env!("CARGO_PKG_VERSION"));

    /// Upper bound on a single fetch, from connect to last body byte
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections kept per host
    pub const POOL_MAX_PER_HOST: usize = 16;
}

/// Concurrency configuration
pub mod pool {
    /// Default number of concurrently executing fetches
    pub const DEFAULT_PARALLELISM: usize = 10;

    /// Largest parallelism the admission gate and queues can be sized to
    pub const MAX_PARALLELISM: usize = tokio::sync::Semaphore::MAX_PERMITS;
}

/// Logging defaults
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "hashfetch.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "hashfetch";

    /// File name inside [`CONFIG_DIR_NAME`]
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use pool::DEFAULT_PARALLELISM;
pub use urls::MAX_URL_LEN;
