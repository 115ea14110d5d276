//! reqwest client settings for digest fetches

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{ClientError, ClientResult};

/// Settings applied when building the shared reqwest client
///
/// One client serves every fetch unit of a pool, so the idle-connection
/// limit should be at least the pool's parallelism to keep connections to
/// a busy host warm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub user_agent: String,
    /// Disable Nagle's algorithm; requests are small and latency bound
    pub tcp_nodelay: bool,
    pub tcp_keepalive: Option<Duration>,
    pub pool_idle_timeout: Option<Duration>,
    /// Idle connections kept per host
    pub pool_max_per_host: usize,
    /// Ceiling reqwest enforces on its own; the fetch unit applies the
    /// pool's timeout on top
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            tcp_nodelay: true,
            tcp_keepalive: Some(Duration::from_secs(30)),
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults with both timeouts capped at `timeout`
    pub fn for_timeout(timeout: Duration) -> Self {
        let defaults = Self::default();
        Self {
            request_timeout: timeout,
            connect_timeout: defaults.connect_timeout.min(timeout),
            ..defaults
        }
    }

    /// Build the reqwest client
    ///
    /// Redirects follow reqwest's default policy; the digest is taken over
    /// the final response body.
    pub fn build_http_client(&self) -> ClientResult<Client> {
        let builder = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .tcp_nodelay(self.tcp_nodelay)
            .tcp_keepalive(self.tcp_keepalive)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_per_host);

        builder.build().map_err(ClientError::Build)
    }
}
