//! HTTP transport used by the fetch units
//!
//! The pool only ever sees the [`Client`] trait: one GET, full body in
//! memory, errors already classified as `Network` or `BodyRead`. The
//! production implementation is [`HttpClient`] over reqwest; tests plug in
//! in-memory clients.
//!
//! - `config`: reqwest client configuration and building

use std::fmt::Debug;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::errors::{ClientResult, FetchError, FetchResult};

pub mod config;

pub use config::ClientConfig;

/// Capability to fetch a URL and return its complete body
#[async_trait]
pub trait Client: Send + Sync + Debug {
    /// Issue a GET for `url` and read the whole body
    ///
    /// # Errors
    ///
    /// `FetchError::Network` if the request cannot be sent or no response
    /// arrives, `FetchError::BodyRead` if the body stream fails midway.
    async fn get(&self, url: &Url) -> FetchResult<Vec<u8>>;
}

/// reqwest-backed [`Client`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a client with default settings
    pub fn new() -> ClientResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a client from an explicit configuration
    pub fn with_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn get(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::network(url.as_str(), describe(&e)))?;

        // Any status carries a body worth digesting; it is only logged
        debug!("GET {} -> {}", url, response.status());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::body_read(url.as_str(), describe(&e)))?;

        Ok(bytes.to_vec())
    }
}

// reqwest's Display stops at the outermost layer; include the cause chain
fn describe(error: &reqwest::Error) -> String {
    use std::error::Error;

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
