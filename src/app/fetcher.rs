//! The per-task fetch-and-digest unit
//!
//! validate → GET with timeout → full body → MD5. Every step short-circuits
//! into a [`DigestResult`]; nothing here returns an error to the caller and
//! nothing retries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::client::Client;
use crate::app::hash::Md5Hash;
use crate::app::models::DigestResult;
use crate::app::validate::validate;
use crate::errors::FetchError;

/// Runs one task against a shared [`Client`]
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Arc<dyn Client>,
    request_timeout: Duration,
    max_url_len: usize,
}

impl Fetcher {
    pub fn new(client: Arc<dyn Client>, request_timeout: Duration, max_url_len: usize) -> Self {
        Self {
            client,
            request_timeout,
            max_url_len,
        }
    }

    /// Fetch `raw` and digest its body
    ///
    /// The result is keyed by the raw input when validation fails and by
    /// the normalized URL otherwise.
    pub async fn process(&self, raw: &str) -> DigestResult {
        let url = match validate(raw, self.max_url_len) {
            Ok(url) => url,
            Err(e) => {
                debug!("Rejected {:?}: {}", raw, e.reason());
                return DigestResult::failure(raw, e);
            }
        };

        let started = Instant::now();
        let fetched = tokio::time::timeout(self.request_timeout, self.client.get(url.as_url())).await;

        let body = match fetched {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                debug!("Fetch of {} failed: {}", url, e);
                return DigestResult::failure(url.into_string(), e);
            }
            Err(_) => {
                let error = FetchError::network(
                    url.as_str(),
                    format!("timed out after {:?}", self.request_timeout),
                );
                debug!("{}", error);
                return DigestResult::failure(url.into_string(), error);
            }
        };

        let digest = Md5Hash::compute(&body);
        debug!(
            "Digested {} ({} bytes in {:?}): {}",
            url,
            body.len(),
            started.elapsed(),
            digest
        );

        DigestResult::success(url.into_string(), digest)
    }
}
