//! Data models for hashfetch
//!
//! [`DigestResult`] is the only value that crosses from a fetch unit back to
//! the caller. It is immutable once built and owned by whoever holds it.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::app::hash::Md5Hash;
use crate::errors::{ErrorKind, FetchError};

/// Outcome of one fetch-and-digest task
///
/// Exactly one of digest or error is present; the type enforces it by
/// holding a `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    url: String,
    outcome: Result<Md5Hash, FetchError>,
}

impl DigestResult {
    pub fn success(url: impl Into<String>, digest: Md5Hash) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(digest),
        }
    }

    pub fn failure(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            outcome: Err(error),
        }
    }

    /// Normalized URL, or the raw input when it failed validation
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn digest(&self) -> Option<&Md5Hash> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(FetchError::kind)
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn outcome(&self) -> &Result<Md5Hash, FetchError> {
        &self.outcome
    }

    pub fn into_parts(self) -> (String, Result<Md5Hash, FetchError>) {
        (self.url, self.outcome)
    }
}

/// One output line: `<url> <hex>` or `could not digest <url>: <reason>`
impl fmt::Display for DigestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(digest) => write!(f, "{} {}", self.url, digest),
            Err(error) => write!(f, "could not digest {}: {}", self.url, error.reason()),
        }
    }
}

#[derive(Serialize)]
struct ErrorView<'a> {
    kind: ErrorKind,
    reason: &'a str,
}

#[derive(Serialize)]
struct DigestResultView<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<&'a Md5Hash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorView<'a>>,
}

impl Serialize for DigestResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        DigestResultView {
            url: &self.url,
            digest: self.digest(),
            error: self.error().map(|e| ErrorView {
                kind: e.kind(),
                reason: e.reason(),
            }),
        }
        .serialize(serializer)
    }
}
