//! URL validation and normalization
//!
//! Inputs are what a user types on a command line, so a missing scheme is
//! common and gets `http://` prepended. Everything else is handed to the
//! `url` crate unchanged; a URL that already carries a scheme keeps its exact
//! textual form so output lines match what the user supplied.

use std::fmt;

use url::{ParseError, Url};

use crate::constants::urls;
use crate::errors::{FetchError, FetchResult};

/// A task URL that passed validation
///
/// Keeps the textual form used for reporting next to the parsed form used
/// for the request. The two always describe the same resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    text: String,
    url: Url,
}

impl NormalizedUrl {
    /// Text as reported back to the caller
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parsed form handed to the HTTP client
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Validate `raw` and prefix a default scheme when it has none
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` when `raw` is `max_len` bytes or longer
/// (whatever its syntax) or when it does not parse as a URL, with or
/// without the default scheme.
///
/// # Examples
///
/// ```rust
/// use hashfetch::app::validate;
///
/// let url = validate("example.com", 2048)?;
/// assert_eq!(url.as_str(), "http://example.com");
///
/// let url = validate("https://example.com/a?b=c", 2048)?;
/// assert_eq!(url.as_str(), "https://example.com/a?b=c");
/// # Ok::<(), hashfetch::errors::FetchError>(())
/// ```
pub fn validate(raw: &str, max_len: usize) -> FetchResult<NormalizedUrl> {
    if raw.len() >= max_len {
        return Err(FetchError::invalid_url(
            truncate_for_report(raw),
            format!("url is too long ({} bytes, limit {})", raw.len(), max_len),
        ));
    }

    match Url::parse(raw) {
        Ok(url) => Ok(NormalizedUrl {
            text: raw.to_string(),
            url,
        }),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let text = format!("{}{}", urls::DEFAULT_SCHEME_PREFIX, raw);
            let url = Url::parse(&text).map_err(|e| FetchError::invalid_url(raw, e))?;
            Ok(NormalizedUrl { text, url })
        }
        Err(e) => Err(FetchError::invalid_url(raw, e)),
    }
}

// Oversized inputs would otherwise dominate every log and output line
fn truncate_for_report(raw: &str) -> String {
    const KEEP: usize = 64;
    match raw.char_indices().nth(KEEP) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}
