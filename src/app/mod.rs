//! Core application logic for hashfetch
//!
//! This module contains the fetch pipeline: URL validation, the HTTP client,
//! the per-task fetch-and-digest unit, and the admission-gated pool that runs
//! units concurrently.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use hashfetch::app::{Fetcher, HttpClient};
//! use hashfetch::constants::MAX_URL_LEN;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpClient::new()?);
//! let fetcher = Fetcher::new(client, Duration::from_secs(5), MAX_URL_LEN);
//!
//! let result = fetcher.process("adjust.com").await;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod fetcher;
pub mod hash;
pub mod models;
pub mod pool;
pub mod signals;
pub mod validate;

// Re-export main public API
pub use client::{Client, ClientConfig, HttpClient};
pub use fetcher::Fetcher;
pub use hash::Md5Hash;
pub use models::DigestResult;
pub use pool::{
    AdmissionGate, DispatchMode, Pool, PoolConfig, PoolConfigBuilder, PoolState,
    PoolStats,
};
pub use signals::SignalHandler;
pub use validate::{validate, NormalizedUrl};
