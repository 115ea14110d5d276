//! hashfetch Library
//!
//! Fetches many URLs concurrently, at most N at a time, and reports the MD5
//! digest of each response body. The [`app::Pool`] does the work; the CLI in
//! `main.rs` is a thin layer over it.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
