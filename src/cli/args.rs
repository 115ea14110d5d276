//! Command-line argument parsing for hashfetch
//!
//! A single command: every positional argument is a URL to fetch. Global
//! options control logging and the configuration file; fetch options
//! override the matching configuration values.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use crate::app::DispatchMode;
use crate::config::PoolConfigToml;

/// hashfetch - MD5 digests of many URLs, fetched concurrently
#[derive(Parser, Debug)]
#[command(
    name = "hashfetch",
    version,
    about = "Fetch URLs concurrently and print the MD5 digest of each response body",
    long_about = "Fetches every URL given on the command line, at most --parallel at a time, and prints \
one line per URL in completion order: the URL followed by the MD5 digest of its response body, \
or a description of why it could not be digested."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Fetch options
    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Logging and configuration options
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// How results are written to stdout
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `<url> <digest>` or `could not digest <url>: <reason>`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Arguments for fetching
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Maximum number of concurrent fetches [default: 10]
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub parallel: Option<i64>,

    /// Per-request timeout in seconds [default: 5]
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Dispatch strategy: spawn-per-task or fixed-workers
    #[arg(long, value_name = "MODE")]
    pub dispatch_mode: Option<DispatchMode>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// URLs to fetch; a missing scheme defaults to http://
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level; flags win over the configured level
    pub fn log_level(&self, configured: &str) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            configured.parse().unwrap_or(tracing::Level::WARN)
        }
    }
}

impl FetchArgs {
    /// Reject arguments that cannot start a run
    pub fn validate(&self) -> Result<(), String> {
        if self.urls.is_empty() {
            return Err("No URLs given. Usage: hashfetch [--parallel N] URL...".to_string());
        }

        if let Some(parallel) = self.parallel {
            if parallel <= 0 {
                return Err(format!(
                    "--parallel must be greater than 0, got {}",
                    parallel
                ));
            }
        }

        if self.timeout == Some(0) {
            return Err("--timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Override configured pool values with the ones given on the command line
    pub fn apply_to(&self, pool: &mut PoolConfigToml) {
        if let Some(parallel) = self.parallel {
            pool.parallelism = parallel;
        }
        if let Some(timeout) = self.timeout {
            pool.request_timeout_secs = timeout;
        }
        if let Some(mode) = self.dispatch_mode {
            pool.dispatch_mode = mode;
        }
    }
}
