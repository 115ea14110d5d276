//! Command-line interface components
//!
//! This module contains CLI-specific code for hashfetch: argument parsing
//! and the handler that drives a pool from the command line.

pub mod args;
pub mod commands;

pub use args::{Cli, FetchArgs, GlobalArgs, OutputFormat};
pub use commands::{handle_fetch, FetchSummary};
