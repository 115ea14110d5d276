//! hashfetch CLI application
//!
//! Fetches the URLs given on the command line concurrently and prints the
//! MD5 digest of each response body.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library
use hashfetch::cli::{handle_fetch, Cli};
use hashfetch::config::AppConfig;
use hashfetch::errors::Result;

/// Conventional exit status after SIGINT
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    match result {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Main application logic; returns the exit status
async fn run() -> Result<i32> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok(); // Ignore errors if file doesn't exist

    // Parse command line arguments
    let cli = Cli::parse_args();

    let config = AppConfig::load(cli.global.config.clone()).await?;

    // Initialize logging based on verbosity
    init_logging(&cli, &config);

    info!("hashfetch v{} starting", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No config file found; using defaults"),
    }

    let summary = handle_fetch(cli.fetch, config).await?;

    Ok(if summary.interrupted {
        EXIT_INTERRUPTED
    } else {
        0
    })
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = cli.log_level(&config.logging.level);

    // Create environment filter
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("hashfetch={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    // Logs go to stderr; stdout carries results only
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
