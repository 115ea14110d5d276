//! Command handler for the hashfetch CLI
//!
//! Wires the parsed arguments and the loaded configuration to a [`Pool`]:
//! a producer task feeds URLs in, the handler prints results as they
//! complete, and a signal handler can cut the run short.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{DigestResult, HttpClient, Pool, PoolStats, SignalHandler};
use crate::cli::{FetchArgs, OutputFormat};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Poll interval while waiting for admitted fetches after an interrupt
const SETTLE_INTERVAL: Duration = Duration::from_millis(25);

/// What a finished run reports back to `main`
#[derive(Debug, Clone)]
pub struct FetchSummary {
    /// Final pool statistics
    pub stats: PoolStats,
    /// A signal stopped the run before every URL was processed
    pub interrupted: bool,
}

/// Handle the fetch command
///
/// Prints one line per URL in completion order. Per-URL failures are part
/// of the output, not errors; only setup problems return `Err`.
pub async fn handle_fetch(args: FetchArgs, mut config: AppConfig) -> Result<FetchSummary> {
    let start_time = Instant::now();

    args.validate().map_err(AppError::generic)?;
    args.apply_to(&mut config.pool);

    let (pool_config, client_config) = config.to_runtime_config()?;
    info!(
        "Fetching {} URLs with parallelism {}",
        args.urls.len(),
        pool_config.parallelism
    );

    let client = Arc::new(HttpClient::with_config(&client_config)?);
    let pool = Arc::new(Pool::new(pool_config, client)?);

    let cancel = CancellationToken::new();
    let signals = SignalHandler::new(cancel.clone());
    let signal_task = signals.setup();

    let dispatcher = pool.spawn_dispatcher(cancel.clone());
    let producer = spawn_producer(Arc::clone(&pool), args.urls.clone(), cancel.clone());
    let printer = Printer::new(args.format);

    let expected = args.urls.len();
    let mut printed = 0;
    while printed < expected {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = pool.recv() => match result {
                Some(result) => {
                    printer.emit(&result)?;
                    printed += 1;
                }
                None => break,
            },
        }
    }

    let interrupted = signals.interrupted();
    cancel.cancel();

    if let Err(e) = producer.await {
        warn!("Producer task failed: {}", e);
    }
    match dispatcher.await {
        Ok(result) => result?,
        Err(e) => return Err(AppError::generic(format!("dispatch loop failed: {}", e))),
    }

    if interrupted {
        info!("Interrupted; waiting for {} admitted fetches", pool.gate().in_flight());
        drain_in_flight(&pool, &printer).await?;
    }

    pool.close().await;
    while let Some(result) = pool.recv().await {
        printer.emit(&result)?;
    }
    signal_task.abort();

    let stats = pool.stats();
    info!(
        "Done in {:?}: {} succeeded, {} failed, {} abandoned",
        start_time.elapsed(),
        stats.succeeded,
        stats.failed,
        stats.abandoned
    );

    Ok(FetchSummary { stats, interrupted })
}

/// Feed URLs into the pool until they run out or the run is cancelled
fn spawn_producer(pool: Arc<Pool>, urls: Vec<String>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        for url in urls {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Producer stopped by cancellation");
                    return;
                }
                _ = pool.send(url) => {}
            }
        }
    })
}

/// Print results from admitted fetches until none hold the gate
///
/// A unit publishes before it releases its slot, so an empty gate means
/// every admitted result is already in the output queue.
async fn drain_in_flight(pool: &Pool, printer: &Printer) -> Result<()> {
    while pool.gate().in_flight() > 0 {
        tokio::select! {
            Some(result) = pool.recv() => printer.emit(&result)?,
            _ = tokio::time::sleep(SETTLE_INTERVAL) => {}
        }
    }
    Ok(())
}

/// Writes results to stdout in the selected format
#[derive(Debug, Clone, Copy)]
struct Printer {
    format: OutputFormat,
}

impl Printer {
    fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit(&self, result: &DigestResult) -> Result<()> {
        let line = self.render(result)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        Ok(())
    }

    fn render(&self, result: &DigestResult) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(result.to_string()),
            OutputFormat::Json => serde_json::to_string(result)
                .map_err(|e| AppError::generic(format!("failed to encode result: {}", e))),
        }
    }
}
