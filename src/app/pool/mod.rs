//! Bounded-concurrency fetch pool
//!
//! A [`Pool`] accepts raw URLs through a bounded input queue, runs one
//! fetch-and-digest unit per URL behind an admission gate of `parallelism`
//! slots, and hands the [`DigestResult`]s back through a bounded output
//! queue in completion order.
//!
//! Three parties drive a pool concurrently: producers calling
//! [`Pool::send`], the single dispatch loop [`Pool::run`], and a consumer
//! calling [`Pool::recv`]. Backpressure flows both ways. A full input queue
//! blocks `send`; a full output queue keeps a unit holding its gate slot,
//! which in turn throttles admission.
//!
//! # Module Organization
//!
//! - [`config`] - Pool configuration and builder
//! - [`gate`] - The admission gate (counting semaphore with occupancy tracking)
//! - [`types`] - Lifecycle state and statistics
//! - `dispatch` - The dispatch loop and the units it starts
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hashfetch::app::{HttpClient, Pool, PoolConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpClient::new()?);
//! let pool = Arc::new(Pool::new(PoolConfig::with_parallelism(3)?, client)?);
//!
//! let cancel = CancellationToken::new();
//! let dispatcher = pool.spawn_dispatcher(cancel.clone());
//!
//! let urls = ["adjust.com", "google.com"];
//! let producer = {
//!     let pool = Arc::clone(&pool);
//!     tokio::spawn(async move {
//!         for url in urls {
//!             pool.send(url).await;
//!         }
//!     })
//! };
//!
//! for _ in 0..urls.len() {
//!     if let Some(result) = pool.recv().await {
//!         println!("{}", result);
//!     }
//! }
//!
//! producer.await?;
//! cancel.cancel();
//! dispatcher.await??;
//! pool.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod dispatch;
pub mod gate;
pub mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::client::Client;
use crate::app::fetcher::Fetcher;
use crate::app::models::DigestResult;
use crate::errors::{PoolError, PoolResult};

pub use config::{DispatchMode, PoolConfig, PoolConfigBuilder};
pub use gate::{AdmissionGate, GatePermit};
pub use types::{PoolState, PoolStats};

use types::{Counters, StateCell};

/// Admission-gated fetch pool
///
/// Share it behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct Pool {
    config: PoolConfig,
    fetcher: Fetcher,
    gate: AdmissionGate,
    input_tx: mpsc::Sender<String>,
    /// Locked by the dispatch loop, or shared by the workers, while it runs
    input_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    output_tx: mpsc::Sender<DigestResult>,
    output_rx: Mutex<mpsc::Receiver<DigestResult>>,
    state: StateCell,
    counters: Arc<Counters>,
}

impl Pool {
    /// Create a pool whose queues and gate are all sized to
    /// `config.parallelism`
    ///
    /// # Errors
    ///
    /// Returns `PoolError` if the configuration fails validation, most
    /// notably when `parallelism` is zero.
    pub fn new(config: PoolConfig, client: Arc<dyn Client>) -> PoolResult<Self> {
        config.validate()?;

        let capacity = config.parallelism;
        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);
        let fetcher = Fetcher::new(client, config.request_timeout, config.max_url_len);

        debug!(
            "Created pool: parallelism {}, timeout {:?}, mode {}",
            capacity, config.request_timeout, config.dispatch_mode
        );

        Ok(Self {
            gate: AdmissionGate::new(capacity),
            config,
            fetcher,
            input_tx,
            input_rx: Arc::new(Mutex::new(input_rx)),
            output_tx,
            output_rx: Mutex::new(output_rx),
            state: StateCell::new(PoolState::Idle),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Enqueue one task, waiting while `parallelism` tasks are already
    /// buffered
    ///
    /// # Panics
    ///
    /// Panics if the pool has been closed. Submitting after `close` is a
    /// programming error, not a recoverable condition.
    pub async fn send(&self, url: impl Into<String>) {
        if self.state.get() == PoolState::Closed {
            panic!("Pool::send called after Pool::close");
        }

        if self.input_tx.send(url.into()).await.is_err() {
            panic!("Pool::send raced with Pool::close: input queue is closed");
        }
        Counters::bump(&self.counters.submitted);
    }

    /// Next completed result, in completion order
    ///
    /// Returns `None` only once the pool is closed and the output queue
    /// has been drained.
    pub async fn recv(&self) -> Option<DigestResult> {
        self.output_rx.lock().await.recv().await
    }

    /// Completed results as a stream
    pub fn results(&self) -> impl Stream<Item = DigestResult> + '_ {
        stream::unfold(self, |pool| async move {
            pool.recv().await.map(|result| (result, pool))
        })
    }

    /// Run the dispatch loop until `cancel` fires
    ///
    /// Units already admitted through the gate when cancellation is
    /// observed run to completion in the background and publish their
    /// results if the output queue has room. Units still waiting for a slot
    /// are dropped. Returns once cancellation is observed, without waiting
    /// for admitted units.
    ///
    /// # Errors
    ///
    /// `PoolError::AlreadyRunning` if a dispatch loop was started before,
    /// `PoolError::Closed` if the pool is closed.
    pub async fn run(&self, cancel: CancellationToken) -> PoolResult<()> {
        match self
            .state
            .transition(PoolState::Idle, PoolState::Dispatching)
        {
            Ok(()) => {}
            Err(PoolState::Closed) => return Err(PoolError::Closed),
            Err(state) => {
                return Err(PoolError::AlreadyRunning {
                    state: state.to_string(),
                })
            }
        }

        info!(
            "Dispatching with parallelism {} ({})",
            self.config.parallelism, self.config.dispatch_mode
        );

        // Buffered tasks stay queued for close() to drop
        match self.config.dispatch_mode {
            DispatchMode::SpawnPerTask => {
                let mut input_rx = self.input_rx.lock().await;
                self.dispatch_loop(&mut input_rx, &cancel).await;
            }
            DispatchMode::FixedWorkers => self.run_workers(&cancel).await,
        }

        self.state.set(PoolState::Stopped);

        let stats = self.stats();
        info!(
            "Dispatch loop stopped: {} dispatched, {} in flight, {} abandoned",
            stats.dispatched, stats.in_flight, stats.abandoned
        );
        Ok(())
    }

    /// Spawn [`run`](Self::run) on the current runtime
    pub fn spawn_dispatcher(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<PoolResult<()>> {
        let pool = Arc::clone(self);
        tokio::spawn(async move { pool.run(cancel).await })
    }

    /// Close both queues
    ///
    /// Buffered results can still be drained with [`recv`](Self::recv);
    /// results from units that finish later are discarded. Closing twice
    /// is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the dispatch loop is still running. Callers must stop
    /// producing and cancel the loop first; no `recv` may be pending.
    pub async fn close(&self) {
        match self.state.get() {
            PoolState::Dispatching | PoolState::Cancelled => {
                panic!("Pool::close called while the dispatch loop is running")
            }
            PoolState::Closed => {
                warn!("Pool::close called on a closed pool");
                return;
            }
            PoolState::Idle | PoolState::Stopped => {}
        }

        self.input_rx.lock().await.close();
        self.output_rx.lock().await.close();
        self.state.set(PoolState::Closed);

        debug!("Pool closed");
    }

    pub fn state(&self) -> PoolState {
        self.state.get()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn parallelism(&self) -> usize {
        self.config.parallelism
    }

    /// The admission gate, for observing occupancy
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Snapshot of pool activity
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            in_flight: self.gate.in_flight(),
            peak_in_flight: self.gate.peak(),
            ..PoolStats::from(self.counters.as_ref())
        }
    }
}
