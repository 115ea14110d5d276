//! Dispatch loop and fetch units
//!
//! In `SpawnPerTask` mode the loop starts one unit per task taken off the
//! input queue; each unit waits for a gate slot, fetches, publishes and then
//! releases the slot. In `FixedWorkers` mode `parallelism` workers share
//! the input queue and run units back to back.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::gate::AdmissionGate;
use super::types::{Counters, PoolState};
use super::Pool;
use crate::app::fetcher::Fetcher;
use crate::app::models::DigestResult;

/// Everything a running unit needs, detached from the pool's lifetime
#[derive(Debug, Clone)]
struct Unit {
    fetcher: Fetcher,
    gate: AdmissionGate,
    output: mpsc::Sender<DigestResult>,
    counters: Arc<Counters>,
}

impl Unit {
    /// Wait for admission unless cancelled first, then execute
    async fn admit_and_execute(self, raw: String, cancel: CancellationToken) {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Counters::bump(&self.counters.abandoned);
                debug!("Abandoned {:?}: cancelled before admission", raw);
                return;
            }
            permit = self.gate.acquire() => permit,
        };

        self.execute(&raw).await;

        // Held until the result is published
        drop(permit);
    }

    /// Fetch, digest and publish one task
    async fn execute(&self, raw: &str) {
        let result = self.fetcher.process(raw).await;

        if result.is_success() {
            Counters::bump(&self.counters.succeeded);
        } else {
            Counters::bump(&self.counters.failed);
        }

        if let Err(mpsc::error::SendError(result)) = self.output.send(result).await {
            Counters::bump(&self.counters.undelivered);
            debug!("Output queue closed, dropping result for {}", result.url());
        }
    }
}

impl Pool {
    fn unit(&self) -> Unit {
        Unit {
            fetcher: self.fetcher.clone(),
            gate: self.gate.clone(),
            output: self.output_tx.clone(),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Take tasks until cancelled, starting one unit per task
    pub(super) async fn dispatch_loop(
        &self,
        input: &mut mpsc::Receiver<String>,
        cancel: &CancellationToken,
    ) {
        loop {
            let raw = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state.set(PoolState::Cancelled);
                    debug!("Dispatch loop observed cancellation");
                    break;
                }
                next = input.recv() => match next {
                    Some(raw) => raw,
                    None => {
                        debug!("Input queue closed");
                        break;
                    }
                },
            };

            Counters::bump(&self.counters.dispatched);
            trace!("Dispatching {:?}", raw);

            tokio::spawn(self.unit().admit_and_execute(raw, cancel.clone()));
        }
    }

    /// Run `parallelism` workers over the shared input queue until
    /// cancelled
    ///
    /// Returns as soon as cancellation is observed. A worker still busy
    /// with a task finishes it in the background, like an admitted unit
    /// in `SpawnPerTask` mode, and takes nothing new afterwards.
    pub(super) async fn run_workers(&self, cancel: &CancellationToken) {
        for worker_id in 0..self.config.parallelism {
            tokio::spawn(worker_loop(
                worker_id,
                self.unit(),
                Arc::clone(&self.input_rx),
                cancel.clone(),
            ));
        }

        cancel.cancelled().await;
        self.state.set(PoolState::Cancelled);
        debug!(
            "Workers cancelled; {} still finishing a task",
            self.gate.in_flight()
        );
    }
}

async fn worker_loop(
    worker_id: usize,
    unit: Unit,
    input: Arc<Mutex<mpsc::Receiver<String>>>,
    cancel: CancellationToken,
) {
    trace!("Worker {} started", worker_id);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = async { input.lock().await.recv().await } => next,
        };

        let Some(raw) = next else {
            break;
        };

        Counters::bump(&unit.counters.dispatched);

        // Workers never outnumber slots, so this does not wait
        let permit = unit.gate.acquire().await;
        unit.execute(&raw).await;
        drop(permit);
    }

    trace!("Worker {} stopped", worker_id);
}
