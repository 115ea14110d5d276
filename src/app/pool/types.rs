//! Pool state and statistics types

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use serde::Serialize;

/// Lifecycle state of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolState {
    /// Created, dispatch loop not started
    Idle,
    /// Dispatch loop consuming input
    Dispatching,
    /// Cancellation observed, loop winding down
    Cancelled,
    /// Loop returned; queues still open
    Stopped,
    /// Queues closed, the pool is unusable
    Closed,
}

impl PoolState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PoolState::Idle,
            1 => PoolState::Dispatching,
            2 => PoolState::Cancelled,
            3 => PoolState::Stopped,
            _ => PoolState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PoolState::Idle => 0,
            PoolState::Dispatching => 1,
            PoolState::Cancelled => 2,
            PoolState::Stopped => 3,
            PoolState::Closed => 4,
        }
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Atomic holder for [`PoolState`]
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: PoolState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn get(&self) -> PoolState {
        PoolState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: PoolState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Move `from` → `to`; returns the observed state on mismatch
    pub(crate) fn transition(&self, from: PoolState, to: PoolState) -> Result<(), PoolState> {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(PoolState::from_u8)
    }
}

/// Running totals shared by the dispatcher and its units
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicUsize,
    pub(crate) dispatched: AtomicUsize,
    pub(crate) succeeded: AtomicUsize,
    pub(crate) failed: AtomicUsize,
    pub(crate) abandoned: AtomicUsize,
    pub(crate) undelivered: AtomicUsize,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of pool activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Tasks accepted by `send`
    pub submitted: usize,
    /// Tasks taken off the input queue by the dispatcher
    pub dispatched: usize,
    /// Results carrying a digest
    pub succeeded: usize,
    /// Results carrying an error
    pub failed: usize,
    /// Units dropped before admission because of cancellation
    pub abandoned: usize,
    /// Results produced after the output queue was closed
    pub undelivered: usize,
    /// Units holding the gate right now
    pub in_flight: usize,
    /// Highest number of units that ever held the gate at once
    pub peak_in_flight: usize,
}

impl PoolStats {
    /// Results produced so far, delivered or not
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Percentage of completed tasks that produced a digest
    pub fn success_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            n => self.succeeded as f64 / n as f64 * 100.0,
        }
    }
}

impl From<&Counters> for PoolStats {
    fn from(counters: &Counters) -> Self {
        Self {
            submitted: counters.submitted.load(Ordering::Relaxed),
            dispatched: counters.dispatched.load(Ordering::Relaxed),
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            abandoned: counters.abandoned.load(Ordering::Relaxed),
            undelivered: counters.undelivered.load(Ordering::Relaxed),
            in_flight: 0,
            peak_in_flight: 0,
        }
    }
}
