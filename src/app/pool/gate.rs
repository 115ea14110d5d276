//! Admission gate bounding concurrently executing fetch units
//!
//! A counting semaphore with N permits plus two counters: how many permits
//! are held right now and the highest that number has ever been. The
//! counters make the concurrency bound observable from tests and stats.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Occupancy {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Fixed-capacity counting gate
///
/// Cloning yields another handle to the same gate.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    occupancy: Arc<Occupancy>,
    capacity: usize,
}

/// Proof of admission; dropping it releases the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    occupancy: Arc<Occupancy>,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            occupancy: Arc::new(Occupancy::default()),
            capacity,
        }
    }

    /// Wait until a slot is free and take it
    ///
    /// Waiters are served in FIFO order, so no waiter starves under a
    /// finite stream of tasks.
    pub async fn acquire(&self) -> GatePermit {
        // The semaphore is owned by the gate and never closed
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("admission semaphore is never closed"),
        };
        self.admit(permit)
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.admit(permit))
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> GatePermit {
        let now = self.occupancy.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.occupancy.peak.fetch_max(now, Ordering::SeqCst);
        GatePermit {
            _permit: permit,
            occupancy: Arc::clone(&self.occupancy),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.occupancy.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at once
    pub fn peak(&self) -> usize {
        self.occupancy.peak.load(Ordering::SeqCst)
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so in_flight
        // never reads above capacity
        self.occupancy.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
