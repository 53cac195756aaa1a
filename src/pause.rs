//! Lock-free accumulation of collection pauses.
//!
//! The aggregator sits between two independent flows: the runtime event
//! callback, which records pauses on whatever thread the host reports them
//! from, and the scheduler tick, which drains the accumulated values once per
//! interval. Neither side ever blocks the other.
//!
//! ## Snapshot race
//!
//! [`PauseAggregator::snapshot_and_reset`] swaps each counter with zero one
//! after another. A pause recorded while the snapshot is in progress can
//! therefore land in the snapshot's total but not its max (or count), or be
//! attributed entirely to the next interval. This bounded inaccuracy at the
//! window boundary is accepted; making the reset jointly atomic would need a
//! lock shared with the event callback.

use crate::core::PauseSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Accumulates pause durations between snapshots.
#[derive(Debug, Default)]
pub struct PauseAggregator {
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
    count: AtomicU64,
}

impl PauseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a single pause. Safe to call from any number of threads.
    pub fn record_pause(&self, pause: Duration) {
        let nanos = duration_to_nanos(pause);

        self.total_nanos.fetch_add(nanos, Ordering::AcqRel);
        self.count.fetch_add(1, Ordering::AcqRel);
        raise_to(&self.max_nanos, nanos);
    }

    /// Returns the values accumulated since the previous snapshot and resets
    /// every counter to zero.
    pub fn snapshot_and_reset(&self) -> PauseSnapshot {
        let total = self.total_nanos.swap(0, Ordering::AcqRel);
        let max = self.max_nanos.swap(0, Ordering::AcqRel);
        let count = self.count.swap(0, Ordering::AcqRel);

        PauseSnapshot {
            total: Duration::from_nanos(total),
            max: Duration::from_nanos(max),
            count,
        }
    }
}

/// Raises `target` to `candidate` unless it already holds something larger.
///
/// Read, compare, swap; on a lost race re-read and give up as soon as a
/// concurrent writer has already stored a value at least as large.
fn raise_to(target: &AtomicU64, candidate: u64) {
    let mut current = target.load(Ordering::Acquire);
    while candidate > current {
        match target.compare_exchange_weak(current, candidate, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
