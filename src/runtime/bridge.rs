//! Turns collection start/end notifications into pause durations.
//!
//! Only the most recent open collection is tracked: a second start before an
//! end replaces the pending timestamp, and an end without a pending start
//! (for example, when the subscription began mid-collection) is dropped.

use super::{EventFilter, EventListener, RuntimeEvent, RuntimeEventHub, Subscription, COLLECTION_END, COLLECTION_START};
use crate::pause::PauseAggregator;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Marker stored in `pending_start` while no collection is open.
const NO_PENDING_START: u64 = 0;

/// Feeds collection pauses observed on a [`RuntimeEventHub`] into a
/// [`PauseAggregator`].
#[derive(Debug)]
pub struct RuntimeEventBridge {
    state: Arc<BridgeState>,
    subscription: Option<Subscription>,
}

impl RuntimeEventBridge {
    /// Subscribes to the collection events of `hub`.
    pub fn attach(hub: &RuntimeEventHub, aggregator: Arc<PauseAggregator>) -> Self {
        let state = Arc::new(BridgeState {
            epoch: Instant::now(),
            pending_start: AtomicU64::new(NO_PENDING_START),
            active: AtomicBool::new(true),
            aggregator,
        });
        let subscription = hub.subscribe(EventFilter::collections(), state.clone());
        debug!("Runtime event bridge attached.");

        Self {
            state,
            subscription: Some(subscription),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }

    /// Stops recording pauses and unsubscribes from the hub. Calling it again
    /// does nothing.
    ///
    /// Events dispatched after this returns are ignored. A callback already
    /// past its `active` check on another thread may still complete and record
    /// one last pause; the aggregator it writes to belongs to the pipeline
    /// being torn down and is never snapshotted again.
    pub fn dispose(&mut self) {
        self.state.active.store(false, Ordering::Release);
        self.state.pending_start.store(NO_PENDING_START, Ordering::Release);
        if self.subscription.take().is_some() {
            debug!("Runtime event bridge detached.");
        }
    }
}

impl Drop for RuntimeEventBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug)]
struct BridgeState {
    epoch: Instant,
    /// Nanoseconds since `epoch` plus one, or `NO_PENDING_START`.
    pending_start: AtomicU64,
    active: AtomicBool,
    aggregator: Arc<PauseAggregator>,
}

impl BridgeState {
    fn now_ticks(&self) -> u64 {
        let nanos = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX - 1);
        nanos.saturating_add(1)
    }
}

impl EventListener for BridgeState {
    fn on_event(&self, event: &RuntimeEvent) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        match event.name {
            COLLECTION_START => {
                self.pending_start.store(self.now_ticks(), Ordering::Release);
            }
            COLLECTION_END => {
                let start = self.pending_start.swap(NO_PENDING_START, Ordering::AcqRel);
                if start == NO_PENDING_START {
                    trace!("Collection end without a pending start, ignoring.");
                    return;
                }
                let pause = Duration::from_nanos(self.now_ticks().saturating_sub(start));
                self.aggregator.record_pause(pause);
            }
            _ => {}
        }
    }
}
