//! # Runtime Event Hub
//!
//! The host side of the agent's runtime boundary. Whatever component of the
//! host performs stop-the-world collections (an arena compactor, a tracing
//! collector, a cache sweeper) reports each collection here through
//! [`RuntimeEventHub::collection_started`] and
//! [`RuntimeEventHub::collection_finished`].
//!
//! The hub keeps cumulative per-generation collection counts and fans every
//! event out to the listeners whose [`EventFilter`] matches. Dispatch happens
//! synchronously on the reporting thread. The listener list is published
//! through `arc-swap`, so reporting never takes a lock; only subscribing and
//! unsubscribing copy the list.

pub mod bridge;

use crate::core::{CollectionCounter, Generation};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Provider identity of events emitted by the hub's collection helpers.
pub const RUNTIME_PROVIDER: &str = "miniapm-runtime";
/// Keyword bit carried by collection start/end events.
pub const COLLECTION_KEYWORD: u64 = 0x1;
/// Event name of a collection start.
pub const COLLECTION_START: &str = "GCStart";
/// Event name of a collection end.
pub const COLLECTION_END: &str = "GCEnd";

/// A single notification from the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEvent {
    pub provider: &'static str,
    pub name: &'static str,
    pub keywords: u64,
    pub generation: Option<Generation>,
}

impl RuntimeEvent {
    pub fn collection_start(generation: Generation) -> Self {
        Self {
            provider: RUNTIME_PROVIDER,
            name: COLLECTION_START,
            keywords: COLLECTION_KEYWORD,
            generation: Some(generation),
        }
    }

    pub fn collection_end(generation: Generation) -> Self {
        Self {
            provider: RUNTIME_PROVIDER,
            name: COLLECTION_END,
            keywords: COLLECTION_KEYWORD,
            generation: Some(generation),
        }
    }
}

/// Selects the events a listener is interested in: same provider and at
/// least one keyword bit in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub provider: &'static str,
    pub keywords: u64,
}

impl EventFilter {
    pub fn collections() -> Self {
        Self {
            provider: RUNTIME_PROVIDER,
            keywords: COLLECTION_KEYWORD,
        }
    }

    pub fn matches(&self, event: &RuntimeEvent) -> bool {
        event.provider == self.provider && (event.keywords & self.keywords) != 0
    }
}

/// Receives runtime events on the thread that reported them.
///
/// Implementations must not block: the reporting thread belongs to the host.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &RuntimeEvent);
}

#[derive(Clone)]
struct Registration {
    id: u64,
    filter: EventFilter,
    listener: Arc<dyn EventListener>,
}

type Registrations = ArcSwap<Vec<Registration>>;

/// Process-wide source of collection counts and collection notifications.
pub struct RuntimeEventHub {
    listeners: Arc<Registrations>,
    next_id: AtomicU64,
    counts: [AtomicU64; 3],
}

impl RuntimeEventHub {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
            next_id: AtomicU64::new(1),
            counts: Default::default(),
        }
    }

    /// Registers `listener` for every future event matching `filter`.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe(&self, filter: EventFilter, listener: Arc<dyn EventListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = Registration {
            id,
            filter,
            listener,
        };
        self.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(registration.clone());
            next
        });
        debug!(subscription = id, provider = filter.provider, "Runtime event listener subscribed");

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.load().len()
    }

    /// Dispatches `event` to every matching listener.
    pub fn emit(&self, event: RuntimeEvent) {
        let listeners = self.listeners.load();
        for registration in listeners.iter() {
            if registration.filter.matches(&event) {
                registration.listener.on_event(&event);
            }
        }
    }

    /// Reports the start of a collection of `generation`.
    ///
    /// Collecting a generation also collects every younger one, so the counts
    /// of all generations up to and including `generation` advance.
    pub fn collection_started(&self, generation: Generation) {
        for count in &self.counts[..=generation.index()] {
            count.fetch_add(1, Ordering::Relaxed);
        }
        self.emit(RuntimeEvent::collection_start(generation));
    }

    /// Reports the end of the collection most recently started.
    pub fn collection_finished(&self, generation: Generation) {
        self.emit(RuntimeEvent::collection_end(generation));
    }
}

impl Default for RuntimeEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionCounter for RuntimeEventHub {
    fn collection_count(&self, generation: Generation) -> u64 {
        self.counts[generation.index()].load(Ordering::Relaxed)
    }
}

impl fmt::Debug for RuntimeEventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeEventHub")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Keeps a listener registered with a [`RuntimeEventHub`]. Dropping it
/// unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Registrations>,
}

impl Subscription {
    /// Unsubscribes now instead of at drop.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The hub may already be gone, in which case there is nothing to remove.
        if let Some(listeners) = self.listeners.upgrade() {
            let id = self.id;
            listeners.rcu(|current| {
                current
                    .iter()
                    .filter(|registration| registration.id != id)
                    .cloned()
                    .collect::<Vec<_>>()
            });
            debug!(subscription = id, "Runtime event listener unsubscribed");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
