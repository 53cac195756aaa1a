//! A metrics recorder that periodically logs all captured gauges.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A metrics recorder that keeps every gauge in an atomic registry.
///
/// Logging is done by a separate [`GaugeLogger`], so the recorder can be
/// installed first and the logging task spawned only once installation
/// succeeded.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new(AtomicStorage)),
        }
    }

    /// A logger reading this recorder's gauges.
    pub fn gauge_logger(&self) -> GaugeLogger {
        GaugeLogger {
            registry: self.registry.clone(),
        }
    }

    /// Current value of the gauge called `name`, if it was ever set.
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        snapshot(&self.registry)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically logs the gauges of a [`LoggingRecorder`] through
/// `tracing::info!`.
pub struct GaugeLogger {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl GaugeLogger {
    /// Starts a background task logging every gauge once per `log_interval`
    /// until `shutdown_rx` fires or its sender is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, log_interval: Duration, mut shutdown_rx: watch::Receiver<()>) -> JoinHandle<()> {
        let registry = self.registry;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(log_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::debug!("--- Gauge Snapshot ---");
                        for (name, value) in snapshot(&registry) {
                            tracing::info!("[Gauge] {}: {}", name, value);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Gauge logging task received shutdown signal.");
                        break;
                    }
                }
            }
        })
    }
}

/// Every gauge as `(name, value)`, sorted by name.
fn snapshot(registry: &Registry<Key, AtomicStorage>) -> Vec<(String, f64)> {
    let mut gauges: Vec<(String, f64)> = registry
        .get_gauge_handles()
        .into_iter()
        .map(|(key, gauge)| {
            (
                key.name().to_string(),
                f64::from_bits(gauge.load(Ordering::Relaxed)),
            )
        })
        .collect();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    gauges
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
