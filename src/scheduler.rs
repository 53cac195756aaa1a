//! Periodic collection.
//!
//! A [`BackgroundScheduler`] owns one collection pipeline: the collectors,
//! the pause aggregator and the runtime event bridge feeding it. Once
//! started, a worker runs one collect cycle per interval until stopped.
//!
//! The worker loop awaits each collect cycle before waiting for the next
//! tick, so two ticks can never overlap; a tick that overruns the interval
//! causes the missed ticks to be skipped rather than queued. The cycle itself
//! runs on tokio's blocking pool and never occupies an async worker thread.

use crate::collectors::{CpuCollector, GcCollector, MemoryCollector, ProbeFactory};
use crate::config::AgentConfig;
use crate::core::{CollectionCounter, CollectionSample, GaugeRegistry, ObservationSink};
use crate::error::AgentError;
use crate::formatting::format_observation;
use crate::internal_metrics::publish_sample;
use crate::pause::PauseAggregator;
use crate::runtime::bridge::RuntimeEventBridge;
use crate::runtime::RuntimeEventHub;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Lifecycle of a [`BackgroundScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Drives the collect cycle at the configured interval.
pub struct BackgroundScheduler {
    state: SchedulerState,
    config: AgentConfig,
    cycle: Option<CollectionCycle>,
    bridge: RuntimeEventBridge,
    shutdown_tx: watch::Sender<bool>,
}

impl BackgroundScheduler {
    /// Builds the pipeline and subscribes its bridge to `hub`. Nothing is
    /// collected until [`start`](Self::start).
    pub fn new(
        config: AgentConfig,
        hub: &Arc<RuntimeEventHub>,
        probes: &ProbeFactory,
        gauges: Arc<dyn GaugeRegistry>,
        sink: Arc<dyn ObservationSink>,
    ) -> Self {
        let pauses = Arc::new(PauseAggregator::new());
        let bridge = RuntimeEventBridge::attach(hub, pauses.clone());
        let counter: Arc<dyn CollectionCounter> = hub.clone();

        let cycle = CollectionCycle {
            config: config.clone(),
            cpu: CpuCollector::new(probes()),
            memory: MemoryCollector::new(probes()),
            gc: GcCollector::new(counter),
            pauses,
            gauges,
            sink,
        };
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            state: SchedulerState::Idle,
            config,
            cycle: Some(cycle),
            bridge,
            shutdown_tx,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Starts the worker. Returns `Ok(false)` without doing anything if the
    /// scheduler is already running or has been stopped.
    ///
    /// Inside a tokio runtime the worker is a task on that runtime; anywhere
    /// else it gets a dedicated thread with its own single-threaded runtime.
    pub fn start(&mut self) -> Result<bool, AgentError> {
        if self.state != SchedulerState::Idle {
            debug!(state = ?self.state, "Scheduler start ignored.");
            return Ok(false);
        }
        let Some(cycle) = self.cycle.take() else {
            return Ok(false);
        };
        let shutdown_rx = self.shutdown_tx.subscribe();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_worker(cycle, shutdown_rx));
            }
            Err(_) => {
                std::thread::Builder::new()
                    .name("miniapm-collector".to_string())
                    .spawn(move || {
                        match tokio::runtime::Builder::new_current_thread().enable_time().build() {
                            Ok(runtime) => runtime.block_on(run_worker(cycle, shutdown_rx)),
                            Err(e) => error!(error = %e, "Failed to build the collector runtime"),
                        }
                    })?;
            }
        }

        self.state = SchedulerState::Running;
        info!(
            app = %self.config.app_name,
            interval_ms = self.config.collection_interval.as_millis() as u64,
            "Collection scheduler started."
        );
        Ok(true)
    }

    /// Prevents any further tick. A tick already in progress completes.
    pub fn stop(&mut self) {
        match self.state {
            SchedulerState::Running => {
                self.shutdown_tx.send_replace(true);
                info!(app = %self.config.app_name, "Collection scheduler stopped.");
            }
            SchedulerState::Idle => {
                self.cycle = None;
            }
            SchedulerState::Stopped => return,
        }
        self.state = SchedulerState::Stopped;
    }

    /// Stops the worker and detaches the runtime event bridge. Safe to call
    /// any number of times.
    pub fn dispose(&mut self) {
        self.stop();
        self.bridge.dispose();
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for BackgroundScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundScheduler")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

async fn run_worker(mut cycle: CollectionCycle, mut shutdown_rx: watch::Receiver<bool>) {
    let app = cycle.config.app_name.clone();
    let period = cycle.config.collection_interval;
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(app = %app, "Collection worker running.");

    loop {
        tokio::select! {
            biased;
            // Also fires when the scheduler is dropped without stopping.
            _ = shutdown_rx.changed() => {
                debug!(app = %app, "Collection worker received shutdown signal.");
                break;
            }
            _ = interval.tick() => {
                // Probe reads hit the filesystem, so the cycle runs on the
                // blocking pool. Awaiting it keeps ticks from overlapping.
                match tokio::task::spawn_blocking(move || {
                    cycle.tick();
                    cycle
                })
                .await
                {
                    Ok(returned) => cycle = returned,
                    Err(e) => {
                        error!(app = %app, error = %e, "Collection cycle failed, worker exiting.");
                        break;
                    }
                }
            }
        }
    }
    debug!(app = %app, "Collection worker finished.");
}

/// Everything a single tick touches. Owned by the worker and handed to the
/// blocking pool for the duration of each tick, so only one thread at a time
/// ever touches the collectors.
struct CollectionCycle {
    config: AgentConfig,
    cpu: CpuCollector,
    memory: MemoryCollector,
    gc: GcCollector,
    pauses: Arc<PauseAggregator>,
    gauges: Arc<dyn GaugeRegistry>,
    sink: Arc<dyn ObservationSink>,
}

impl CollectionCycle {
    fn tick(&mut self) {
        let sample = self.collect();
        debug!(line = %format_observation(&sample), "Collected sample");

        if self.config.console_logging {
            self.sink.observe(&sample);
        }
        if self.config.publish_gauges {
            publish_sample(self.gauges.as_ref(), &sample);
        }
    }

    fn collect(&mut self) -> CollectionSample {
        let cpu_percent = match self.cpu.collect() {
            Ok(percent) => Some(percent),
            Err(e) => {
                warn!(error = %e, "CPU usage unavailable for this tick");
                None
            }
        };
        let memory = match self.memory.collect() {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(error = %e, "Memory usage unavailable for this tick");
                None
            }
        };
        let gc = self.gc.collect();
        let pauses = self.pauses.snapshot_and_reset();

        CollectionSample {
            app_name: self.config.app_name.clone(),
            timestamp: Utc::now(),
            cpu_percent,
            memory,
            gc,
            pauses,
        }
    }
}
