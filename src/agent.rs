//! The process-wide agent.
//!
//! An [`Agent`] is created once by the application's composition root and
//! shared by reference (usually an `Arc<Agent>`). It owns at most one
//! [`BackgroundScheduler`] at a time, together with the runtime event bridge
//! inside it, and tracks how long it has been running.
//!
//! Lifecycle calls never fail because of the agent's current state: starting
//! a running agent and shutting down a stopped one are both no-ops. The only
//! error [`Agent::start`] returns is a configuration it cannot run with.

use crate::collectors::{sysinfo_probe_factory, ProbeFactory};
use crate::config::AgentConfig;
use crate::core::{GaugeRegistry, ObservationSink};
use crate::error::AgentError;
use crate::internal_metrics::MetricsGauges;
use crate::outputs::ConsoleSink;
use crate::runtime::RuntimeEventHub;
use crate::scheduler::BackgroundScheduler;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What a call to [`Agent::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new pipeline was created and started.
    Started,
    /// A pipeline was already running; the supplied configuration was ignored.
    AlreadyRunning,
}

/// Owns the collection pipeline of the process.
pub struct Agent {
    start_time_utc: DateTime<Utc>,
    uptime: Mutex<Stopwatch>,
    scheduler: Mutex<Option<BackgroundScheduler>>,
    events: Arc<RuntimeEventHub>,
    probes: ProbeFactory,
    gauges: Arc<dyn GaugeRegistry>,
    sink: Arc<dyn ObservationSink>,
}

impl Agent {
    /// Creates an agent with the default collaborators: a fresh
    /// [`RuntimeEventHub`], `sysinfo` probes, gauges published through the
    /// `metrics` facade and observation lines printed to stdout.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Starts collecting with `config` unless a pipeline is already running.
    ///
    /// Under concurrent callers exactly one wins; everybody else gets
    /// [`StartOutcome::AlreadyRunning`] and their configuration is discarded.
    pub fn start(&self, config: AgentConfig) -> Result<StartOutcome, AgentError> {
        let mut slot = lock(&self.scheduler);
        if slot.is_some() {
            debug!(app = %config.app_name, "Agent already running, start ignored.");
            return Ok(StartOutcome::AlreadyRunning);
        }
        config.validate()?;

        let mut scheduler = BackgroundScheduler::new(
            config,
            &self.events,
            &self.probes,
            self.gauges.clone(),
            self.sink.clone(),
        );
        scheduler.start()?;
        info!(app = %scheduler.config().app_name, "APM agent started.");
        *slot = Some(scheduler);
        lock(&self.uptime).resume();

        Ok(StartOutcome::Started)
    }

    /// Stops the running pipeline, detaches it from the runtime events and
    /// freezes [`uptime`](Self::uptime). Afterwards [`start`](Self::start)
    /// builds a fresh pipeline.
    ///
    /// Returns whether a pipeline was torn down; under concurrent callers at
    /// most one gets `true`.
    pub fn shutdown(&self) -> bool {
        let mut slot = lock(&self.scheduler);
        lock(&self.uptime).pause();

        let Some(mut scheduler) = slot.take() else {
            return false;
        };
        scheduler.dispose();
        info!(app = %scheduler.config().app_name, "APM agent shut down.");
        true
    }

    pub fn is_running(&self) -> bool {
        lock(&self.scheduler).is_some()
    }

    /// Configuration of the running pipeline, if any.
    pub fn config(&self) -> Option<AgentConfig> {
        lock(&self.scheduler)
            .as_ref()
            .map(|scheduler| scheduler.config().clone())
    }

    /// Wall-clock time at which the agent was constructed.
    pub fn start_time_utc(&self) -> DateTime<Utc> {
        self.start_time_utc
    }

    /// Monotonic time the agent has been alive, excluding the periods after a
    /// shutdown and before the following start.
    pub fn uptime(&self) -> Duration {
        lock(&self.uptime).elapsed()
    }

    /// The hub host code reports collections to.
    pub fn events(&self) -> &Arc<RuntimeEventHub> {
        &self.events
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("start_time_utc", &self.start_time_utc)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Agent`], mainly to substitute collaborators in tests or to
/// share an existing [`RuntimeEventHub`].
#[derive(Default)]
pub struct AgentBuilder {
    events: Option<Arc<RuntimeEventHub>>,
    probes: Option<ProbeFactory>,
    gauges: Option<Arc<dyn GaugeRegistry>>,
    sink: Option<Arc<dyn ObservationSink>>,
}

impl AgentBuilder {
    pub fn event_hub(mut self, hub: Arc<RuntimeEventHub>) -> Self {
        self.events = Some(hub);
        self
    }

    pub fn probe_factory(mut self, probes: ProbeFactory) -> Self {
        self.probes = Some(probes);
        self
    }

    pub fn gauges(mut self, gauges: Arc<dyn GaugeRegistry>) -> Self {
        self.gauges = Some(gauges);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ObservationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            start_time_utc: Utc::now(),
            uptime: Mutex::new(Stopwatch::start_new()),
            scheduler: Mutex::new(None),
            events: self.events.unwrap_or_default(),
            probes: self.probes.unwrap_or_else(sysinfo_probe_factory),
            gauges: self.gauges.unwrap_or_else(|| Arc::new(MetricsGauges)),
            sink: self.sink.unwrap_or_else(|| Arc::new(ConsoleSink)),
        }
    }
}

/// Monotonic elapsed-time counter that can be paused and resumed.
#[derive(Debug)]
struct Stopwatch {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Stopwatch {
    fn start_new() -> Self {
        Self {
            accumulated: Duration::ZERO,
            running_since: Some(Instant::now()),
        }
    }

    fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
