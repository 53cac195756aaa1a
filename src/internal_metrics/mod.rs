//! # Internal Metrics Module
//!
//! Gauge publication for the agent.
//!
//! ## Components:
//!
//! - **`MetricsGauges`**: The default [`GaugeRegistry`]. It routes every
//!   `set_gauge` call to the `metrics` facade, so whichever recorder the host
//!   installed (Prometheus, the `LoggingRecorder`, a test recorder) receives
//!   the values.
//!
//! - **`NoopGauges`**: Discards everything.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A `metrics`
//!   recorder that periodically logs every gauge.

use crate::core::{CollectionSample, GaugeRegistry, Generation};
use crate::formatting::millis;
use metrics::Unit;

pub mod logging_recorder;

pub const CPU_PERCENT: &str = "process.cpu.percent";
pub const MEMORY_BYTES: &str = "process.memory.bytes";
pub const MEMORY_PEAK_BYTES: &str = "process.memory.peak_bytes";
pub const GC_GEN0_COUNT: &str = "runtime.gc.gen0.count";
pub const GC_GEN1_COUNT: &str = "runtime.gc.gen1.count";
pub const GC_GEN2_COUNT: &str = "runtime.gc.gen2.count";
pub const GC_PAUSE_TOTAL_MS: &str = "runtime.gc.pause.total_ms";
pub const GC_PAUSE_MAX_MS: &str = "runtime.gc.pause.max_ms";
pub const GC_PAUSE_COUNT: &str = "runtime.gc.pause.count";

fn generation_gauge(generation: Generation) -> &'static str {
    match generation {
        Generation::Gen0 => GC_GEN0_COUNT,
        Generation::Gen1 => GC_GEN1_COUNT,
        Generation::Gen2 => GC_GEN2_COUNT,
    }
}

/// Registers descriptions for every gauge the agent writes with the global
/// recorder.
pub fn describe_gauges() {
    metrics::describe_gauge!(CPU_PERCENT, Unit::Percent, "CPU utilization of the process over the last collection interval, normalised by logical processor count.");
    metrics::describe_gauge!(MEMORY_BYTES, Unit::Bytes, "Resident set size of the process.");
    metrics::describe_gauge!(MEMORY_PEAK_BYTES, Unit::Bytes, "Largest resident set size observed since the agent started.");
    metrics::describe_gauge!(GC_GEN0_COUNT, Unit::Count, "Cumulative number of generation 0 collections.");
    metrics::describe_gauge!(GC_GEN1_COUNT, Unit::Count, "Cumulative number of generation 1 collections.");
    metrics::describe_gauge!(GC_GEN2_COUNT, Unit::Count, "Cumulative number of generation 2 collections.");
    metrics::describe_gauge!(GC_PAUSE_TOTAL_MS, Unit::Milliseconds, "Sum of collection pauses during the last collection interval.");
    metrics::describe_gauge!(GC_PAUSE_MAX_MS, Unit::Milliseconds, "Longest collection pause during the last collection interval.");
    metrics::describe_gauge!(GC_PAUSE_COUNT, Unit::Count, "Number of collection pauses during the last collection interval.");
}

/// Writes every value of `sample` to `registry`. Fields missing from the
/// sample are left at their previous value.
pub fn publish_sample(registry: &dyn GaugeRegistry, sample: &CollectionSample) {
    if let Some(cpu) = sample.cpu_percent {
        registry.set_gauge(CPU_PERCENT, cpu);
    }
    if let Some(memory) = sample.memory {
        registry.set_gauge(MEMORY_BYTES, memory.current_bytes as f64);
        registry.set_gauge(MEMORY_PEAK_BYTES, memory.peak_bytes as f64);
    }
    for generation in Generation::ALL {
        registry.set_gauge(generation_gauge(generation), sample.gc.get(generation) as f64);
    }
    registry.set_gauge(GC_PAUSE_TOTAL_MS, millis(sample.pauses.total));
    registry.set_gauge(GC_PAUSE_MAX_MS, millis(sample.pauses.max));
    registry.set_gauge(GC_PAUSE_COUNT, sample.pauses.count as f64);
}

/// Forwards gauges to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsGauges;

impl GaugeRegistry for MetricsGauges {
    fn set_gauge(&self, name: &str, value: f64) {
        metrics::gauge!(name.to_string()).set(value);
    }
}

/// A registry that drops every value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGauges;

impl GaugeRegistry for NoopGauges {
    fn set_gauge(&self, _name: &str, _value: f64) {}
}
