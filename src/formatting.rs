// src/formatting.rs

use crate::core::CollectionSample;
use std::time::Duration;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Renders a sample as the single console observation line, e.g.
///
/// ```text
/// [orders] CPU 12.5% | MEM 42MB (peak 50MB) | GC0:3 GC1:1 GC2:0 | GC Pause total:1.2ms max:0.8ms
/// ```
///
/// Values a probe could not read this tick are shown as `n/a`.
pub fn format_observation(sample: &CollectionSample) -> String {
    let cpu = match sample.cpu_percent {
        Some(percent) => format!("{}%", percent),
        None => "n/a".to_string(),
    };
    let memory = match sample.memory {
        Some(reading) => format!(
            "{}MB (peak {}MB)",
            reading.current_bytes / BYTES_PER_MB,
            reading.peak_bytes / BYTES_PER_MB
        ),
        None => "n/a".to_string(),
    };

    format!(
        "[{}] CPU {} | MEM {} | GC0:{} GC1:{} GC2:{} | GC Pause total:{:.1}ms max:{:.1}ms",
        sample.app_name,
        cpu,
        memory,
        sample.gc.gen0,
        sample.gc.gen1,
        sample.gc.gen2,
        millis(sample.pauses.total),
        millis(sample.pauses.max),
    )
}

pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}
