use crate::core::ProcessProbe;
use crate::error::ProbeError;
use std::time::{Duration, Instant};

/// Converts the process's cumulative CPU time into a utilization percentage
/// over the interval since the previous call.
///
/// The result is normalised by the number of logical processors, so 100%
/// means every core was busy for the whole interval.
pub struct CpuCollector {
    probe: Box<dyn ProcessProbe>,
    processors: usize,
    baseline: Option<(Duration, Instant)>,
    last_percent: f64,
}

impl CpuCollector {
    pub fn new(probe: Box<dyn ProcessProbe>) -> Self {
        Self {
            probe,
            processors: num_cpus::get().max(1),
            baseline: None,
            last_percent: 0.0,
        }
    }

    /// Overrides the logical processor count used for normalisation.
    pub fn with_processor_count(mut self, processors: usize) -> Self {
        self.processors = processors.max(1);
        self
    }

    /// Returns CPU utilization since the previous call, rounded to two
    /// decimals. The first call only establishes a baseline and returns 0.
    pub fn collect(&mut self) -> Result<f64, ProbeError> {
        self.collect_at(Instant::now())
    }

    pub(crate) fn collect_at(&mut self, now: Instant) -> Result<f64, ProbeError> {
        let cpu = self.probe.cpu_time()?;

        let Some((last_cpu, last_sample)) = self.baseline else {
            self.baseline = Some((cpu, now));
            return Ok(0.0);
        };

        let wall = now.saturating_duration_since(last_sample);
        if wall.is_zero() {
            return Ok(self.last_percent);
        }

        let Some(cpu_delta) = cpu.checked_sub(last_cpu) else {
            // The counter went backwards; start over from here.
            self.baseline = Some((cpu, now));
            self.last_percent = 0.0;
            return Ok(0.0);
        };

        self.baseline = Some((cpu, now));
        let percent =
            cpu_delta.as_secs_f64() / (wall.as_secs_f64() * self.processors as f64) * 100.0;
        self.last_percent = round_to_hundredths(percent);
        Ok(self.last_percent)
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
