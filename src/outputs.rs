//! Observation sinks.
//!
//! The scheduler hands every sample to an [`ObservationSink`] when console
//! logging is enabled. [`ConsoleSink`] is the default and prints the line to
//! stdout.

use crate::core::{CollectionSample, ObservationSink};
use crate::formatting::format_observation;
use std::io::Write;

/// Prints one observation line per sample to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ObservationSink for ConsoleSink {
    fn observe(&self, sample: &CollectionSample) {
        let line = format_observation(sample);
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the host down with it.
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::debug!(error = %e, "Failed to write observation line");
        }
    }
}
