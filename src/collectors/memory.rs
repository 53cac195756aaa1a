use crate::core::{MemoryReading, ProcessProbe};
use crate::error::ProbeError;

/// Samples resident memory and remembers the largest value seen.
pub struct MemoryCollector {
    probe: Box<dyn ProcessProbe>,
    peak_bytes: u64,
}

impl MemoryCollector {
    pub fn new(probe: Box<dyn ProcessProbe>) -> Self {
        Self {
            probe,
            peak_bytes: 0,
        }
    }

    /// Largest resident size returned by [`collect`](Self::collect) so far.
    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }

    pub fn collect(&mut self) -> Result<MemoryReading, ProbeError> {
        let current_bytes = self.probe.resident_bytes()?;
        self.peak_bytes = self.peak_bytes.max(current_bytes);

        Ok(MemoryReading {
            current_bytes,
            peak_bytes: self.peak_bytes,
        })
    }
}
