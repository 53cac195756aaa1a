use crate::core::{CollectionCounter, Generation, GenerationCounts};
use std::sync::Arc;

/// Reads the cumulative collection count of each generation.
///
/// The counts are totals since the host started reporting, not deltas.
pub struct GcCollector {
    counter: Arc<dyn CollectionCounter>,
}

impl GcCollector {
    pub fn new(counter: Arc<dyn CollectionCounter>) -> Self {
        Self { counter }
    }

    pub fn collect(&self) -> GenerationCounts {
        GenerationCounts {
            gen0: self.counter.collection_count(Generation::Gen0),
            gen1: self.counter.collection_count(Generation::Gen1),
            gen2: self.counter.collection_count(Generation::Gen2),
        }
    }
}
