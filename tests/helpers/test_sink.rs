use miniapm::formatting::format_observation;
use miniapm::{CollectionSample, ObservationSink};
use std::sync::{Arc, Mutex};

/// Records every sample and the observation line it would print.
#[derive(Debug, Clone, Default)]
pub struct CapturingSink {
    samples: Arc<Mutex<Vec<CollectionSample>>>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn samples(&self) -> Vec<CollectionSample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }
}

impl ObservationSink for CapturingSink {
    fn observe(&self, sample: &CollectionSample) {
        self.lines.lock().unwrap().push(format_observation(sample));
        self.samples.lock().unwrap().push(sample.clone());
    }
}
