#![allow(dead_code)]

pub mod test_sink;

use fake_probe::FakeProbe;
use miniapm::collectors::ProbeFactory;
use miniapm::{Agent, ProcessProbe};
use std::sync::Arc;
use test_gauges::TestGauges;
use test_sink::CapturingSink;

/// An agent wired to in-memory fakes, plus handles to inspect them.
pub struct TestAgent {
    pub agent: Arc<Agent>,
    pub probe: FakeProbe,
    pub gauges: TestGauges,
    pub sink: CapturingSink,
}

impl TestAgent {
    pub fn new() -> Self {
        let probe = FakeProbe::new();
        let gauges = TestGauges::new();
        let sink = CapturingSink::new();

        let factory_probe = probe.clone();
        let probes: ProbeFactory =
            Arc::new(move || Box::new(factory_probe.clone()) as Box<dyn ProcessProbe>);

        let agent = Agent::builder()
            .probe_factory(probes)
            .gauges(Arc::new(gauges.clone()))
            .sink(Arc::new(sink.clone()))
            .build();

        Self {
            agent: Arc::new(agent),
            probe,
            gauges,
            sink,
        }
    }
}
