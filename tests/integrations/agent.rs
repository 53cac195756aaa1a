#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::TestAgent;
use miniapm::internal_metrics::{CPU_PERCENT, GC_GEN0_COUNT, GC_PAUSE_COUNT, MEMORY_BYTES};
use miniapm::{AgentConfig, Generation, StartOutcome};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tokio::time;

fn config(interval_ms: u64) -> AgentConfig {
    AgentConfig::default()
        .with_app_name("agent-test")
        .with_collection_interval(Duration::from_millis(interval_ms))
        .with_console_logging(true)
}

#[tokio::test(start_paused = true)]
async fn three_ticks_in_350ms_at_100ms_interval() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let test = TestAgent::new();
    let hub = test.agent.events().clone();

    assert_eq!(test.agent.start(config(100)).unwrap(), StartOutcome::Started);

    // Collections reported by the host between the ticks.
    time::sleep(Duration::from_millis(50)).await;
    hub.collection_started(Generation::Gen0);
    hub.collection_finished(Generation::Gen0);
    time::sleep(Duration::from_millis(100)).await;
    hub.collection_started(Generation::Gen2);
    hub.collection_finished(Generation::Gen2);
    time::sleep(Duration::from_millis(200)).await;

    assert!(test.agent.shutdown());
    time::sleep(Duration::from_millis(500)).await;

    let lines = test.sink.lines();
    assert_eq!(lines.len(), 3, "expected exactly three observation lines: {:#?}", lines);
    assert!(lines.iter().all(|line| line.starts_with("[agent-test] CPU ")));

    let samples = test.sink.samples();
    for pair in samples.windows(2) {
        for generation in Generation::ALL {
            assert!(
                pair[1].gc.get(generation) >= pair[0].gc.get(generation),
                "{:?} count decreased between ticks",
                generation
            );
        }
    }
    assert_eq!(samples[0].gc.gen0, 1);
    assert_eq!(samples[1].gc.gen0, 2);
    assert_eq!(samples[1].gc.gen2, 1);
    assert_eq!(samples[2].gc, samples[1].gc);
    assert_eq!(
        samples.iter().map(|s| s.pauses.count).collect::<Vec<_>>(),
        vec![1, 1, 0]
    );
}

#[tokio::test(start_paused = true)]
async fn gauges_are_published_each_tick() {
    let test = TestAgent::new();
    test.probe.set_resident_bytes(5_000_000);

    test.agent.start(config(100).with_console_logging(false)).unwrap();
    test.agent.events().collection_started(Generation::Gen0);
    test.agent.events().collection_finished(Generation::Gen0);
    time::sleep(Duration::from_millis(150)).await;

    assert_eq!(test.sink.count(), 0, "console logging is disabled");
    assert_eq!(test.gauges.get(CPU_PERCENT), Some(0.0));
    assert_eq!(test.gauges.get(MEMORY_BYTES), Some(5_000_000.0));
    assert_eq!(test.gauges.get(GC_GEN0_COUNT), Some(1.0));
    assert_eq!(test.gauges.get(GC_PAUSE_COUNT), Some(1.0));

    test.agent.shutdown();
}

#[tokio::test(start_paused = true)]
async fn probe_failures_degrade_to_missing_values() {
    let test = TestAgent::new();
    test.probe.set_failing(true);

    test.agent.start(config(100)).unwrap();
    time::sleep(Duration::from_millis(150)).await;
    test.probe.set_failing(false);
    time::sleep(Duration::from_millis(100)).await;
    test.agent.shutdown();

    let samples = test.sink.samples();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].cpu_percent, None);
    assert_eq!(samples[0].memory, None);
    assert!(test.sink.lines()[0].contains("CPU n/a | MEM n/a"));
    assert!(samples[1].memory.is_some());
}

#[test]
fn concurrent_starts_create_exactly_one_scheduler() {
    let test = TestAgent::new();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let agent = test.agent.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                agent
                    .start(config(1_000).with_app_name(format!("caller-{}", i)))
                    .unwrap()
            })
        })
        .collect();
    let outcomes: Vec<StartOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let started = outcomes.iter().filter(|o| **o == StartOutcome::Started).count();
    assert_eq!(started, 1);
    assert_eq!(test.agent.events().listener_count(), 1);

    assert!(test.agent.shutdown());
    assert_eq!(test.agent.events().listener_count(), 0);
}

#[test]
fn concurrent_shutdowns_tear_down_once() {
    let test = TestAgent::new();
    test.agent.start(config(1_000)).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let agent = test.agent.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                agent.shutdown()
            })
        })
        .collect();
    let torn_down = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|torn_down| *torn_down)
        .count();

    assert_eq!(torn_down, 1);
    assert!(!test.agent.is_running());
}

#[test]
fn interleaved_start_and_shutdown_never_leave_two_schedulers() {
    let test = TestAgent::new();
    let hub = test.agent.events().clone();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let agent = test.agent.clone();
            let hub = hub.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    if (i + t) % 2 == 0 {
                        agent.start(config(1_000)).unwrap();
                    } else {
                        agent.shutdown();
                    }
                    assert!(hub.listener_count() <= 1, "more than one bridge attached");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(hub.listener_count(), usize::from(test.agent.is_running()));
    test.agent.shutdown();
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn restart_builds_a_fresh_pipeline_and_keeps_first_config() {
    let test = TestAgent::new();

    test.agent.start(config(1_000).with_app_name("first")).unwrap();
    let second = test.agent.start(config(1_000).with_app_name("ignored")).unwrap();
    assert_eq!(second, StartOutcome::AlreadyRunning);
    assert_eq!(test.agent.config().unwrap().app_name, "first");

    test.agent.shutdown();
    assert!(test.agent.config().is_none());

    assert_eq!(
        test.agent.start(config(1_000).with_app_name("second")).unwrap(),
        StartOutcome::Started
    );
    assert_eq!(test.agent.config().unwrap().app_name, "second");
    test.agent.shutdown();
}

#[test]
fn uptime_stops_advancing_after_shutdown() {
    let test = TestAgent::new();
    let started_at = test.agent.start_time_utc();

    test.agent.start(config(1_000)).unwrap();
    thread::sleep(Duration::from_millis(20));
    test.agent.shutdown();

    let frozen = test.agent.uptime();
    assert!(frozen >= Duration::from_millis(20));
    thread::sleep(Duration::from_millis(30));
    assert_eq!(test.agent.uptime(), frozen);

    test.agent.start(config(1_000)).unwrap();
    thread::sleep(Duration::from_millis(10));
    assert!(test.agent.uptime() > frozen);
    test.agent.shutdown();

    assert_eq!(test.agent.start_time_utc(), started_at);
}
