//! MiniApm - standalone agent runner
//!
//! Starts the agent for the current process with the layered configuration
//! and keeps sampling until Ctrl-C.

use anyhow::Result;
use clap::Parser;
use miniapm::{
    agent::Agent,
    cli::Cli,
    config::Config,
    internal_metrics::{describe_gauges, logging_recorder::LoggingRecorder},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("MiniApm starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Application: {}", config.agent.app_name);
    info!(
        "Collection Interval: {}ms",
        config.agent.collection_interval.as_millis()
    );
    info!("Console Logging: {}", config.agent.console_logging);
    info!("Publish Gauges: {}", config.agent.publish_gauges);
    info!("Log Gauges: {}", config.metrics.log_gauges);
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let mut gauge_logger = None;
    if config.metrics.log_gauges {
        let interval = Duration::from_secs(config.metrics.log_interval_seconds.max(1));
        let recorder = LoggingRecorder::new();
        let logger = recorder.gauge_logger();
        // Only spawn the logging task once the recorder is actually receiving gauges.
        match metrics::set_global_recorder(recorder) {
            Ok(()) => {
                info!("Gauges will be logged every {} seconds.", interval.as_secs());
                gauge_logger = Some(logger.spawn(interval, shutdown_rx.clone()));
            }
            Err(e) => warn!("Failed to install logging recorder: {}", e),
        }
    }
    describe_gauges();

    let agent = Arc::new(Agent::new());
    agent.start(config.agent.clone())?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    agent.shutdown();
    info!(
        "Agent ran for {:.1}s (started {}).",
        agent.uptime().as_secs_f64(),
        agent.start_time_utc().to_rfc3339()
    );

    let _ = shutdown_tx.send(());
    if let Some(handle) = gauge_logger {
        let _ = handle.await;
    }

    info!("MiniApm stopped.");
    Ok(())
}
