//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the `miniapm` binary
//! using the `clap` crate. The parsed arguments act as the last `figment`
//! provider, overriding the TOML file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// An in-process APM agent sampling CPU, memory and collection pauses.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name of the monitored application.
    #[arg(long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Collection interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Print one observation line per collection.
    #[arg(long)]
    pub console: bool,

    /// Periodically log every gauge.
    #[arg(long)]
    pub log_gauges: bool,

    /// Log level filter (e.g. "info", "miniapm=debug").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut root = Dict::new();
        let mut agent = Dict::new();

        if let Some(name) = &self.app_name {
            agent.insert("app_name".into(), Value::from(name.clone()));
        }
        if let Some(interval) = self.interval_ms {
            agent.insert("collection_interval_ms".into(), Value::from(interval));
        }
        // Flags only override when present; absent means "keep the file value".
        if self.console {
            agent.insert("console_logging".into(), Value::from(true));
        }
        if !agent.is_empty() {
            root.insert("agent".into(), Value::from(agent));
        }

        if self.log_gauges {
            let mut metrics = Dict::new();
            metrics.insert("log_gauges".into(), Value::from(true));
            root.insert("metrics".into(), Value::from(metrics));
        }
        if let Some(level) = &self.log_level {
            root.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, root);
        Ok(map)
    }
}
