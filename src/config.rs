//! Configuration management for MiniApm
//!
//! [`AgentConfig`] is the immutable value handed to [`crate::agent::Agent::start`].
//! The surrounding [`Config`] is only used by the `miniapm` binary: it uses
//! the `figment` crate to layer defaults, an optional TOML file,
//! `MINIAPM_`-prefixed environment variables and command-line arguments.

use crate::cli::Cli;
use crate::error::AgentError;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

pub const DEFAULT_APP_NAME: &str = "MiniApm-App";
pub const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for one agent pipeline. Supplied once at start.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Free-text name of the monitored application.
    pub app_name: String,
    /// Time between two collection ticks. Must be positive.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "collection_interval_ms")]
    pub collection_interval: Duration,
    /// Print one observation line per tick.
    pub console_logging: bool,
    /// Write the sampled values to the gauge registry.
    pub publish_gauges: bool,
}

impl AgentConfig {
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_collection_interval(mut self, interval: Duration) -> Self {
        self.collection_interval = interval;
        self
    }

    pub fn with_console_logging(mut self, enabled: bool) -> Self {
        self.console_logging = enabled;
        self
    }

    pub fn with_publish_gauges(mut self, enabled: bool) -> Self {
        self.publish_gauges = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.collection_interval.is_zero() {
            return Err(AgentError::InvalidConfig(
                "collection interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            collection_interval: DEFAULT_COLLECTION_INTERVAL,
            console_logging: false,
            publish_gauges: true,
        }
    }
}

/// Configuration for logging the gauge registry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Install the logging recorder and periodically log every gauge.
    pub log_gauges: bool,
    /// Seconds between two gauge dumps.
    pub log_interval_seconds: u64,
}

/// The configuration of the `miniapm` binary.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// The agent pipeline settings.
    pub agent: AgentConfig,
    /// Gauge logging settings.
    pub metrics: MetricsConfig,
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file named on
    /// the command line (if any), environment variables and the remaining
    /// command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        // e.g. MINIAPM_AGENT__CONSOLE_LOGGING=true
        let config: Config = figment
            .merge(Env::prefixed("MINIAPM_").split("__"))
            .merge(cli.clone())
            .extract()?;

        config.agent.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            agent: AgentConfig::default(),
            metrics: MetricsConfig {
                log_gauges: false,
                log_interval_seconds: 10,
            },
        }
    }
}
