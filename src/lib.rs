//! MiniApm - An in-process application performance monitoring agent
//!
//! This library samples the resource usage of the process it runs in (CPU
//! utilization, resident memory, collection counts and collection pause
//! latency) on a fixed interval and publishes the results as named gauges.

pub mod agent;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod core;
pub mod error;
pub mod formatting;
pub mod internal_metrics;
pub mod outputs;
pub mod pause;
pub mod runtime;
pub mod scheduler;

// Re-export core types for convenience
pub use crate::agent::{Agent, AgentBuilder, StartOutcome};
pub use crate::config::AgentConfig;
pub use crate::core::*;
pub use crate::error::{AgentError, ProbeError};
pub use crate::pause::PauseAggregator;
pub use crate::runtime::RuntimeEventHub;
