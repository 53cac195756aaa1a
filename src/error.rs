//! Error types for the agent.
//!
//! Nothing in here is fatal to the monitored application: probe errors are
//! downgraded to "no data this tick" by the scheduler, and the only error the
//! public lifecycle API returns is a rejected configuration.

use thiserror::Error;

/// Failures while reading process statistics from the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("could not determine the current process id: {0}")]
    CurrentPid(String),

    #[error("process {0} is no longer visible to the probe")]
    ProcessNotFound(u32),
}

/// Errors surfaced by [`crate::agent::Agent`].
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn the collection worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
