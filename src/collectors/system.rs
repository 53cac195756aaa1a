//! # System Probe
//!
//! This module defines the `SysinfoProbe`, the production [`ProcessProbe`]
//! used by the CPU and memory collectors.
//!
//! Each probe owns its own `sysinfo::System` and refreshes only the current
//! process, and only the CPU or memory part of it depending on which value is
//! being read.

use crate::core::ProcessProbe;
use crate::error::ProbeError;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::error;

/// Reads CPU time and resident memory of the current process via `sysinfo`.
pub struct SysinfoProbe {
    system: System,
    pid: Result<Pid, ProbeError>,
}

impl SysinfoProbe {
    /// Creates a new `SysinfoProbe` for the current process.
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().map_err(|e| {
            error!("Failed to get current PID: {}", e);
            ProbeError::CurrentPid(e.to_string())
        });

        Self {
            system: System::new(),
            pid,
        }
    }

    fn refresh(&mut self, kind: ProcessRefreshKind) -> Result<&sysinfo::Process, ProbeError> {
        let pid = self.pid.clone()?;
        // `refresh_processes_specifics` returns how many processes were
        // updated; zero means the pid is gone.
        let updated = self
            .system
            .refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, kind);
        if updated == 0 {
            return Err(ProbeError::ProcessNotFound(pid.as_u32()));
        }
        self.system
            .process(pid)
            .ok_or(ProbeError::ProcessNotFound(pid.as_u32()))
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn cpu_time(&mut self) -> Result<Duration, ProbeError> {
        let process = self.refresh(ProcessRefreshKind::nothing().with_cpu())?;
        Ok(Duration::from_millis(process.accumulated_cpu_time()))
    }

    fn resident_bytes(&mut self) -> Result<u64, ProbeError> {
        let process = self.refresh(ProcessRefreshKind::nothing().with_memory())?;
        Ok(process.memory())
    }
}
