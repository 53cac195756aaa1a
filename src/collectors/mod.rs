//! # Resource Collectors
//!
//! The samplers driven by the scheduler tick:
//!
//! - **`CpuCollector`**: utilization from the delta of cumulative CPU time.
//! - **`MemoryCollector`**: resident memory and its observed peak.
//! - **`GcCollector`**: cumulative collection counts per generation.
//! - **`SysinfoProbe`**: (Defined in `system.rs`) the production process
//!   probe behind the CPU and memory collectors.
//!
//! None of them is meant to be shared between threads; the scheduler moves
//! them into its worker and calls them from the tick only.

pub mod cpu;
pub mod gc;
pub mod memory;
pub mod system;

pub use cpu::CpuCollector;
pub use gc::GcCollector;
pub use memory::MemoryCollector;
pub use system::SysinfoProbe;

use crate::core::ProcessProbe;
use std::sync::Arc;

/// Builds a fresh probe for each collector of a new pipeline.
pub type ProbeFactory = Arc<dyn Fn() -> Box<dyn ProcessProbe> + Send + Sync>;

/// The factory used unless overridden: one [`SysinfoProbe`] per collector.
pub fn sysinfo_probe_factory() -> ProbeFactory {
    Arc::new(|| Box::new(SysinfoProbe::new()) as Box<dyn ProcessProbe>)
}
