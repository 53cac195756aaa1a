//! Core domain types and service traits for MiniApm
//!
//! This module defines the values produced by one collection cycle and the
//! trait contracts through which the agent talks to the host process, the
//! gauge store and the console.

use crate::error::ProbeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A tier of a generational collector. Lower generations are collected more
/// often and more cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generation {
    Gen0,
    Gen1,
    Gen2,
}

impl Generation {
    /// Every generation, youngest first.
    pub const ALL: [Generation; 3] = [Generation::Gen0, Generation::Gen1, Generation::Gen2];

    pub fn index(self) -> usize {
        match self {
            Generation::Gen0 => 0,
            Generation::Gen1 => 1,
            Generation::Gen2 => 2,
        }
    }
}

/// Cumulative collection counts per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationCounts {
    pub gen0: u64,
    pub gen1: u64,
    pub gen2: u64,
}

impl GenerationCounts {
    pub fn get(&self, generation: Generation) -> u64 {
        match generation {
            Generation::Gen0 => self.gen0,
            Generation::Gen1 => self.gen1,
            Generation::Gen2 => self.gen2,
        }
    }
}

/// Pause statistics accumulated over one collection interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PauseSnapshot {
    /// Sum of all pauses recorded in the interval.
    pub total: Duration,
    /// Longest single pause recorded in the interval.
    pub max: Duration,
    /// Number of pauses recorded in the interval.
    pub count: u64,
}

/// Resident memory as seen by one collection, plus the peak observed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub current_bytes: u64,
    pub peak_bytes: u64,
}

/// Everything gathered by a single scheduler tick.
///
/// CPU and memory are optional: a failed probe read leaves the field empty
/// for this tick instead of failing the whole cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSample {
    pub app_name: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: Option<f64>,
    pub memory: Option<MemoryReading>,
    pub gc: GenerationCounts,
    pub pauses: PauseSnapshot,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Reads resource usage of the current process.
///
/// Implementations are only ever driven from the scheduler's tick, so they
/// may keep mutable refresh state without synchronization.
pub trait ProcessProbe: Send {
    /// Total processor time consumed by the process since it started, summed
    /// over all threads and cores.
    fn cpu_time(&mut self) -> Result<Duration, ProbeError>;

    /// Current resident set size in bytes.
    fn resident_bytes(&mut self) -> Result<u64, ProbeError>;
}

/// Reports how many collections of each generation have happened so far.
pub trait CollectionCounter: Send + Sync {
    fn collection_count(&self, generation: Generation) -> u64;
}

/// A named, last-value-wins metric store.
pub trait GaugeRegistry: Send + Sync {
    fn set_gauge(&self, name: &str, value: f64);
}

/// Receives one sample per tick when console logging is enabled.
pub trait ObservationSink: Send + Sync {
    fn observe(&self, sample: &CollectionSample);
}
