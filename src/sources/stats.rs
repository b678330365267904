//! CPU statistics source

use super::SampleError;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// One published CPU reading: load, uptime, and current clock speed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Overall CPU usage, clamped to 0–100.
    pub usage_percent: f32,
    /// Time since boot.
    pub uptime: Duration,
    /// Current CPU frequency in MHz.
    pub cpu_mhz: u64,
}

/// Reads CPU usage, uptime, and frequency via sysinfo.
pub struct StatsSource {
    system: System,
}

impl StatsSource {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
        );
        Self { system }
    }

    /// Collect a fresh snapshot.
    ///
    /// The very first reading reports near-zero usage (usage is a delta
    /// between two refreshes); the next poll corrects it.
    pub fn read(&mut self) -> Result<StatsSnapshot, SampleError> {
        self.system.refresh_cpu_all();

        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(SampleError::Unavailable("no CPU reported"));
        }

        Ok(StatsSnapshot {
            usage_percent: self.system.global_cpu_usage().clamp(0.0, 100.0),
            uptime: Duration::from_secs(System::uptime()),
            cpu_mhz: cpus.first().map(|cpu| cpu.frequency()).unwrap_or(0),
        })
    }
}

impl Default for StatsSource {
    fn default() -> Self {
        Self::new()
    }
}
