//! Engine configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between scheduled frames, in milliseconds.
    pub frame_delay_ms: u64,
    /// Poll interval of the CPU stats sampler, in milliseconds.
    pub stats_interval_ms: u64,
    /// Poll interval of the process sampler, in milliseconds.
    pub process_interval_ms: u64,
    /// Display density factor applied to the mode hot-zone bounds.
    pub density_scale: f32,
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_millis(self.process_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_delay_ms: 1000,
            stats_interval_ms: 1000,
            process_interval_ms: 10000,
            density_scale: 1.0,
        }
    }
}
