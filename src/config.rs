//! Configuration for the backup subsystem.
//!
//! Loads from a TOML file; every timing policy has a sensible default so the
//! host can pass an empty table.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Path of the persisted status document.
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,

    /// Quiet period between the last change event and backup execution.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Interval between failure-monitor sweeps.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,

    /// How long a category may stay pending before it counts as stuck.
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,

    /// Minimum gap between user-facing stuck-backup alerts.
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
}

fn default_status_file() -> PathBuf {
    PathBuf::from("backup-status.json")
}

fn default_debounce_secs() -> u64 {
    5
}

fn default_monitor_interval_secs() -> u64 {
    60
}

fn default_stale_threshold_secs() -> u64 {
    30 * 60
}

fn default_alert_cooldown_secs() -> u64 {
    10 * 60
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
            debounce_secs: default_debounce_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            stale_threshold_secs: default_stale_threshold_secs(),
            alert_cooldown_secs: default_alert_cooldown_secs(),
        }
    }
}

impl BackupConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BackupConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    pub fn stale_threshold_ms(&self) -> u64 {
        self.stale_threshold_secs * 1000
    }

    pub fn alert_cooldown_ms(&self) -> u64 {
        self.alert_cooldown_secs * 1000
    }
}
