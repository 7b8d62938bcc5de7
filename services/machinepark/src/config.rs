//! Configuration types for the machinepark service

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::MachineType;
use crate::window::{TrailingWindow, MAX_WINDOW_CAPACITY};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub rollup: RollupConfig,
    /// Fleet size overrides; types left out are counted from the roster
    #[serde(default)]
    pub fleet_sizes: BTreeMap<MachineType, usize>,
}

/// Machine park REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Tick loop cadence and alerting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: f64,
    #[serde(default = "default_alert_history")]
    pub alert_history_seconds: u64,
    /// Consecutive ticks with every fetch failing before the run aborts
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            alert_history_seconds: default_alert_history(),
            max_consecutive_failures: default_max_failures(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_seconds)
    }

    pub fn alert_history(&self) -> Duration {
        Duration::from_secs(self.alert_history_seconds)
    }
}

/// Short and long period rollups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupConfig {
    #[serde(default = "default_short_period")]
    pub short_period_hours: f64,
    #[serde(default = "default_long_period")]
    pub long_period_hours: u32,
    #[serde(default = "default_short_depth")]
    pub short_history_depth: usize,
    #[serde(default = "default_long_depth")]
    pub long_history_depth: usize,
    #[serde(default)]
    pub rotation_seed_hour: u32,
    /// Maximum unflushed samples per machine
    #[serde(default = "default_accumulator_capacity")]
    pub accumulator_capacity: usize,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            short_period_hours: default_short_period(),
            long_period_hours: default_long_period(),
            short_history_depth: default_short_depth(),
            long_history_depth: default_long_depth(),
            rotation_seed_hour: 0,
            accumulator_capacity: default_accumulator_capacity(),
        }
    }
}

impl RollupConfig {
    pub fn short_period(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.short_period_hours * 3_600_000.0).round() as i64)
    }
}

fn default_base_url() -> String {
    "http://machinepark.actyx.io/api/v1".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_interval() -> f64 {
    5.0
}

fn default_alert_history() -> u64 {
    300
}

fn default_max_failures() -> u32 {
    3
}

fn default_short_period() -> f64 {
    0.05
}

fn default_long_period() -> u32 {
    1
}

fn default_short_depth() -> usize {
    100
}

fn default_long_depth() -> usize {
    10
}

fn default_accumulator_capacity() -> usize {
    4096
}

impl Config {
    /// Reject values the rollup engine cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| Err(crate::MachineparkError::Config(msg));

        let interval = self.polling.interval_seconds;
        if !(interval.is_finite() && interval > 0.0 && interval <= SECONDS_PER_DAY) {
            return invalid(format!(
                "polling.interval_seconds must be in (0, {}], got {}",
                SECONDS_PER_DAY, interval
            ));
        }
        if self.polling.alert_history_seconds == 0 {
            return invalid("polling.alert_history_seconds must be positive".to_string());
        }
        let window_capacity =
            TrailingWindow::capacity_for(self.polling.interval(), self.polling.alert_history());
        if window_capacity > MAX_WINDOW_CAPACITY {
            return invalid(format!(
                "polling.alert_history_seconds / polling.interval_seconds needs {} window slots, at most {} allowed",
                window_capacity, MAX_WINDOW_CAPACITY
            ));
        }
        let short = self.rollup.short_period_hours;
        if !(short.is_finite() && short > 0.0 && short <= 24.0) {
            return invalid(format!(
                "rollup.short_period_hours must be in (0, 24], got {}",
                short
            ));
        }
        if self.rollup.short_history_depth == 0 || self.rollup.long_history_depth == 0 {
            return invalid("rollup history depths must be positive".to_string());
        }
        if self.rollup.accumulator_capacity == 0 {
            return invalid("rollup.accumulator_capacity must be positive".to_string());
        }
        crate::schedule::rotation(self.rollup.rotation_seed_hour, self.rollup.long_period_hours)?;
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::MachineparkError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
