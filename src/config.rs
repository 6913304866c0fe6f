use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Engine Config Model (optional YAML)
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "form-autofill.yaml";

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub fill: FillConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Two detections whose centers are closer than this on both axes may be
    /// the same control.
    #[serde(default = "default_tolerance")]
    pub spatial_tolerance_px: f64,

    /// Share of key segments that must match for a spatial duplicate.
    #[serde(default = "default_segment_ratio")]
    pub segment_match_ratio: f64,

    /// Upper bound on waiting for a client framework to mount.
    #[serde(default = "default_mount_wait")]
    pub mount_wait_ms: u64,

    #[serde(default = "default_mount_poll")]
    pub mount_poll_ms: u64,

    /// Parent text at least this long is not used as a label.
    #[serde(default = "default_parent_label_len")]
    pub max_parent_label_len: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            spatial_tolerance_px: 10.0,
            segment_match_ratio: 0.5,
            mount_wait_ms: 2000,
            mount_poll_ms: 100,
            max_parent_label_len: 100,
        }
    }
}

impl DetectionConfig {
    pub fn mount_wait(&self) -> Duration {
        Duration::from_millis(self.mount_wait_ms)
    }

    pub fn mount_poll(&self) -> Duration {
        Duration::from_millis(self.mount_poll_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// Attempts per field before giving up.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Pause before each field.
    #[serde(default = "default_field_delay")]
    pub field_delay_ms: u64,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            retry_budget: 3,
            retry_delay_ms: 500,
            field_delay_ms: 100,
        }
    }
}

impl FillConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn field_delay(&self) -> Duration {
        Duration::from_millis(self.field_delay_ms)
    }
}

// Serde default helpers
fn default_tolerance() -> f64 { 10.0 }
fn default_segment_ratio() -> f64 { 0.5 }
fn default_mount_wait() -> u64 { 2000 }
fn default_mount_poll() -> u64 { 100 }
fn default_parent_label_len() -> usize { 100 }
fn default_retry_budget() -> u32 { 3 }
fn default_retry_delay() -> u64 { 500 }
fn default_field_delay() -> u64 { 100 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> EngineConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = config_path, error = %e, "malformed config, using defaults");
                EngineConfig::default()
            }
        },
        Err(_) => EngineConfig::default(),
    }
}
