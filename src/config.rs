//! Node configuration
//!
//! Defaults carry the reference deployment values. The CLI overrides them from
//! flags or from a JSON file (see [`NodeConfig::from_json_file`]).

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Motion detection tunables for the sensor node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Allowed deviation of the acceleration magnitude from 1 g, in (0, 1)
    pub accel_threshold: f32,
    /// Dwell time before a stationary episode raises a clog-candidate event
    pub stationary_threshold_ms: u64,
    /// Periodic position report interval; `None` disables periodic reports
    pub report_interval_ms: Option<u64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            accel_threshold: 0.05,
            stationary_threshold_ms: 5_000,
            report_interval_ms: None,
        }
    }
}

impl MotionConfig {
    /// Less sensitive variant used on pole-mounted sensors
    pub fn pole_variant() -> Self {
        Self {
            accel_threshold: 0.1,
            ..Self::default()
        }
    }
}

/// Gateway loop cadence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub env_interval_ms: u64,
    pub display_interval_ms: u64,
    pub loop_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            env_interval_ms: 5_000,
            display_interval_ms: 5_000,
            loop_delay_ms: 100,
        }
    }
}

/// Dark-pixel heuristic for visual clog confirmation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClogConfig {
    /// Pixels strictly below this intensity count as dark
    pub dark_threshold: u8,
    /// Confirm when the dark fraction is strictly above this ratio
    pub dark_ratio: f32,
}

impl Default for ClogConfig {
    fn default() -> Self {
        Self {
            dark_threshold: 50,
            dark_ratio: 0.2,
        }
    }
}

/// Where uploads land in the cloud store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    pub device_id: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            device_id: "esp32cam001".to_string(),
        }
    }
}

impl UploadOptions {
    pub fn environmental_path(&self) -> String {
        format!("/smartpole/{}/environmental", self.device_id)
    }

    pub fn lora_path(&self) -> String {
        format!("/smartpole/{}/lora", self.device_id)
    }

    /// `capture` numbers the camera captures so two in the same millisecond do not collide
    pub fn image_path(&self, uptime_ms: u64, capture: u64) -> String {
        format!("/clog_images/img_{}_{}.jpg", uptime_ms, capture)
    }
}

/// Complete configuration for all three node roles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub motion: MotionConfig,
    pub gateway: GatewayConfig,
    pub clog: ClogConfig,
    pub upload: UploadOptions,
}

impl NodeConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
