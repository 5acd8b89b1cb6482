use anyhow::Context;
use radarcore::RadarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::scanners::sim::Scenario;

/// Simulator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub scenario: Scenario,
    pub seed: u64,
    /// Emission rate in Hz; defaults to the radar tick rate when unset.
    pub tick_rate: Option<f64>,
    /// Maximum absolute jitter (dBm) added to emitted signal values.
    pub jitter: f64,
    /// Timestamp of the first emitted reading; wall clock when unset, so
    /// the aging clock stays coherent with idle cycles.
    pub start_ts: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Sweep,
            seed: 1,
            tick_rate: None,
            jitter: 0.0,
            start_ts: None,
        }
    }
}

/// WiFi scanner settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub interface: String,
    /// Seconds between scans.
    pub scan_interval: f64,
    /// Bound on a single `iw` invocation.
    pub scan_timeout: f64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            interface: "wlan0".to_string(),
            scan_interval: 4.0,
            scan_timeout: 8.0,
        }
    }
}

/// Full station configuration: core values plus collaborator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub radar: RadarConfig,
    pub enable_sim: bool,
    pub enable_wifi: bool,
    pub sim: SimConfig,
    pub wifi: WifiConfig,
    pub bridge_port: u16,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            radar: RadarConfig::default(),
            enable_sim: true,
            enable_wifi: false,
            sim: SimConfig::default(),
            wifi: WifiConfig::default(),
            bridge_port: 9000,
        }
    }
}

impl StationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading station config {}", path_ref.display()))?;
        let config: StationConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing station config {}", path_ref.display()))?;
        Ok(config)
    }
}
