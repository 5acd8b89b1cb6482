use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One contiguous signal range mapped to a fixed display radius.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Band {
    /// Lowest RSSI (dBm) belonging to this band.
    pub floor: i32,
    /// Normalized display radius for the whole band.
    pub radius: f64,
}

/// Validation failures for a [`RadarConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("tick rate must be positive, got {0}")]
    TickRate(f64),
    #[error("reading queue capacity must be positive")]
    QueueCapacity,
    #[error("RSSI clamp bounds inverted: min {min} must be below max {max}")]
    ClampBounds { min: i32, max: i32 },
    #[error("smoothing factor must lie in (0, 1], got {0}")]
    Smoothing(f64),
    #[error("stale timeout must be positive, got {0}")]
    StaleTimeout(f64),
    #[error("band table must not be empty")]
    EmptyBands,
    #[error("band floors must be strictly ascending")]
    BandOrder,
    #[error("band radius {0} outside [0, 1]")]
    BandRadius(f64),
    #[error("band radii must decrease as signal strengthens")]
    BandRadiusOrder,
    #[error("commit interval must not be negative, got {0}")]
    CommitInterval(f64),
}

/// Tunable values for the aggregation engine and the runtime loop.
///
/// Loading these values from disk or flags belongs to the embedding
/// application; the core only consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Processing-loop frequency in Hz.
    pub tick_rate: f64,
    /// Bounded capacity of the reading channel.
    pub reading_queue_capacity: usize,
    /// Lower clamp bound for raw RSSI (dBm).
    pub rssi_min: i32,
    /// Upper clamp bound for raw RSSI (dBm).
    pub rssi_max: i32,
    /// Exponential smoothing factor in (0, 1].
    pub smoothing: f64,
    /// Seconds without a reading before a target turns stale; twice this
    /// removes it.
    pub stale_timeout: f64,
    /// Ordered band table: ascending floors, radii shrinking toward 0 as
    /// signal strengthens.
    pub bands: Vec<Band>,
    /// Minimum seconds between radius commits per target.
    pub commit_interval: f64,
    /// Bound on joining the loop and scanners during stop().
    pub shutdown_timeout: f64,
    /// Emit per-target debug trace lines.
    pub trace_targets: bool,
    /// Minimum seconds between trace lines per target.
    pub trace_interval: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10.0,
            reading_queue_capacity: 256,
            rssi_min: -100,
            rssi_max: -20,
            smoothing: 0.5,
            stale_timeout: 5.0,
            bands: vec![
                Band { floor: -100, radius: 1.0 },
                Band { floor: -85, radius: 0.75 },
                Band { floor: -70, radius: 0.5 },
                Band { floor: -55, radius: 0.25 },
                Band { floor: -40, radius: 0.1 },
            ],
            commit_interval: 0.5,
            shutdown_timeout: 2.0,
            trace_targets: false,
            trace_interval: 1.0,
        }
    }
}

impl RadarConfig {
    /// Duration of one processing cycle.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }

    /// Bound applied to every task join during stop().
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.shutdown_timeout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if self.reading_queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        if self.rssi_min >= self.rssi_max {
            return Err(ConfigError::ClampBounds {
                min: self.rssi_min,
                max: self.rssi_max,
            });
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if !(self.stale_timeout > 0.0) {
            return Err(ConfigError::StaleTimeout(self.stale_timeout));
        }
        if self.bands.is_empty() {
            return Err(ConfigError::EmptyBands);
        }
        for band in &self.bands {
            if !(0.0..=1.0).contains(&band.radius) {
                return Err(ConfigError::BandRadius(band.radius));
            }
        }
        for pair in self.bands.windows(2) {
            if pair[1].floor <= pair[0].floor {
                return Err(ConfigError::BandOrder);
            }
            if pair[1].radius >= pair[0].radius {
                return Err(ConfigError::BandRadiusOrder);
            }
        }
        if self.commit_interval < 0.0 {
            return Err(ConfigError::CommitInterval(self.commit_interval));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        RadarConfig::default().validate().unwrap();
    }

    #[test]
    fn tick_interval_matches_rate() {
        let config = RadarConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn smoothing_outside_unit_interval_is_rejected() {
        let mut config = RadarConfig::default();
        config.smoothing = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Smoothing(_))
        ));
        config.smoothing = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unordered_bands_are_rejected() {
        let mut config = RadarConfig::default();
        config.bands = vec![
            Band { floor: -70, radius: 0.5 },
            Band { floor: -85, radius: 0.75 },
        ];
        assert!(matches!(config.validate(), Err(ConfigError::BandOrder)));
    }

    #[test]
    fn band_radii_must_shrink_with_signal() {
        let mut config = RadarConfig::default();
        config.bands = vec![
            Band { floor: -100, radius: 0.5 },
            Band { floor: -70, radius: 0.5 },
        ];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BandRadiusOrder)
        ));
    }
}
