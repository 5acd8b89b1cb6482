use crate::model::Source;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle state of a tracked target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetState {
    Active,
    Stale,
    Gone,
}

/// Classification of a target; a placeholder until a real classifier lands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    Mobile,
    Laptop,
    #[serde(rename = "AP")]
    AccessPoint,
    Unknown,
}

/// Mutable tracked entity, owned exclusively by the aggregation engine.
///
/// The display radius only moves on committed band changes; the commit
/// bookkeeping lives on the target so deletion removes everything at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    /// Every source that has ever reported this identity.
    pub sources: HashSet<Source>,
    pub rssi_raw: i32,
    pub rssi_smoothed: f64,
    /// Bearing in radians, fixed at creation. An identity fingerprint, not
    /// a measured direction.
    pub bearing: f64,
    /// Normalized display distance in [0, 1].
    pub radius: f64,
    pub last_seen: f64,
    pub state: TargetState,
    pub kind: TargetKind,
    #[serde(skip)]
    pub(crate) committed_band: usize,
    #[serde(skip)]
    pub(crate) last_commit: f64,
    #[serde(skip)]
    pub(crate) last_trace: f64,
}

impl Target {
    /// Creates a target from its first reading. The smoothed value starts
    /// at the raw value; no smoothing is applied to the first sample.
    ///
    /// Panics when `radius` lies outside [0, 1] - that is a programming
    /// error in the band table, not a runtime condition.
    pub fn new(
        id: impl Into<String>,
        source: Source,
        rssi: i32,
        bearing: f64,
        radius: f64,
        band: usize,
        ts: f64,
    ) -> Self {
        assert!(
            (0.0..=1.0).contains(&radius),
            "target radius {} outside [0, 1]",
            radius
        );
        let mut sources = HashSet::new();
        sources.insert(source);
        Self {
            id: id.into(),
            sources,
            rssi_raw: rssi,
            rssi_smoothed: rssi as f64,
            bearing,
            radius,
            last_seen: ts,
            state: TargetState::Active,
            kind: TargetKind::Unknown,
            committed_band: band,
            last_commit: ts,
            last_trace: f64::NEG_INFINITY,
        }
    }

    /// Commits a new display radius after a qualifying band change.
    pub(crate) fn commit_radius(&mut self, radius: f64, band: usize, ts: f64) {
        assert!(
            (0.0..=1.0).contains(&radius),
            "target radius {} outside [0, 1]",
            radius
        );
        self.radius = radius;
        self.committed_band = band;
        self.last_commit = ts;
    }

    /// Seconds since this target was last reported.
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_sets_smoothed_to_raw() {
        let target = Target::new("dev", Source::Sim, -72, 1.0, 0.5, 1, 0.0);
        assert_eq!(target.rssi_smoothed, -72.0);
        assert_eq!(target.state, TargetState::Active);
        assert_eq!(target.kind, TargetKind::Unknown);
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn radius_outside_unit_interval_is_fatal() {
        Target::new("dev", Source::Sim, -72, 1.0, 1.5, 0, 0.0);
    }

    #[test]
    fn age_measures_from_last_seen() {
        let target = Target::new("dev", Source::Sim, -72, 1.0, 0.5, 1, 10.0);
        assert_eq!(target.age(12.5), 2.5);
    }
}
