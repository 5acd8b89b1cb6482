use crate::config::RadarConfig;
use crate::mapping;
use crate::model::{Reading, Snapshot, SnapshotStats, Source, Target, TargetState};
use crate::telemetry::LogManager;
use crate::tracking::classifier::{Classify, UnknownClassifier};
use std::collections::BTreeMap;

/// Stateful aggregation engine folding readings into tracked targets.
///
/// Not safe for concurrent use; the runtime serializes every call through
/// a single processing loop.
pub struct Tracker {
    config: RadarConfig,
    targets: BTreeMap<String, Target>,
    classifier: Box<dyn Classify>,
    logger: LogManager,
}

impl Tracker {
    pub fn new(config: RadarConfig) -> Self {
        Self::with_classifier(config, Box::new(UnknownClassifier))
    }

    pub fn with_classifier(config: RadarConfig, classifier: Box<dyn Classify>) -> Self {
        Self {
            config,
            targets: BTreeMap::new(),
            classifier,
            logger: LogManager::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, id: &str) -> Option<&Target> {
        self.targets.get(id)
    }

    /// Ingests a reading, creating or updating the corresponding target.
    pub fn update(&mut self, reading: Reading) {
        match self.targets.get_mut(&reading.id) {
            None => self.insert_new(reading),
            Some(target) => {
                let alpha = self.config.smoothing;
                let prev_radius = target.radius;

                target.rssi_raw = reading.rssi;
                target.rssi_smoothed =
                    (1.0 - alpha) * target.rssi_smoothed + alpha * reading.rssi as f64;
                target.last_seen = reading.ts;
                target.state = TargetState::Active;
                target.sources.insert(reading.source);
                target.kind = self.classifier.classify(target);

                // The display radius only moves when the band changed AND the
                // commit interval has elapsed; everything else is jitter.
                let (band, radius) =
                    mapping::band_for_signal(target.rssi_smoothed, &self.config);
                let elapsed = reading.ts - target.last_commit;
                if band != target.committed_band && elapsed >= self.config.commit_interval {
                    target.commit_radius(radius, band, reading.ts);
                }

                Self::maybe_trace(
                    &self.config,
                    &self.logger,
                    target,
                    reading.source,
                    prev_radius,
                    reading.ts,
                );
            }
        }
    }

    fn insert_new(&mut self, reading: Reading) {
        let bearing = mapping::bearing_from_id(&reading.id);
        let (band, radius) = mapping::band_for_signal(reading.rssi as f64, &self.config);
        let mut target = Target::new(
            reading.id.clone(),
            reading.source,
            reading.rssi,
            bearing,
            radius,
            band,
            reading.ts,
        );
        target.kind = self.classifier.classify(&target);
        Self::maybe_trace(
            &self.config,
            &self.logger,
            &mut target,
            reading.source,
            radius,
            reading.ts,
        );
        self.targets.insert(reading.id, target);
    }

    /// Advances time-dependent state: stale targets decay, aged-out targets
    /// leave the live set together with all their bookkeeping.
    pub fn tick(&mut self, now: f64) {
        let stale_timeout = self.config.stale_timeout;
        self.targets.retain(|_, target| {
            let age = target.age(now);
            if age > 2.0 * stale_timeout {
                target.state = TargetState::Gone;
                return false;
            }
            if age > stale_timeout {
                target.state = TargetState::Stale;
            }
            true
        });
    }

    /// Builds an immutable snapshot of every live target.
    pub fn build_snapshot(&self, now: f64) -> Snapshot {
        let targets: Vec<Target> = self
            .targets
            .values()
            .filter(|target| target.state != TargetState::Gone)
            .cloned()
            .collect();

        let mut closest: Option<&Target> = None;
        for target in &targets {
            let closer = match closest {
                None => true,
                Some(current) => {
                    target.radius < current.radius
                        || (target.radius == current.radius && target.id < current.id)
                }
            };
            if closer {
                closest = Some(target);
            }
        }
        let selected = closest.map(|target| target.id.clone());

        let stats = SnapshotStats {
            total: targets.len(),
            active: targets
                .iter()
                .filter(|target| target.state == TargetState::Active)
                .count(),
            stale: targets
                .iter()
                .filter(|target| target.state == TargetState::Stale)
                .count(),
        };

        Snapshot {
            targets,
            stats,
            selected,
            ts: now,
        }
    }

    fn maybe_trace(
        config: &RadarConfig,
        logger: &LogManager,
        target: &mut Target,
        source: Source,
        prev_radius: f64,
        ts: f64,
    ) {
        if !config.trace_targets {
            return;
        }
        if ts - target.last_trace < config.trace_interval {
            return;
        }
        target.last_trace = ts;
        logger.record(&format!(
            "target id={} src={} rssi={} filt={:.2} band={} radius={:.3} prev={:.3} delta={:.3} ts={:.3}",
            target.id,
            source,
            target.rssi_raw,
            target.rssi_smoothed,
            target.committed_band,
            target.radius,
            prev_radius,
            target.radius - prev_radius,
            ts,
        ));
    }
}
