//! Aggregation engine and runtime orchestration for the RF presence radar.
//!
//! Scanners push timestamped signal-strength readings into a bounded
//! channel; a fixed-rate processing loop folds them into tracked targets
//! and publishes immutable snapshots through a latest-wins mailbox.

pub mod config;
pub mod mapping;
pub mod model;
pub mod runtime;
pub mod telemetry;
pub mod tracking;

pub use config::{Band, ConfigError, RadarConfig};
pub use model::{Reading, Snapshot, SnapshotStats, Source, Target, TargetKind, TargetState};
pub use runtime::{Runtime, Scanner, StopReport};
pub use tracking::Tracker;
