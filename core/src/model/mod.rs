pub mod reading;
pub mod snapshot;
pub mod target;

pub use reading::{Reading, Source};
pub use snapshot::{Snapshot, SnapshotStats};
pub use target::{Target, TargetKind, TargetState};
