use crate::model::Target;
use serde::{Deserialize, Serialize};

/// Summary counts over a snapshot's targets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotStats {
    pub total: usize,
    pub active: usize,
    pub stale: usize,
}

/// Immutable point-in-time view of all live targets.
///
/// Targets are defensive clones ordered by identity; later engine mutation
/// never reaches a published snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub targets: Vec<Target>,
    pub stats: SnapshotStats,
    /// Identity of the closest target, ties broken lexicographically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    pub ts: f64,
}
