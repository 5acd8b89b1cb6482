use crate::model::{Target, TargetKind};

/// Pluggable classification strategy.
///
/// A classifier derives a kind from the target's accumulated evidence and
/// never touches engine state, so implementations can be swapped without
/// changes to the tracker.
pub trait Classify: Send {
    fn classify(&self, target: &Target) -> TargetKind;
}

/// Placeholder strategy: every target stays `Unknown`.
pub struct UnknownClassifier;

impl Classify for UnknownClassifier {
    fn classify(&self, _target: &Target) -> TargetKind {
        TargetKind::Unknown
    }
}
