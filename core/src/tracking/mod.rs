pub mod classifier;
pub mod tracker;

pub use classifier::{Classify, UnknownClassifier};
pub use tracker::Tracker;
