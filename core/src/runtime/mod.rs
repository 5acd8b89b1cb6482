pub mod channels;
pub mod orchestrator;
pub mod scanner;

pub use orchestrator::{Runtime, StopReport};
pub use scanner::Scanner;

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock timestamp in seconds since the Unix epoch.
///
/// Used for aging whenever no reading supplied its own clock this cycle.
pub fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
