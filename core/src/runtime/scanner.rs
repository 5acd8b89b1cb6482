use crate::model::Reading;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Contract for reading producers feeding the runtime.
///
/// Producers own their I/O and its failures; the runtime only ever observes
/// readings arriving on the channel, or silence. On a full channel a
/// producer drops the reading (`try_send`) rather than block. Producers
/// poll `stop` at loop boundaries and wind down within one scan interval.
pub trait Scanner: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Consumes the scanner and spawns its producing task.
    fn spawn(
        self: Box<Self>,
        readings: mpsc::Sender<Reading>,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<()>;
}
