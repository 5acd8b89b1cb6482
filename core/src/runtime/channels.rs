use crate::config::RadarConfig;
use crate::model::{Reading, Snapshot};
use tokio::sync::{mpsc, watch};

/// Creates the bounded reading channel connecting scanners to the loop.
///
/// Overflow is expected backpressure: producers `try_send` and drop the
/// reading, never block.
pub fn reading_channel(config: &RadarConfig) -> (mpsc::Sender<Reading>, mpsc::Receiver<Reading>) {
    mpsc::channel(config.reading_queue_capacity)
}

/// Creates the single-slot snapshot mailbox.
///
/// Publishing through `send_replace` atomically evicts any unread snapshot,
/// so a consumer only ever observes the most recent one - no backlog, no
/// retries.
pub fn snapshot_mailbox() -> (watch::Sender<Snapshot>, watch::Receiver<Snapshot>) {
    watch::channel(Snapshot::default())
}
