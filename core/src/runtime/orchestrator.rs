use crate::config::RadarConfig;
use crate::model::{Reading, Snapshot};
use crate::runtime::channels;
use crate::runtime::epoch_seconds;
use crate::runtime::scanner::Scanner;
use crate::telemetry::MetricsRecorder;
use crate::tracking::Tracker;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

/// Outcome of a graceful stop.
#[derive(Debug, Clone, Copy)]
pub struct StopReport {
    pub core_joined: bool,
    pub scanners_joined: usize,
    pub scanners_total: usize,
}

impl StopReport {
    /// True when every task wound down within the shutdown timeout.
    pub fn clean(&self) -> bool {
        self.core_joined && self.scanners_joined == self.scanners_total
    }
}

/// Orchestrates the scanners and the fixed-rate processing loop.
///
/// Ingestion cadence and processing cadence are decoupled by the bounded
/// reading channel; the loop runs once per tick interval regardless of
/// traffic. All target mutation is confined to the loop task, so the
/// tracker needs no locking.
pub struct Runtime {
    config: RadarConfig,
    scanners: Mutex<Vec<Box<dyn Scanner>>>,
    metrics: Arc<MetricsRecorder>,
    stop: Arc<AtomicBool>,
    started: AtomicBool,
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
    snapshot_rx: watch::Receiver<Snapshot>,
    reading_tx: Mutex<Option<mpsc::Sender<Reading>>>,
    core_task: Mutex<Option<JoinHandle<()>>>,
    scanner_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Runtime {
    pub fn new(
        config: RadarConfig,
        scanners: Vec<Box<dyn Scanner>>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let (snapshot_tx, snapshot_rx) = channels::snapshot_mailbox();
        Self {
            config,
            scanners: Mutex::new(scanners),
            metrics,
            stop: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            snapshot_tx: Arc::new(snapshot_tx),
            snapshot_rx,
            reading_tx: Mutex::new(None),
            core_task: Mutex::new(None),
            scanner_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Starts the scanners and the processing loop. Idempotent; a second
    /// call is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let (reading_tx, reading_rx) = channels::reading_channel(&self.config);
        let mut tasks = Vec::new();
        for scanner in self.scanners.lock().unwrap().drain(..) {
            info!("starting scanner {}", scanner.name());
            tasks.push(scanner.spawn(reading_tx.clone(), self.stop.clone()));
        }
        *self.scanner_tasks.lock().unwrap() = tasks;
        *self.reading_tx.lock().unwrap() = Some(reading_tx);

        let tracker = Tracker::new(self.config.clone());
        let task = tokio::spawn(core_loop(
            self.config.clone(),
            tracker,
            reading_rx,
            self.snapshot_tx.clone(),
            self.stop.clone(),
            self.metrics.clone(),
        ));
        *self.core_task.lock().unwrap() = Some(task);
    }

    /// Signals shutdown, joins every task within the shutdown timeout and
    /// drains the channels. Reentrant and thread-safe; a second call
    /// returns an empty, clean report.
    ///
    /// A join timeout abandons the task rather than killing it; the
    /// condition is degraded but not fatal.
    pub async fn stop(&self) -> StopReport {
        self.stop.store(true, Ordering::SeqCst);

        let core = self.core_task.lock().unwrap().take();
        let scanners: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.scanner_tasks.lock().unwrap());
        let join_timeout = self.config.join_timeout();

        let mut report = StopReport {
            core_joined: true,
            scanners_joined: 0,
            scanners_total: scanners.len(),
        };

        if let Some(task) = core {
            if timeout(join_timeout, task).await.is_err() {
                warn!(
                    "processing loop did not stop within {:?}; abandoning it",
                    join_timeout
                );
                report.core_joined = false;
            }
        }
        for task in scanners {
            match timeout(join_timeout, task).await {
                Ok(_) => report.scanners_joined += 1,
                Err(_) => warn!(
                    "scanner task did not stop within {:?}; abandoning it",
                    join_timeout
                ),
            }
        }

        // Drop the producer handle and evict any unread snapshot so nothing
        // stale lingers behind a stopped runtime.
        self.reading_tx.lock().unwrap().take();
        self.snapshot_tx.send_replace(Snapshot::default());
        report
    }

    /// Liveness probe of the processing loop.
    pub fn is_running(&self) -> bool {
        self.core_task
            .lock()
            .unwrap()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Subscription to published snapshots; always holds the latest one.
    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Producer handle for external reading sources, available while the
    /// runtime is running.
    pub fn readings(&self) -> Option<mpsc::Sender<Reading>> {
        self.reading_tx.lock().unwrap().clone()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }
}

/// One cycle per tick interval: bounded receive, optional update, aging,
/// snapshot publication, then sleep out the remainder. Overruns proceed
/// immediately with no catch-up of missed ticks.
async fn core_loop(
    config: RadarConfig,
    mut tracker: Tracker,
    mut readings: mpsc::Receiver<Reading>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    stop: Arc<AtomicBool>,
    metrics: Arc<MetricsRecorder>,
) {
    let interval = config.tick_interval();
    while !stop.load(Ordering::SeqCst) {
        let cycle_start = Instant::now();

        // A missing reading is normal; aging continues on wall clock.
        let reading = match timeout(interval, readings.recv()).await {
            Ok(Some(reading)) => Some(reading),
            Ok(None) | Err(_) => None,
        };

        let now = reading.as_ref().map(|r| r.ts).unwrap_or_else(epoch_seconds);
        if let Some(reading) = reading {
            tracker.update(reading);
            metrics.record_reading();
        }
        tracker.tick(now);
        snapshots.send_replace(tracker.build_snapshot(now));
        metrics.record_snapshot();

        if let Some(remaining) = interval.checked_sub(cycle_start.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }

    // Leave nothing queued behind a stopped loop.
    while readings.try_recv().is_ok() {}
    debug!("processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use std::time::Duration;

    fn test_config() -> RadarConfig {
        let mut config = RadarConfig::default();
        config.tick_rate = 20.0;
        config
    }

    /// Emits one reading up front, then idles until told to stop.
    struct OneShotScanner {
        id: &'static str,
    }

    impl Scanner for OneShotScanner {
        fn name(&self) -> &'static str {
            "oneshot"
        }

        fn spawn(
            self: Box<Self>,
            readings: mpsc::Sender<Reading>,
            stop: Arc<AtomicBool>,
        ) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = readings.try_send(Reading::new(
                    Source::Sim,
                    self.id,
                    -60,
                    epoch_seconds(),
                ));
                while !stop.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        }
    }

    #[tokio::test]
    async fn runtime_publishes_a_snapshot_within_two_ticks() {
        let runtime = Runtime::new(
            test_config(),
            vec![Box::new(OneShotScanner { id: "unit" })],
            Arc::new(MetricsRecorder::new()),
        );
        let mut snapshots = runtime.snapshots();
        runtime.start();

        let bound = runtime.config().tick_interval() * 2;
        timeout(bound, snapshots.changed())
            .await
            .expect("no snapshot within two ticks")
            .unwrap();
        let snap = snapshots.borrow_and_update().clone();
        assert_eq!(snap.stats.total, 1);
        assert_eq!(snap.targets[0].id, "unit");

        assert!(runtime.is_running());
        let report = runtime.stop().await;
        assert!(report.clean());
        assert!(!runtime.is_running());
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let runtime = Runtime::new(test_config(), Vec::new(), Arc::new(MetricsRecorder::new()));
        runtime.start();
        runtime.start();
        assert!(runtime.is_running());
        runtime.stop().await;
    }

    #[tokio::test]
    async fn stop_is_reentrant() {
        let runtime = Runtime::new(test_config(), Vec::new(), Arc::new(MetricsRecorder::new()));
        runtime.start();
        let first = runtime.stop().await;
        assert!(first.clean());
        let second = runtime.stop().await;
        assert!(second.clean());
        assert_eq!(second.scanners_total, 0);
        assert!(!runtime.is_running());
    }

    #[tokio::test]
    async fn external_producers_feed_the_loop() {
        let runtime = Runtime::new(test_config(), Vec::new(), Arc::new(MetricsRecorder::new()));
        let mut snapshots = runtime.snapshots();
        runtime.start();

        let tx = runtime.readings().expect("running runtime exposes a sender");
        tx.try_send(Reading::new(Source::Wifi, "ext", -45, epoch_seconds()))
            .unwrap();

        let seen = timeout(Duration::from_secs(2), async {
            loop {
                snapshots.changed().await.unwrap();
                let found = snapshots
                    .borrow_and_update()
                    .targets
                    .iter()
                    .any(|target| target.id == "ext");
                if found {
                    break;
                }
            }
        })
        .await;
        assert!(seen.is_ok(), "external reading never surfaced");

        runtime.stop().await;
    }

    #[tokio::test]
    async fn idle_targets_age_out_on_wall_clock() {
        let mut config = test_config();
        config.stale_timeout = 0.05;
        let runtime = Runtime::new(
            config,
            vec![Box::new(OneShotScanner { id: "fading" })],
            Arc::new(MetricsRecorder::new()),
        );
        let mut snapshots = runtime.snapshots();
        runtime.start();

        // The lone reading ages past 2x staleness with no further traffic.
        let gone = timeout(Duration::from_secs(2), async {
            let mut appeared = false;
            loop {
                snapshots.changed().await.unwrap();
                let total = snapshots.borrow_and_update().stats.total;
                if total > 0 {
                    appeared = true;
                } else if appeared {
                    break;
                }
            }
        })
        .await;
        assert!(gone.is_ok(), "target never aged out");

        runtime.stop().await;
    }
}
