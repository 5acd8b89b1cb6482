use crate::config::WifiConfig;
use anyhow::{Context, Result};
use log::{debug, error, warn};
use radarcore::model::{Reading, Source};
use radarcore::runtime::{epoch_seconds, Scanner};
use radarcore::telemetry::MetricsRecorder;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

/// Scanner shelling out to `iw` for per-BSS signal readings.
///
/// Scan failures are absorbed here; the runtime only ever sees readings or
/// silence.
pub struct WifiScanner {
    config: WifiConfig,
    signal_re: Regex,
    metrics: Arc<MetricsRecorder>,
}

impl WifiScanner {
    pub fn new(config: WifiConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            config,
            signal_re: Regex::new(r"signal:\s*(-?\d+)").expect("static pattern"),
            metrics,
        }
    }

    async fn run(self, readings: mpsc::Sender<Reading>, stop: Arc<AtomicBool>) {
        let scan_interval = Duration::from_secs_f64(self.config.scan_interval);
        while !stop.load(Ordering::SeqCst) {
            let started = Instant::now();
            match self.scan_once().await {
                Ok(batch) => {
                    debug!("wifi scan: {} stations", batch.len());
                    for reading in batch {
                        match readings.try_send(reading) {
                            Ok(()) => {}
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                self.metrics.record_dropped();
                                warn!("reading channel full; dropping wifi reading");
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => return,
                        }
                    }
                }
                Err(err) => error!("wifi scan failed: {:#}", err),
            }
            if let Some(remaining) = scan_interval.checked_sub(started.elapsed()) {
                tokio::time::sleep(remaining).await;
            }
        }
    }

    async fn scan_once(&self) -> Result<Vec<Reading>> {
        let scan_timeout = Duration::from_secs_f64(self.config.scan_timeout);
        let output = timeout(
            scan_timeout,
            Command::new("iw")
                .args(["dev", &self.config.interface, "scan"])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("iw scan timed out")?
        .context("running iw scan")?;

        if !output.status.success() {
            anyhow::bail!("iw scan exited with {}", output.status);
        }
        Ok(self.parse_scan(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Pairs each `BSS` header with the `signal:` line that follows it.
    fn parse_scan(&self, output: &str) -> Vec<Reading> {
        let ts = epoch_seconds();
        let mut readings = Vec::new();
        let mut bssid: Option<String> = None;
        let mut rssi: Option<i32> = None;

        for line in output.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("BSS ") {
                if let (Some(id), Some(signal)) = (bssid.take(), rssi.take()) {
                    readings.push(Self::reading(id, signal, ts));
                }
                bssid = rest
                    .split_whitespace()
                    .next()
                    .and_then(|token| token.split('(').next())
                    .map(str::to_string);
                rssi = None;
            } else if let Some(caps) = self.signal_re.captures(line) {
                rssi = caps.get(1).and_then(|m| m.as_str().parse().ok());
            }
        }
        if let (Some(id), Some(signal)) = (bssid, rssi) {
            readings.push(Self::reading(id, signal, ts));
        }
        readings
    }

    fn reading(bssid: String, rssi: i32, ts: f64) -> Reading {
        Reading::new(Source::Wifi, bssid, rssi, ts).with_meta("scanner", "wifi")
    }
}

impl Scanner for WifiScanner {
    fn name(&self) -> &'static str {
        "wifi"
    }

    fn spawn(
        self: Box<Self>,
        readings: mpsc::Sender<Reading>,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(readings, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN_OUTPUT: &str = "\
BSS aa:bb:cc:dd:ee:01(on wlan0) -- associated
\tTSF: 1234 usec
\tsignal: -58.00 dBm
\tSSID: HomeNet
BSS aa:bb:cc:dd:ee:02(on wlan0)
\tsignal: -71.00 dBm
\tSSID: Cafe
BSS aa:bb:cc:dd:ee:03(on wlan0)
\tSSID: NoSignalHere
";

    fn scanner() -> WifiScanner {
        WifiScanner::new(WifiConfig::default(), Arc::new(MetricsRecorder::new()))
    }

    #[test]
    fn scan_output_pairs_bss_with_signal() {
        let readings = scanner().parse_scan(SCAN_OUTPUT);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].id, "aa:bb:cc:dd:ee:01");
        assert_eq!(readings[0].rssi, -58);
        assert_eq!(readings[0].source, Source::Wifi);
        assert_eq!(readings[1].id, "aa:bb:cc:dd:ee:02");
        assert_eq!(readings[1].rssi, -71);
    }

    #[test]
    fn empty_scan_output_yields_no_readings() {
        assert!(scanner().parse_scan("").is_empty());
    }
}
