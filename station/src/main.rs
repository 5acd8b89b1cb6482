use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use radarcore::model::Snapshot;
use radarcore::runtime::Runtime;
use radarcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use radarcore::Scanner;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::Instant;

mod bridge;
mod config;
mod scanners;

use config::StationConfig;
use scanners::sim::Scenario;
use scanners::{SimScanner, WifiScanner};

#[derive(Parser)]
#[command(author, version, about = "RF presence radar station")]
struct Args {
    /// Load a station config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulator scenario override
    #[arg(long, value_enum)]
    scenario: Option<Scenario>,
    /// Simulator seed override
    #[arg(long)]
    seed: Option<u64>,
    /// Run for a fixed number of seconds, then stop
    #[arg(long)]
    duration: Option<f64>,
    /// Serve the snapshot HTTP bridge
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Bridge port override
    #[arg(long)]
    port: Option<u16>,
    /// Append a run summary line to this file on exit
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StationConfig::load(path)?,
        None => StationConfig::default(),
    };
    if let Some(scenario) = args.scenario {
        config.sim.scenario = scenario;
    }
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }
    if let Some(port) = args.port {
        config.bridge_port = port;
    }
    config
        .radar
        .validate()
        .context("invalid radar configuration")?;

    let metrics = Arc::new(MetricsRecorder::new());
    let mut scanners: Vec<Box<dyn Scanner>> = Vec::new();
    if config.enable_sim {
        scanners.push(Box::new(SimScanner::new(
            config.sim.clone(),
            &config.radar,
            metrics.clone(),
        )));
    }
    if config.enable_wifi {
        scanners.push(Box::new(WifiScanner::new(
            config.wifi.clone(),
            metrics.clone(),
        )));
    }
    if scanners.is_empty() {
        warn!("no scanners enabled; only external producers will feed the radar");
    }

    let runtime = Runtime::new(config.radar.clone(), scanners, metrics.clone());
    runtime.start();

    if args.serve {
        bridge::spawn(config.bridge_port, runtime.snapshots(), metrics.clone());
        info!(
            "snapshot bridge listening on 127.0.0.1:{}",
            config.bridge_port
        );
    }

    let mut console = runtime.snapshots();
    match args.duration {
        Some(seconds) => console_loop(&mut console, Some(seconds)).await,
        None => {
            info!("radar running; Ctrl+C to stop");
            tokio::select! {
                result = signal::ctrl_c() => {
                    result.context("awaiting Ctrl+C")?;
                }
                _ = console_loop(&mut console, None) => {}
            }
        }
    }

    let last = console.borrow().clone();
    let report = runtime.stop().await;
    if !report.clean() {
        warn!(
            "shutdown degraded: core_joined={} scanners_joined={}/{}",
            report.core_joined, report.scanners_joined, report.scanners_total
        );
    }

    let counts = metrics.snapshot();
    println!(
        "Run -> targets {} (active {}, stale {}), selected {:?}, readings {}, snapshots {}",
        last.stats.total,
        last.stats.active,
        last.stats.stale,
        last.selected,
        counts.readings,
        counts.snapshots
    );
    if let Some(path) = &args.report {
        write_report(path, &last, &counts)
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    Ok(())
}

/// Periodic one-line summaries of the latest snapshot; the consumer's own
/// loop-local state, nothing ambient.
async fn console_loop(snapshots: &mut watch::Receiver<Snapshot>, seconds: Option<f64>) {
    let deadline = seconds.map(|secs| Instant::now() + Duration::from_secs_f64(secs));
    loop {
        let step = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return;
                }
                (deadline - now).min(Duration::from_secs(1))
            }
            None => Duration::from_secs(1),
        };
        tokio::time::sleep(step).await;

        let snap = snapshots.borrow_and_update().clone();
        info!(
            "targets {} (active {}, stale {}) selected {:?}",
            snap.stats.total, snap.stats.active, snap.stats.stale, snap.selected
        );
    }
}

fn write_report(path: &Path, snap: &Snapshot, counts: &MetricsSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let line = format!(
        "targets={} active={} stale={} selected={} readings={} snapshots={} dropped={}\n",
        snap.stats.total,
        snap.stats.active,
        snap.stats.stale,
        snap.selected.as_deref().unwrap_or("-"),
        counts.readings,
        counts.snapshots,
        counts.dropped
    );
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
