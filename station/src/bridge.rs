use radarcore::model::Snapshot;
use radarcore::telemetry::MetricsRecorder;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use warp::Filter;

fn bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Serves the latest snapshot and the runtime counters over HTTP.
///
/// The snapshot route always answers with whatever the mailbox currently
/// holds; a renderer polling it never sees a backlog.
pub fn spawn(
    port: u16,
    snapshots: watch::Receiver<Snapshot>,
    metrics: Arc<MetricsRecorder>,
) -> JoinHandle<()> {
    let snapshot_route = warp::path("snapshot")
        .and(warp::get())
        .map(move || warp::reply::json(&*snapshots.borrow()));

    let metrics_route = warp::path("metrics")
        .and(warp::get())
        .map(move || warp::reply::json(&metrics.snapshot()));

    let health_route = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ok"})));

    let routes = snapshot_route.or(metrics_route).or(health_route);
    tokio::spawn(warp::serve(routes).run(bind_address(port)))
}
