//! Exam Monitor Runner
//!
//! Wires the capture buffers to a session controller and replays recorded
//! observations through it.

pub mod replay;

pub use replay::{replay, ControlCommand, ReplayLine, ReplayOptions, ReplayRecord, ReplaySummary};

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging (stderr, so stdout stays machine readable)
pub fn init_logging(level: Level, json: bool) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Start the Prometheus exporter; a failure only disables metrics
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("Prometheus metrics exporter listening on {}", addr),
        Err(e) => warn!("Metrics exporter unavailable on {}: {}", addr, e),
    }
}
