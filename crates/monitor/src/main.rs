//! Exam Monitor - Replay Entry Point

use anyhow::Context;
use clap::{ArgAction, Parser};
use monitor::{init_logging, init_metrics, replay, ReplayOptions};
use proctor_core::ProctorConfig;
use session::SessionController;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, Level};

/// Replay recorded observations through an exam session
#[derive(Parser)]
#[command(name = "proctor-monitor")]
#[command(version)]
#[command(about = "Score recorded exam observations and print risk events", long_about = None)]
struct Cli {
    /// Observation file, one JSON record per line (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Configuration file (PROCTOR_* environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not start calibrating before the first record (wait for a command)
    #[arg(long = "no-calibrate", action = ArgAction::SetFalse)]
    calibrate: bool,

    /// Print every tick report, not only risk events
    #[arg(long)]
    emit_ticks: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json)?;

    info!("=== Exam Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_addr {
        init_metrics(addr);
    }

    let config = ProctorConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let mut controller = SessionController::new(Arc::new(config))?;

    let options = ReplayOptions {
        auto_start: cli.calibrate,
        emit_ticks: cli.emit_ticks,
    };

    let input = open_input(&cli.input).await?;
    let mut stdout = std::io::stdout().lock();
    let summary = replay(&mut controller, input, &mut stdout, &options).await?;

    info!("Summary: {:?}", summary);
    Ok(())
}

async fn open_input(path: &Path) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
