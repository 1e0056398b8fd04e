use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use poolwatch::runner::{self, ctrl_c};
use poolwatch::Settings;

#[derive(Parser, Debug)]
#[command(name = "poolwatch")]
#[command(about = "Poll a pool controller's web panel into a time series")]
struct Args {
    /// Settings file (TOML). POOLWATCH_* environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collect one snapshot, print it as JSON and exit
    #[arg(long)]
    once: bool,

    /// Log filter, e.g. "debug" or "poolwatch_collector=trace"
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    init_logging(args.log_level.as_deref(), &settings.logging.level);

    let collector = runner::build_collector(&settings)?;

    if args.once {
        let report = collector.run_cycle().await;
        collector.shutdown();
        let report = report.context("Collection failed")?;
        println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
        return Ok(());
    }

    info!(
        base_url = %settings.remote.base_url,
        interval_secs = settings.collection.interval_secs,
        "Starting collection"
    );
    let summary = runner::run_until(&collector, settings.interval(), ctrl_c()).await;
    info!(cycles = summary.cycles, failed = summary.failed, "Stopped");
    Ok(())
}

/// CLI flag first, then `RUST_LOG`, then the settings file.
fn init_logging(cli: Option<&str>, configured: &str) {
    let filter = match cli {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
