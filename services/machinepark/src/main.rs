//! Machinepark CLI
//!
//! Command-line interface for the machine park monitoring and rollup service.

use std::path::PathBuf;

use clap::Parser;
use machinepark::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "machinepark")]
#[command(about = "Machine park monitoring, alerting and rollup service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to monitor in minutes (0 = until interrupted)
    #[arg(short, long, default_value_t = 0)]
    run_minutes: u64,

    /// Poll interval in seconds (overrides config file)
    #[arg(long)]
    interval: Option<f64>,

    /// API base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = parse_log_level)]
    log_level: Level,
}

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid log level: {}. Use: trace, debug, info, warn, error",
            s
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, run_minutes={}, interval={:?}, log_level={:?}",
        args.config,
        args.run_minutes,
        args.interval,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(interval) = args.interval {
        config.polling.interval_seconds = interval;
    }
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    tracing::info!("Starting machinepark service");
    tracing::debug!(
        "API: {}, poll interval: {}s, short period: {}h, long period: {}h",
        config.api.base_url,
        config.polling.interval_seconds,
        config.rollup.short_period_hours,
        config.rollup.long_period_hours
    );

    machinepark::run(config, args.run_minutes).await?;

    Ok(())
}
