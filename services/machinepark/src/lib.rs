//! Machinepark - machine park monitoring and rollup service
//!
//! Polls a fleet of machines and an environmental sensor, raises alerts when a
//! machine's current exceeds its threshold, and rolls readings up into short
//! and long period records with per-slot operation summaries.

pub mod accumulator;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod model;
pub mod reporter;
pub mod rollup;
pub mod schedule;
pub mod stats;
pub mod window;

pub use config::{load_config, Config};
pub use error::{MachineparkError, Result};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::{HttpMachineParkApi, MachineParkApi};
use crate::engine::Engine;
use crate::io::ReqwestHttpClient;
use crate::reporter::{LogReporter, Reporter};

/// Run the machinepark service for `run_minutes` (0 runs until Ctrl-C)
pub async fn run(config: Config, run_minutes: u64) -> Result<()> {
    config.validate()?;

    let http = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.api.timeout_seconds,
    ))?);
    let api: Arc<dyn MachineParkApi> = Arc::new(HttpMachineParkApi::new(&config.api.base_url, http));
    let reporter: Arc<dyn Reporter> = Arc::new(LogReporter);
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    let engine = Engine::new(api, reporter, &config, cancel);
    let run_for = (run_minutes > 0).then(|| Duration::from_secs(run_minutes * 60));

    tracing::info!(
        "Monitoring set for {} minutes (0 = indefinite)",
        run_minutes
    );
    engine.run(run_for).await?;
    tracing::info!("Monitoring complete");

    Ok(())
}
