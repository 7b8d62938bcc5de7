//! Engine: drives the tick loop over the machine park

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::MachineParkApi;
use crate::config::{Config, PollingConfig};
use crate::reporter::Reporter;
use crate::rollup::{FleetRollup, RollupSettings, TickSample};
use crate::{MachineparkError, Result};

/// The engine fetches readings every tick and feeds them to the rollup
pub struct Engine {
    api: Arc<dyn MachineParkApi>,
    reporter: Arc<dyn Reporter>,
    config: Config,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        api: Arc<dyn MachineParkApi>,
        reporter: Arc<dyn Reporter>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            reporter,
            config: config.clone(),
            cancel,
        }
    }

    /// Fetch the roster and build the rollup state for it
    pub async fn initialize(&self) -> Result<FleetRollup> {
        let settings = RollupSettings::from_config(&self.config)?;
        let roster = self.api.fetch_roster().await?;
        tracing::info!(
            "Monitoring {} machines, trailing window of {} samples",
            roster.len(),
            settings.window_capacity
        );
        Ok(FleetRollup::new(
            settings,
            &roster,
            &self.config.fleet_sizes,
        ))
    }

    /// Fetch the sensor and every machine once
    ///
    /// Failed fetches are logged and left as gaps in the sample.
    pub async fn poll(&self, rollup: &FleetRollup) -> TickSample {
        let now = chrono::Utc::now().timestamp();

        let sensor = match self.api.fetch_sensor().await {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                tracing::warn!("Fetching sensor failed: {}", e);
                None
            }
        };

        let mut machines = Vec::with_capacity(rollup.machines().len());
        for machine in rollup.machines() {
            let reading = match self.api.fetch_machine(machine.id()).await {
                Ok(reading) => Some(reading),
                Err(e) => {
                    tracing::warn!("Fetching machine {} failed: {}", machine.id(), e);
                    None
                }
            };
            machines.push(reading);
        }

        TickSample {
            now,
            sensor,
            machines,
        }
    }

    /// Run ticks until `run_for` elapses or the cancellation token fires
    ///
    /// `None` runs until cancelled. The final rollup state is returned.
    pub async fn run(&self, run_for: Option<Duration>) -> Result<FleetRollup> {
        let mut rollup = self.initialize().await?;
        let deadline = run_for.map(|d| Instant::now() + d);
        let polling: &PollingConfig = &self.config.polling;
        let interval = polling.interval();
        let max_failures = polling.max_consecutive_failures.max(1);
        let mut failures = 0u32;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!("Run duration elapsed");
                break;
            }
            if self.cancel.is_cancelled() {
                break;
            }

            let sample = self.poll(&rollup).await;
            if sample.sensor.is_none() && sample.machines.iter().all(Option::is_none) {
                failures += 1;
                tracing::warn!("Every fetch failed this tick ({} in a row)", failures);
                if failures >= max_failures {
                    tracing::error!("Giving up after {} failed ticks", failures);
                    return Err(MachineparkError::FetchExhausted(failures));
                }
            } else {
                failures = 0;
            }

            rollup.tick(&sample, self.reporter.as_ref())?;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Tick loop cancelled");
                    break;
                }
            }
        }

        Ok(rollup)
    }
}
