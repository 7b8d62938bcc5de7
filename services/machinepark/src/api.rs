//! Machine park REST client
//!
//! Fetches the fleet roster once at startup and machine/sensor readings on
//! every tick.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::io::HttpClient;
use crate::model::{MachineReading, MachineType, RosterEntry, SensorReading};
use crate::{MachineparkError, Result};

const SENSOR_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Data source for the tick loop
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MachineParkApi: Send + Sync {
    /// Machines of the park with their inferred types
    async fn fetch_roster(&self) -> Result<Vec<RosterEntry>>;

    /// Current draw and alert threshold of one machine
    async fn fetch_machine(&self, id: &str) -> Result<MachineReading>;

    /// Latest environmental sensor values
    async fn fetch_sensor(&self) -> Result<SensorReading>;
}

#[derive(Debug, Deserialize)]
struct MachineDetail {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    current: Option<f64>,
    #[serde(default)]
    current_alert: Option<f64>,
}

/// Each field is reported as `[timestamp, value]`
#[derive(Debug, Deserialize)]
struct EnvSensor {
    temperature: (String, f64),
    humidity: (String, f64),
    pressure: (String, f64),
}

/// [`MachineParkApi`] over the park's HTTP endpoints
pub struct HttpMachineParkApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpMachineParkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMachineParkApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpMachineParkApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).await?;
        if response.status != 200 {
            return Err(MachineparkError::Fetch(format!(
                "GET {} returned status {}",
                url, response.status
            )));
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn machine_detail(&self, id: &str) -> Result<MachineDetail> {
        self.get_json(&format!("{}/machine/{}", self.base_url, id))
            .await
    }
}

/// Machine id from a roster entry such as `$API_ROOT/machine/<uuid>`
fn machine_id(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Parse the sensor's local timestamp
pub fn parse_sensor_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), SENSOR_TIME_FORMAT).map_err(|e| {
        MachineparkError::Fetch(format!("Invalid sensor timestamp '{}': {}", value, e))
    })
}

#[async_trait]
impl MachineParkApi for HttpMachineParkApi {
    async fn fetch_roster(&self) -> Result<Vec<RosterEntry>> {
        let url = format!("{}/machines", self.base_url);
        let entries: Vec<String> = self.get_json(&url).await?;
        tracing::debug!("Roster lists {} machines", entries.len());

        let mut roster = Vec::with_capacity(entries.len());
        for entry in &entries {
            let id = machine_id(entry);
            let detail = match self.machine_detail(id).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!("Skipping machine {}: {}", id, e);
                    continue;
                }
            };
            let name = detail.name.unwrap_or_default();
            match MachineType::from_name(&name) {
                Some(machine_type) => roster.push(RosterEntry {
                    id: id.to_string(),
                    machine_type,
                }),
                None => tracing::warn!("Skipping machine {}: unknown type '{}'", id, name),
            }
        }

        if roster.is_empty() {
            return Err(MachineparkError::Fetch(
                "Machine roster is empty".to_string(),
            ));
        }
        Ok(roster)
    }

    async fn fetch_machine(&self, id: &str) -> Result<MachineReading> {
        let detail = self.machine_detail(id).await?;
        let current = detail
            .current
            .ok_or_else(|| MachineparkError::Fetch(format!("No current for machine {}", id)))?;
        let threshold = detail.current_alert.ok_or_else(|| {
            MachineparkError::Fetch(format!("No current_alert for machine {}", id))
        })?;
        Ok(MachineReading { current, threshold })
    }

    async fn fetch_sensor(&self) -> Result<SensorReading> {
        let url = format!("{}/env-sensor", self.base_url);
        let env: EnvSensor = self.get_json(&url).await?;
        Ok(SensorReading {
            temperature: env.temperature.1,
            humidity: env.humidity.1,
            pressure: env.pressure.1,
            local_time: parse_sensor_time(&env.temperature.0)?,
        })
    }
}
