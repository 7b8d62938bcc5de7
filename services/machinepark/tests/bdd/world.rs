//! BDD test world for machinepark service

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;
use machinepark::config::Config;
use machinepark::io::{HttpClient, HttpResponse};
use machinepark::model::{
    Alert, MachineReading, OperationSummary, PeriodRecord, PeriodScope, RosterEntry, SensorReading,
};
use machinepark::reporter::Reporter;
use machinepark::rollup::FleetRollup;
use machinepark::schedule::Timestop;
use machinepark::window::TrailingWindow;

/// HTTP client answering from a table of canned responses keyed by path
///
/// Unknown paths answer 404.
#[derive(Debug, Default)]
pub struct CannedHttpClient {
    pub responses: HashMap<String, (u16, String)>,
}

#[async_trait]
impl HttpClient for CannedHttpClient {
    async fn get(&self, url: &str) -> machinepark::Result<HttpResponse> {
        let (status, body) = self
            .responses
            .iter()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or((404, String::new()));
        Ok(HttpResponse { status, body })
    }
}

/// Reporter that records every event
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub alerts: Mutex<Vec<Alert>>,
    pub records: Mutex<Vec<(PeriodScope, usize, PeriodRecord)>>,
    pub summaries: Mutex<Vec<(usize, OperationSummary)>>,
}

impl Reporter for RecordingReporter {
    fn on_alert(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }

    fn on_period_record(&self, scope: PeriodScope, slot: usize, record: &PeriodRecord) {
        self.records
            .lock()
            .unwrap()
            .push((scope, slot, record.clone()));
    }

    fn on_summary_updated(&self, slot: usize, summary: &OperationSummary) {
        self.summaries.lock().unwrap().push((slot, summary.clone()));
    }
}

#[derive(Debug, Default, World)]
pub struct MachineparkWorld {
    // Trailing window testing
    pub window: Option<TrailingWindow>,
    pub average: Option<f64>,

    // Timestop testing
    pub rotation: Vec<u32>,
    pub timestop: Option<Timestop>,
    pub timestop_result: Option<machinepark::Result<()>>,

    // Rollup testing
    pub config: Config,
    pub roster: Vec<RosterEntry>,
    pub rollup: Option<FleetRollup>,
    pub reporter: Arc<RecordingReporter>,
    pub pending_readings: Vec<Option<MachineReading>>,
    pub clock: i64,

    // API testing
    pub http: CannedHttpClient,
    pub roster_result: Option<machinepark::Result<Vec<RosterEntry>>>,
    pub machine_result: Option<machinepark::Result<MachineReading>>,
    pub sensor_result: Option<machinepark::Result<SensorReading>>,
}
