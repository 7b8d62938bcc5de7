//! Outbound events of the rollup pipeline

use crate::model::{Alert, MachineType, OperationSummary, PeriodRecord, PeriodScope};

/// Receives alerts, completed period records and refreshed summaries
///
/// Called synchronously from the tick loop.
#[cfg_attr(test, mockall::automock)]
pub trait Reporter: Send + Sync {
    fn on_alert(&self, alert: &Alert);

    /// A short or long period record was inserted into its history
    fn on_period_record(&self, scope: PeriodScope, slot: usize, record: &PeriodRecord);

    fn on_summary_updated(&self, slot: usize, summary: &OperationSummary);
}

/// Reporter that renders every event through `tracing`
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn on_alert(&self, alert: &Alert) {
        tracing::warn!(
            machine = %alert.machine_id,
            current = alert.current,
            threshold = alert.threshold,
            "ALERT for machine {}, trailing average {:.3}",
            alert.machine_id,
            alert.trailing_average
        );
    }

    fn on_period_record(&self, scope: PeriodScope, slot: usize, record: &PeriodRecord) {
        tracing::info!(
            %scope,
            slot,
            start = %record.start_time,
            end = %record.end_time,
            temperature = record.avg_temperature,
            humidity = record.avg_humidity,
            pressure = record.avg_pressure,
            air_density = record.air_density,
            "Period record completed"
        );
        for (machine_type, current) in record.avg_current.iter() {
            tracing::debug!(
                %scope,
                "  {:<15} current {:>9.3}  ratio {:>9.5}",
                machine_type.to_string(),
                current,
                record.density_ratio[machine_type]
            );
        }
    }

    fn on_summary_updated(&self, slot: usize, summary: &OperationSummary) {
        tracing::info!(
            slot,
            temperature = summary.avg_temperature,
            humidity = summary.avg_humidity,
            pressure = summary.avg_pressure,
            air_density = summary.avg_air_density,
            air_density_variance = summary.air_density_variance,
            "Operation summary updated"
        );
        for machine_type in MachineType::ALL_TYPES {
            tracing::info!(
                slot,
                "  {:<15} current {:>9.3}  ratio {:>9.5}  variance {:>9.6}",
                machine_type.to_string(),
                summary.avg_current[machine_type],
                summary.avg_ratio[machine_type],
                summary.ratio_variance[machine_type]
            );
        }
    }
}
