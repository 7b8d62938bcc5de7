//! Per-tick rollup pipeline
//!
//! Every tick feeds fresh readings into the machines' trailing windows and
//! period accumulators. When the sensor's local clock has advanced by a
//! short period the accumulators are reduced into a short [`PeriodRecord`];
//! when it reaches the next timestop hour, the short records produced since
//! the previous timestop are reduced into a long record for the active slot
//! and that slot's [`OperationSummary`] is recomputed.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};

use crate::accumulator::{PeriodAccumulator, SensorSeries};
use crate::config::Config;
use crate::history::{History, Mark};
use crate::model::{
    Alert, FleetSizes, MachineReading, MachineType, OperationSummary, PerType, PeriodRecord,
    PeriodScope, Reading, RosterEntry, SensorReading,
};
use crate::reporter::Reporter;
use crate::schedule::{self, Timestop};
use crate::stats::{air_density, density_ratios, mean, population_variance};
use crate::window::TrailingWindow;
use crate::Result;

/// Sizing and timing of the rollup pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RollupSettings {
    pub window_capacity: usize,
    pub alert_horizon: Duration,
    pub accumulator_capacity: usize,
    pub short_period: chrono::Duration,
    pub short_history_depth: usize,
    pub long_history_depth: usize,
    pub rotation: Vec<u32>,
}

impl RollupSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let alert_horizon = config.polling.alert_history();
        Ok(Self {
            window_capacity: TrailingWindow::capacity_for(config.polling.interval(), alert_horizon),
            alert_horizon,
            accumulator_capacity: config.rollup.accumulator_capacity,
            short_period: config.rollup.short_period(),
            short_history_depth: config.rollup.short_history_depth,
            long_history_depth: config.rollup.long_history_depth,
            rotation: schedule::rotation(
                config.rollup.rotation_seed_hour,
                config.rollup.long_period_hours,
            )?,
        })
    }
}

/// Fleet size per type from the roster, with explicit overrides applied
///
/// `All` is the roster size unless overridden.
pub fn fleet_sizes(roster: &[RosterEntry], overrides: &BTreeMap<MachineType, usize>) -> FleetSizes {
    let mut sizes = FleetSizes::default();
    for entry in roster {
        sizes[entry.machine_type] += 1;
    }
    sizes[MachineType::All] = roster.len();
    for (machine_type, size) in overrides {
        sizes[*machine_type] = *size;
    }
    sizes
}

/// Live state of one machine
#[derive(Debug, Clone)]
pub struct Machine {
    id: String,
    machine_type: MachineType,
    alert_threshold: f64,
    last_value: f64,
    window: TrailingWindow,
    accumulator: PeriodAccumulator,
}

impl Machine {
    fn new(entry: &RosterEntry, settings: &RollupSettings) -> Self {
        Self {
            id: entry.id.clone(),
            machine_type: entry.machine_type,
            alert_threshold: 0.0,
            last_value: 0.0,
            window: TrailingWindow::new(settings.window_capacity, settings.alert_horizon),
            accumulator: PeriodAccumulator::new(settings.accumulator_capacity),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    pub fn alert_threshold(&self) -> f64 {
        self.alert_threshold
    }

    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    pub fn window(&self) -> &TrailingWindow {
        &self.window
    }

    pub fn accumulator(&self) -> &PeriodAccumulator {
        &self.accumulator
    }

    /// Check the alert condition against prior history, then record the reading
    fn observe(&mut self, reading: MachineReading, now: i64, reporter: &dyn Reporter) {
        self.last_value = reading.current;
        self.alert_threshold = reading.threshold;

        if reading.current > reading.threshold {
            let trailing_average = self
                .window
                .trailing_average(now)
                .unwrap_or(reading.current);
            reporter.on_alert(&Alert {
                machine_id: self.id.clone(),
                current: reading.current,
                threshold: reading.threshold,
                trailing_average,
            });
        }

        let sample = Reading::new(reading.current, now);
        self.window.push(sample);
        if let Err(e) = self.accumulator.push(&self.id, sample) {
            tracing::warn!("{}", e);
        }
    }
}

/// One timestop of the daily rotation with its long history
#[derive(Debug, Clone)]
pub struct Slot {
    hour: u32,
    history: History<PeriodRecord>,
    summary: OperationSummary,
}

impl Slot {
    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn history(&self) -> &History<PeriodRecord> {
        &self.history
    }

    pub fn summary(&self) -> &OperationSummary {
        &self.summary
    }
}

/// Readings gathered for one tick
///
/// `machines` is indexed like the roster; `None` marks a failed fetch.
#[derive(Debug, Clone, Default)]
pub struct TickSample {
    /// Epoch seconds used to timestamp machine readings
    pub now: i64,
    pub sensor: Option<SensorReading>,
    pub machines: Vec<Option<MachineReading>>,
}

/// Owner of all windows, accumulators, histories and summaries
#[derive(Debug)]
pub struct FleetRollup {
    settings: RollupSettings,
    machines: Vec<Machine>,
    fleet_sizes: FleetSizes,
    sensor: SensorSeries,
    short_history: History<PeriodRecord>,
    /// Short records before this mark were consumed by a long flush
    short_mark: Mark,
    slots: Vec<Slot>,
    timestop: Option<Timestop>,
    period_start: Option<NaiveDateTime>,
    /// Sensor hour seen on the previous tick; a timestop fires on entering its hour
    last_hour: Option<u32>,
}

impl FleetRollup {
    pub fn new(
        settings: RollupSettings,
        roster: &[RosterEntry],
        fleet_overrides: &BTreeMap<MachineType, usize>,
    ) -> Self {
        let machines = roster.iter().map(|e| Machine::new(e, &settings)).collect();
        let slots = settings
            .rotation
            .iter()
            .map(|hour| Slot {
                hour: *hour,
                history: History::new(settings.long_history_depth),
                summary: OperationSummary::default(),
            })
            .collect();

        tracing::debug!(
            "Rollup for {} machines, window capacity {}, {} slots",
            roster.len(),
            settings.window_capacity,
            settings.rotation.len()
        );

        Self {
            fleet_sizes: fleet_sizes(roster, fleet_overrides),
            short_history: History::new(settings.short_history_depth),
            short_mark: Mark::default(),
            sensor: SensorSeries::new(settings.accumulator_capacity),
            timestop: None,
            period_start: None,
            last_hour: None,
            machines,
            slots,
            settings,
        }
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn fleet_sizes(&self) -> &FleetSizes {
        &self.fleet_sizes
    }

    pub fn short_history(&self) -> &History<PeriodRecord> {
        &self.short_history
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn timestop(&self) -> Option<&Timestop> {
        self.timestop.as_ref()
    }

    /// Index of the slot the next long flush lands in
    pub fn active_slot(&self) -> usize {
        self.timestop.as_ref().map_or(0, Timestop::slot)
    }

    /// Run one tick
    ///
    /// Fails only on scheduler lookup errors, which indicate a broken
    /// timestop configuration.
    pub fn tick(&mut self, sample: &TickSample, reporter: &dyn Reporter) -> Result<()> {
        for (machine, reading) in self.machines.iter_mut().zip(&sample.machines) {
            if let Some(reading) = reading {
                machine.observe(*reading, sample.now, reporter);
            }
        }

        if let Some(sensor) = &sample.sensor {
            if let Err(e) = self
                .sensor
                .push(sensor.temperature, sensor.humidity, sensor.pressure)
            {
                tracing::warn!("{}", e);
            }
            self.advance_clock(sensor.local_time, reporter)?;
        }
        Ok(())
    }

    fn advance_clock(&mut self, local_time: NaiveDateTime, reporter: &dyn Reporter) -> Result<()> {
        match self.period_start {
            None => self.period_start = Some(local_time),
            Some(start) if local_time - start >= self.settings.short_period => {
                self.flush_short(start, local_time, reporter);
                self.period_start = Some(local_time);
            }
            Some(_) => {}
        }

        let hour = local_time.hour();
        let entered_hour = self.last_hour.replace(hour) != Some(hour);
        let Some(mut timestop) = self.timestop.take() else {
            self.timestop = Some(Timestop::start(self.settings.rotation.clone(), hour)?);
            return Ok(());
        };
        if entered_hour && timestop.is_due(hour) {
            self.flush_long(timestop.slot(), reporter);
            timestop.advance(hour)?;
        }
        self.timestop = Some(timestop);
        Ok(())
    }

    fn flush_short(&mut self, start: NaiveDateTime, end: NaiveDateTime, reporter: &dyn Reporter) {
        let exhausted = if self.sensor.is_exhausted() {
            Some(SensorSeries::OWNER)
        } else {
            self.machines
                .iter()
                .find(|m| m.accumulator.is_exhausted())
                .map(|m| m.id.as_str())
        };
        if let Some(owner) = exhausted {
            tracing::warn!(
                "Skipping short period flush ending {}: accumulator of '{}' exhausted",
                end,
                owner
            );
            for machine in &mut self.machines {
                machine.accumulator.compact();
            }
            self.sensor.compact();
            return;
        }

        let mut totals = PerType::filled(0.0);
        for machine in &mut self.machines {
            let avg = machine.accumulator.flush();
            totals[machine.machine_type] += avg;
            totals[MachineType::All] += avg;
        }
        let sizes = self.fleet_sizes;
        let avg_current = PerType::from_fn(|t| match sizes[t] {
            0 => 0.0,
            n => totals[t] / n as f64,
        });

        let means = self.sensor.flush();
        let rho = air_density(means.temperature, means.humidity, means.pressure);
        let record = PeriodRecord {
            start_time: start,
            end_time: end,
            avg_temperature: means.temperature,
            avg_humidity: means.humidity,
            avg_pressure: means.pressure,
            air_density: rho,
            density_ratio: density_ratios(rho, &avg_current),
            avg_current,
        };

        tracing::debug!("Short period {} - {} flushed", start, end);
        reporter.on_period_record(PeriodScope::Short, self.active_slot(), &record);
        self.short_history.push(record);
    }

    fn flush_long(&mut self, slot_index: usize, reporter: &dyn Reporter) {
        let record = reduce_records(self.short_history.since(self.short_mark));
        self.short_mark = self.short_history.mark();

        let Some(record) = record else {
            tracing::info!(
                "No short period records for slot {}, skipping long flush",
                slot_index
            );
            return;
        };
        let Some(slot) = self.slots.get_mut(slot_index) else {
            tracing::error!("Slot {} out of range", slot_index);
            return;
        };

        tracing::info!(
            "Long period for slot {} (timestop {:02}:00) flushed",
            slot_index,
            slot.hour
        );
        reporter.on_period_record(PeriodScope::Long, slot_index, &record);
        slot.history.push(record);
        slot.summary = summarize(&slot.history);
        reporter.on_summary_updated(slot_index, &slot.summary);
    }
}

/// Average a run of short records, oldest first, into one long record
///
/// `None` when there is nothing to reduce.
pub fn reduce_records<'a>(records: impl Iterator<Item = &'a PeriodRecord>) -> Option<PeriodRecord> {
    let mut count = 0usize;
    let mut first: Option<&PeriodRecord> = None;
    let mut last: Option<&PeriodRecord> = None;
    let (mut temperature, mut humidity, mut pressure, mut rho) = (0.0, 0.0, 0.0, 0.0);
    let mut current = PerType::filled(0.0);

    for record in records {
        first.get_or_insert(record);
        last = Some(record);
        count += 1;
        temperature += record.avg_temperature;
        humidity += record.avg_humidity;
        pressure += record.avg_pressure;
        rho += record.air_density;
        for (t, c) in record.avg_current.iter() {
            current[t] += c;
        }
    }

    let (first, last) = (first?, last?);
    let n = count as f64;
    let avg_current = PerType::from_fn(|t| current[t] / n);
    let air_density = rho / n;

    Some(PeriodRecord {
        start_time: first.start_time,
        end_time: last.end_time,
        avg_temperature: temperature / n,
        avg_humidity: humidity / n,
        avg_pressure: pressure / n,
        air_density,
        density_ratio: density_ratios(air_density, &avg_current),
        avg_current,
    })
}

/// Recompute a slot summary from its whole long history
pub fn summarize(history: &History<PeriodRecord>) -> OperationSummary {
    let densities: Vec<f64> = history.iter().map(|r| r.air_density).collect();
    let ratios = |t: MachineType| -> Vec<f64> { history.iter().map(|r| r.density_ratio[t]).collect() };

    OperationSummary {
        avg_temperature: mean(history.iter().map(|r| r.avg_temperature)),
        avg_humidity: mean(history.iter().map(|r| r.avg_humidity)),
        avg_pressure: mean(history.iter().map(|r| r.avg_pressure)),
        avg_air_density: mean(densities.iter().copied()),
        air_density_variance: population_variance(&densities),
        avg_current: PerType::from_fn(|t| mean(history.iter().map(|r| r.avg_current[t]))),
        avg_ratio: PerType::from_fn(|t| mean(ratios(t))),
        ratio_variance: PerType::from_fn(|t| population_variance(&ratios(t))),
    }
}
