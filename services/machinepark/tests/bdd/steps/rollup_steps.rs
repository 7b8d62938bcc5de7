//! BDD step definitions for alerting and period rollup features

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use cucumber::{given, then, when};

use machinepark::model::{MachineReading, MachineType, PeriodScope, RosterEntry, SensorReading};
use machinepark::rollup::{FleetRollup, RollupSettings, TickSample};

use crate::world::MachineparkWorld;

const SAMPLE_STEP_SECS: i64 = 300;

fn machine_type(label: &str) -> MachineType {
    if label.eq_ignore_ascii_case("all") {
        MachineType::All
    } else {
        MachineType::from_name(label).expect("known machine type")
    }
}

fn local_time(clock: &str) -> NaiveDateTime {
    let time = NaiveTime::parse_from_str(clock, "%H:%M").expect("HH:MM time");
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_time(time)
}

fn rollup(world: &mut MachineparkWorld) -> &mut FleetRollup {
    if world.rollup.is_none() {
        let settings = RollupSettings::from_config(&world.config).expect("valid settings");
        world.rollup = Some(FleetRollup::new(
            settings,
            &world.roster,
            &world.config.fleet_sizes,
        ));
    }
    world.rollup.as_mut().unwrap()
}

fn sample(world: &mut MachineparkWorld, sensor_time: Option<NaiveDateTime>) {
    let mut machines = std::mem::take(&mut world.pending_readings);
    machines.resize(world.roster.len(), None);
    let sample = TickSample {
        now: world.clock,
        sensor: sensor_time.map(|local_time| SensorReading {
            temperature: 20.0,
            humidity: 50.0,
            pressure: 1000.0,
            local_time,
        }),
        machines,
    };
    world.clock += SAMPLE_STEP_SECS;

    let reporter = Arc::clone(&world.reporter);
    rollup(world)
        .tick(&sample, reporter.as_ref())
        .expect("tick succeeds");
}

fn set_reading(world: &mut MachineparkWorld, index: usize, current: f64, threshold: f64) {
    if world.pending_readings.len() <= index {
        world.pending_readings.resize(index + 1, None);
    }
    world.pending_readings[index] = Some(MachineReading { current, threshold });
}

#[given(expr = "long periods of {int} hours")]
fn long_periods(world: &mut MachineparkWorld, hours: u32) {
    world.config.rollup.long_period_hours = hours;
}

#[given(expr = "a park of {int} {string} machines")]
fn park_of(world: &mut MachineparkWorld, count: usize, label: String) {
    let machine_type = machine_type(&label);
    for _ in 0..count {
        let id = format!("machine-{}", world.roster.len());
        world.roster.push(RosterEntry { id, machine_type });
    }
}

#[given(expr = "machine {int} draws {float}")]
#[when(expr = "machine {int} draws {float}")]
fn machine_draws(world: &mut MachineparkWorld, index: usize, current: f64) {
    set_reading(world, index, current, f64::MAX);
}

#[given(expr = "machine {int} draws {float} against a threshold of {float}")]
#[when(expr = "machine {int} draws {float} against a threshold of {float}")]
fn machine_draws_with_threshold(
    world: &mut MachineparkWorld,
    index: usize,
    current: f64,
    threshold: f64,
) {
    set_reading(world, index, current, threshold);
}

#[when(expr = "the park is sampled at {word}")]
fn sampled_at(world: &mut MachineparkWorld, clock: String) {
    sample(world, Some(local_time(&clock)));
}

#[when("the park is sampled without a sensor reading")]
fn sampled_without_sensor(world: &mut MachineparkWorld) {
    sample(world, None);
}

#[when(expr = "the park is sampled every 5 minutes from {word} to {word} with every machine drawing {float}")]
fn sampled_range(world: &mut MachineparkWorld, from: String, to: String, current: f64) {
    let end = local_time(&to);
    let mut time = local_time(&from);
    while time <= end {
        for index in 0..world.roster.len() {
            set_reading(world, index, current, f64::MAX);
        }
        sample(world, Some(time));
        time += chrono::Duration::minutes(5);
    }
}

#[then(expr = "{int} short period record(s) should have been reported")]
fn short_records_reported(world: &mut MachineparkWorld, expected: usize) {
    let records = world.reporter.records.lock().unwrap();
    let count = records
        .iter()
        .filter(|(scope, _, _)| *scope == PeriodScope::Short)
        .count();
    assert_eq!(count, expected);
}

#[then(expr = "the latest short record should average {float} for {string}")]
fn latest_short_average(world: &mut MachineparkWorld, expected: f64, label: String) {
    let rollup = world.rollup.as_ref().expect("park never sampled");
    let record = rollup.short_history().head().expect("no short record");
    assert_eq!(record.avg_current[machine_type(&label)], expected);
}

#[then(expr = "slot {int} should hold {int} long record(s)")]
fn slot_holds(world: &mut MachineparkWorld, slot: usize, expected: usize) {
    let rollup = world.rollup.as_ref().expect("park never sampled");
    assert_eq!(rollup.slots()[slot].history().len(), expected);
}

#[then(expr = "the summary of slot {int} should average {float} for {string}")]
fn summary_average(world: &mut MachineparkWorld, slot: usize, expected: f64, label: String) {
    let rollup = world.rollup.as_ref().expect("park never sampled");
    let summary = rollup.slots()[slot].summary();
    assert!((summary.avg_current[machine_type(&label)] - expected).abs() < 1e-9);
}

#[then(expr = "the next long flush should go to slot {int}")]
fn next_slot(world: &mut MachineparkWorld, expected: usize) {
    assert_eq!(world.rollup.as_ref().unwrap().active_slot(), expected);
}

#[then(expr = "an alert for machine {int} should report a trailing average of {float}")]
fn alert_reported(world: &mut MachineparkWorld, index: usize, expected: f64) {
    let alerts = world.reporter.alerts.lock().unwrap();
    let id = format!("machine-{}", index);
    let alert = alerts
        .iter()
        .find(|a| a.machine_id == id)
        .expect("alert raised");
    assert!((alert.trailing_average - expected).abs() < 1e-9);
}

#[then("no alert should have been raised")]
fn no_alert(world: &mut MachineparkWorld) {
    assert!(world.reporter.alerts.lock().unwrap().is_empty());
}

#[then("no short period record should exist")]
fn no_short_record(world: &mut MachineparkWorld) {
    let rollup = world.rollup.as_ref().expect("park never sampled");
    assert!(rollup.short_history().is_empty());
}
