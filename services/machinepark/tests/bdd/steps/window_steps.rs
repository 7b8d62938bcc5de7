//! BDD step definitions for trailing window feature

use std::time::Duration;

use cucumber::{given, then, when};

use machinepark::model::Reading;
use machinepark::window::TrailingWindow;

use crate::world::MachineparkWorld;

#[given(expr = "a trailing window of {int} readings with a horizon of {int} seconds")]
fn trailing_window(world: &mut MachineparkWorld, capacity: usize, horizon: u64) {
    world.window = Some(TrailingWindow::new(
        capacity,
        Duration::from_secs(horizon),
    ));
}

#[given(expr = "the window holds {float} at second {int}")]
fn window_holds(world: &mut MachineparkWorld, value: f64, timestamp: i64) {
    world
        .window
        .as_mut()
        .expect("window not created")
        .push(Reading::new(value, timestamp));
}

#[when(expr = "the trailing average is taken at second {int}")]
fn take_average(world: &mut MachineparkWorld, now: i64) {
    world.average = world
        .window
        .as_ref()
        .expect("window not created")
        .trailing_average(now);
}

#[then(expr = "the trailing average should be {float}")]
fn average_should_be(world: &mut MachineparkWorld, expected: f64) {
    let average = world.average.expect("no average taken");
    assert!(
        (average - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        average
    );
}

#[then("there should be no trailing average")]
fn no_average(world: &mut MachineparkWorld) {
    assert!(world.average.is_none());
}

#[then(expr = "the window should hold {int} readings")]
fn window_len(world: &mut MachineparkWorld, expected: usize) {
    assert_eq!(world.window.as_ref().unwrap().len(), expected);
}
