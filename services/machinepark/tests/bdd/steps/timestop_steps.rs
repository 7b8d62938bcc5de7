//! BDD step definitions for timestop scheduling feature

use cucumber::{given, then, when};

use machinepark::schedule::{rotation, Timestop};
use machinepark::MachineparkError;

use crate::world::MachineparkWorld;

fn parse_hours(list: &str) -> Vec<u32> {
    list.split(',')
        .map(|h| h.trim().parse().expect("hour list"))
        .collect()
}

#[given(expr = "a rotation seeded at hour {int} with {int} hour long periods")]
fn seeded_rotation(world: &mut MachineparkWorld, seed: u32, period: u32) {
    world.rotation = rotation(seed, period).expect("valid rotation");
}

#[given(expr = "the rotation {string}")]
fn explicit_rotation(world: &mut MachineparkWorld, hours: String) {
    world.rotation = parse_hours(&hours);
}

#[given("an empty rotation")]
fn empty_rotation(world: &mut MachineparkWorld) {
    world.rotation.clear();
}

#[when(expr = "the scheduler starts at hour {int}")]
fn start_scheduler(world: &mut MachineparkWorld, hour: u32) {
    match Timestop::start(world.rotation.clone(), hour) {
        Ok(timestop) => {
            world.timestop = Some(timestop);
            world.timestop_result = Some(Ok(()));
        }
        Err(e) => world.timestop_result = Some(Err(e)),
    }
}

#[when(expr = "the scheduler advances past hour {int}")]
fn advance_scheduler(world: &mut MachineparkWorld, hour: u32) {
    let timestop = world.timestop.as_mut().expect("scheduler not started");
    world.timestop_result = Some(timestop.advance(hour));
}

#[then(expr = "the previous timestop should be {int}")]
fn prev_should_be(world: &mut MachineparkWorld, expected: u32) {
    assert_eq!(world.timestop.as_ref().unwrap().prev(), expected);
}

#[then(expr = "the next timestop should be {int}")]
fn next_should_be(world: &mut MachineparkWorld, expected: u32) {
    assert_eq!(world.timestop.as_ref().unwrap().next(), expected);
}

#[then(expr = "the active slot should be {int}")]
fn slot_should_be(world: &mut MachineparkWorld, expected: usize) {
    assert_eq!(world.timestop.as_ref().unwrap().slot(), expected);
}

#[then(expr = "the rotation should be {string}")]
fn rotation_should_be(world: &mut MachineparkWorld, expected: String) {
    assert_eq!(world.rotation, parse_hours(&expected));
}

#[then("starting should fail because the rotation is empty")]
fn start_failed_empty(world: &mut MachineparkWorld) {
    assert!(matches!(
        world.timestop_result,
        Some(Err(MachineparkError::EmptyRotation))
    ));
}

#[then(expr = "advancing should fail because hour {int} is not a timestop")]
fn advance_failed_unknown(world: &mut MachineparkWorld, hour: u32) {
    match &world.timestop_result {
        Some(Err(MachineparkError::UnknownTimestop(h))) => assert_eq!(*h, hour),
        other => panic!("expected unknown timestop error, got {:?}", other),
    }
}
