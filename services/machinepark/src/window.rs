//! Fixed-capacity trailing window used for alert-time averaging
//!
//! Each machine keeps the most recent `capacity` readings in a ring. When a
//! machine crosses its threshold, the average of the readings that are still
//! inside the alert horizon is reported alongside the alert.

use std::time::Duration;

use crate::model::Reading;

/// Largest ring a machine may be configured with
pub const MAX_WINDOW_CAPACITY: usize = 100_000;

/// Ring buffer of timestamped readings
#[derive(Debug, Clone)]
pub struct TrailingWindow {
    slots: Vec<Option<Reading>>,
    /// Next slot to be written
    head: usize,
    horizon_secs: i64,
}

impl TrailingWindow {
    /// Create a window holding `capacity` readings (at least one)
    pub fn new(capacity: usize, horizon: Duration) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
            horizon_secs: i64::try_from(horizon.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Capacity needed to cover `horizon` when polling every `poll_interval`
    pub fn capacity_for(poll_interval: Duration, horizon: Duration) -> usize {
        let interval = poll_interval.as_secs_f64();
        if interval <= 0.0 {
            return 1;
        }
        // saturating cast; Config::validate caps the result at MAX_WINDOW_CAPACITY
        ((1.0 / interval) * horizon.as_secs_f64()).ceil().max(1.0) as usize
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.latest().is_none()
    }

    /// Append a reading, overwriting the oldest one once the ring is full
    pub fn push(&mut self, reading: Reading) {
        self.slots[self.head] = Some(reading);
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Most recently appended reading
    pub fn latest(&self) -> Option<Reading> {
        self.slots[self.before(self.head)]
    }

    /// Readings from newest to oldest
    pub fn iter_newest_first(&self) -> impl Iterator<Item = Reading> + '_ {
        let cap = self.slots.len();
        (1..=cap)
            .map(move |back| self.slots[(self.head + cap - back) % cap])
            .map_while(|slot| slot)
    }

    /// Average of the consecutive readings, walking back from the newest, that
    /// lie within the horizon of `now`
    ///
    /// The walk stops at the first reading that is too old or at an unwritten
    /// slot. When no reading qualifies the newest stored value is returned
    /// instead. `None` means the window has never been written.
    pub fn trailing_average(&self, now: i64) -> Option<f64> {
        let latest = self.latest()?;

        let (sum, count) = self
            .iter_newest_first()
            .take_while(|r| now - r.timestamp <= self.horizon_secs)
            .fold((0.0, 0usize), |(sum, count), r| (sum + r.value, count + 1));

        if count == 0 {
            Some(latest.value)
        } else {
            Some(sum / count as f64)
        }
    }

    fn before(&self, index: usize) -> usize {
        (index + self.slots.len() - 1) % self.slots.len()
    }
}
