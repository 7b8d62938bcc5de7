//! Timestop scheduler
//!
//! The day is divided into `24 / long_period_hours` slots. Each slot ends at
//! a timestop hour; the timestops form a rotation that starts at a seed hour
//! and steps forward modulo 24, so the rotation is not necessarily sorted.

use crate::{MachineparkError, Result};

const HOURS_PER_DAY: u32 = 24;

/// Build the timestop rotation for a seed hour and long-period length
pub fn rotation(seed_hour: u32, long_period_hours: u32) -> Result<Vec<u32>> {
    if long_period_hours == 0
        || long_period_hours > HOURS_PER_DAY
        || HOURS_PER_DAY % long_period_hours != 0
    {
        return Err(MachineparkError::Config(format!(
            "long_period_hours must divide 24, got {}",
            long_period_hours
        )));
    }
    if seed_hour >= HOURS_PER_DAY {
        return Err(MachineparkError::Config(format!(
            "rotation_seed_hour must be below 24, got {}",
            seed_hour
        )));
    }

    let size = HOURS_PER_DAY / long_period_hours;
    Ok((0..size)
        .map(|i| (seed_hour + i * long_period_hours) % HOURS_PER_DAY)
        .collect())
}

/// Tracks the previous and next timestop relative to the current hour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestop {
    rotation: Vec<u32>,
    prev: u32,
    next: u32,
    slot: usize,
}

impl Timestop {
    /// Locate `hour` among the timestops when starting up
    ///
    /// The hour is placed into a sorted copy of the rotation; its sorted
    /// neighbours (wrapping around) become the previous and next timestop and
    /// its position becomes the slot index, reduced modulo the slot count.
    /// An hour that already is a timestop sits right after that timestop, so
    /// the period ending at `next` lands in `next`'s slot.
    pub fn start(rotation: Vec<u32>, hour: u32) -> Result<Self> {
        if rotation.is_empty() {
            return Err(MachineparkError::EmptyRotation);
        }

        let mut sorted = rotation.clone();
        sorted.sort_unstable();
        sorted.dedup();

        let (pos, prev, next) = match sorted.binary_search(&hour) {
            // already a timestop: the inserted copy follows the existing entry
            Ok(at) => (
                at + 1,
                sorted[(at + sorted.len() - 1) % sorted.len()],
                sorted[(at + 1) % sorted.len()],
            ),
            Err(at) => (
                at,
                sorted[(at + sorted.len() - 1) % sorted.len()],
                sorted[at % sorted.len()],
            ),
        };
        let slot = pos % rotation.len();

        tracing::debug!(
            "Timestop start at hour {}: prev={}, next={}, slot={}",
            hour,
            prev,
            next,
            slot
        );

        Ok(Self {
            rotation,
            prev,
            next,
            slot,
        })
    }

    /// Whether the long period ends at `hour`
    pub fn is_due(&self, hour: u32) -> bool {
        hour == self.next
    }

    /// Step past the timestop at `hour`, following rotation order
    pub fn advance(&mut self, hour: u32) -> Result<()> {
        let pos = self
            .rotation
            .iter()
            .position(|h| *h == hour)
            .ok_or(MachineparkError::UnknownTimestop(hour))?;
        let following = (pos + 1) % self.rotation.len();

        self.prev = hour;
        self.next = self.rotation[following];
        self.slot = following;

        tracing::debug!(
            "Timestop advanced past {}: next={}, slot={}",
            hour,
            self.next,
            self.slot
        );
        Ok(())
    }

    pub fn prev(&self) -> u32 {
        self.prev
    }

    pub fn next(&self) -> u32 {
        self.next
    }

    /// Index of the active slot
    pub fn slot(&self) -> usize {
        self.slot
    }
}
