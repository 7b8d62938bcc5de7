//! Raw-sample accumulation between short-period flushes
//!
//! A flush reduces the accumulated samples to their mean and then compacts
//! the buffer down to its last sample, which seeds the next period.

use crate::model::Reading;
use crate::stats::mean;
use crate::{MachineparkError, Result};

/// Unflushed readings of one machine
#[derive(Debug, Clone)]
pub struct PeriodAccumulator {
    samples: Vec<Reading>,
    capacity: usize,
    exhausted: bool,
}

impl PeriodAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::new(),
            capacity,
            exhausted: false,
        }
    }

    /// Append a reading; fails once `capacity` unflushed samples are held
    ///
    /// A rejected reading marks the accumulator exhausted until the next
    /// [`compact`](Self::compact).
    pub fn push(&mut self, machine: &str, reading: Reading) -> Result<()> {
        if self.samples.len() >= self.capacity {
            self.exhausted = true;
            return Err(MachineparkError::BufferExhausted {
                owner: machine.to_string(),
                capacity: self.capacity,
            });
        }
        self.samples.push(reading);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Mean of the accumulated values, `0.0` when nothing was accumulated
    pub fn mean(&self) -> f64 {
        mean(self.samples.iter().map(|r| r.value))
    }

    /// Drop everything but the newest sample and clear the exhausted flag
    pub fn compact(&mut self) {
        if let Some(last) = self.samples.last().copied() {
            self.samples.clear();
            self.samples.push(last);
        }
        self.exhausted = false;
    }

    /// Mean of the period, then compact
    pub fn flush(&mut self) -> f64 {
        let m = self.mean();
        self.compact();
        m
    }
}

/// Means produced by a sensor series flush
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorMeans {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Environmental readings accumulated since the last short flush
///
/// Bounded like [`PeriodAccumulator`]: once `capacity` unflushed readings are
/// held further readings are rejected until the next compaction.
#[derive(Debug, Clone)]
pub struct SensorSeries {
    temperature: Vec<f64>,
    humidity: Vec<f64>,
    pressure: Vec<f64>,
    capacity: usize,
    exhausted: bool,
}

impl SensorSeries {
    /// Name used for the series in exhaustion errors
    pub const OWNER: &'static str = "env-sensor";

    pub fn new(capacity: usize) -> Self {
        Self {
            temperature: Vec::new(),
            humidity: Vec::new(),
            pressure: Vec::new(),
            capacity,
            exhausted: false,
        }
    }

    pub fn push(&mut self, temperature: f64, humidity: f64, pressure: f64) -> Result<()> {
        if self.temperature.len() >= self.capacity {
            self.exhausted = true;
            return Err(MachineparkError::BufferExhausted {
                owner: Self::OWNER.to_string(),
                capacity: self.capacity,
            });
        }
        self.temperature.push(temperature);
        self.humidity.push(humidity);
        self.pressure.push(pressure);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Keep only each series' newest value and clear the exhausted flag
    pub fn compact(&mut self) {
        for series in [&mut self.temperature, &mut self.humidity, &mut self.pressure] {
            if let Some(last) = series.last().copied() {
                series.clear();
                series.push(last);
            }
        }
        self.exhausted = false;
    }

    /// Means of the three series, then compact
    pub fn flush(&mut self) -> SensorMeans {
        let means = SensorMeans {
            temperature: mean(self.temperature.iter().copied()),
            humidity: mean(self.humidity.iter().copied()),
            pressure: mean(self.pressure.iter().copied()),
        };
        self.compact();
        means
    }
}
