//! Domain types shared by the rollup pipeline

use std::fmt;
use std::ops::{Index, IndexMut};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Machine classes of the park, plus the fleet-wide `All` aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    All,
    DmgDmc,
    DmgDmu,
    DmgNtx,
    DmgNzx,
    KasotecA7,
    KasotecA13,
    PerndorferWss,
    #[serde(rename = "trumpf_3000")]
    Trumpf3000,
    #[serde(rename = "trumpf_7000")]
    Trumpf7000,
    DmgLasertec,
}

impl MachineType {
    /// Number of entries in every per-type array, `All` included
    pub const COUNT: usize = 11;

    /// Every type in index order
    pub const ALL_TYPES: [MachineType; Self::COUNT] = [
        MachineType::All,
        MachineType::DmgDmc,
        MachineType::DmgDmu,
        MachineType::DmgNtx,
        MachineType::DmgNzx,
        MachineType::KasotecA7,
        MachineType::KasotecA13,
        MachineType::PerndorferWss,
        MachineType::Trumpf3000,
        MachineType::Trumpf7000,
        MachineType::DmgLasertec,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Infer the machine class from the display name reported by the park API
    ///
    /// Matching is case-insensitive and ignores whitespace, so
    /// `"DMG DMU 40eVo [#50]"` and `"dmg-dmu 65"` both map to [`MachineType::DmgDmu`].
    /// Never returns `All`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        let has = |needle: &str| normalized.contains(needle);

        if has("lasertec") {
            Some(MachineType::DmgLasertec)
        } else if has("dmc") {
            Some(MachineType::DmgDmc)
        } else if has("dmu") {
            Some(MachineType::DmgDmu)
        } else if has("ntx") {
            Some(MachineType::DmgNtx)
        } else if has("nzx") {
            Some(MachineType::DmgNzx)
        } else if has("kasotec") && has("a13") {
            Some(MachineType::KasotecA13)
        } else if has("kasotec") && has("a7") {
            Some(MachineType::KasotecA7)
        } else if has("perndorfer") || has("wss") {
            Some(MachineType::PerndorferWss)
        } else if has("trumpf") && has("7000") {
            Some(MachineType::Trumpf7000)
        } else if has("trumpf") && has("3000") {
            Some(MachineType::Trumpf3000)
        } else {
            None
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MachineType::All => "ALL",
            MachineType::DmgDmc => "DMG DMC",
            MachineType::DmgDmu => "DMG DMU",
            MachineType::DmgNtx => "DMG NTX",
            MachineType::DmgNzx => "DMG NZX",
            MachineType::KasotecA7 => "Kasotec A7",
            MachineType::KasotecA13 => "Kasotec A13",
            MachineType::PerndorferWss => "Perndorfer WSS",
            MachineType::Trumpf3000 => "Trumpf 3000",
            MachineType::Trumpf7000 => "Trumpf 7000",
            MachineType::DmgLasertec => "DMG Lasertec",
        };
        f.write_str(label)
    }
}

/// One value per [`MachineType`], indexed consistently everywhere
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerType<T>([T; MachineType::COUNT]);

impl<T: Copy> PerType<T> {
    pub fn filled(value: T) -> Self {
        Self([value; MachineType::COUNT])
    }

    /// Build an array by evaluating `f` for every type
    pub fn from_fn(mut f: impl FnMut(MachineType) -> T) -> Self {
        Self(MachineType::ALL_TYPES.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (MachineType, T)> + '_ {
        MachineType::ALL_TYPES.iter().map(|t| (*t, self.0[t.index()]))
    }
}

impl<T: Copy + Default> Default for PerType<T> {
    fn default() -> Self {
        Self::filled(T::default())
    }
}

impl<T> Index<MachineType> for PerType<T> {
    type Output = T;

    fn index(&self, machine_type: MachineType) -> &T {
        &self.0[machine_type.index()]
    }
}

impl<T> IndexMut<MachineType> for PerType<T> {
    fn index_mut(&mut self, machine_type: MachineType) -> &mut T {
        &mut self.0[machine_type.index()]
    }
}

/// Fleet size per machine type, `All` holding the size of the whole roster
pub type FleetSizes = PerType<usize>;

/// One instantaneous measurement, timestamped in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub timestamp: i64,
}

impl Reading {
    pub fn new(value: f64, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

/// Roster entry returned once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub machine_type: MachineType,
}

/// A single machine poll result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineReading {
    pub current: f64,
    pub threshold: f64,
}

/// A single environmental sensor poll result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    /// Local wall-clock time reported by the sensor
    pub local_time: NaiveDateTime,
}

/// Which history a period record was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodScope {
    Short,
    Long,
}

impl fmt::Display for PeriodScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodScope::Short => write!(f, "short"),
            PeriodScope::Long => write!(f, "long"),
        }
    }
}

/// One completed short or long period window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_pressure: f64,
    pub air_density: f64,
    pub avg_current: PerType<f64>,
    /// Air density divided by the type's average current. Larger is better.
    pub density_ratio: PerType<f64>,
}

/// Statistics over one slot's long-period history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSummary {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_pressure: f64,
    pub avg_air_density: f64,
    pub air_density_variance: f64,
    pub avg_current: PerType<f64>,
    pub avg_ratio: PerType<f64>,
    pub ratio_variance: PerType<f64>,
}

/// Alert raised when a machine's current exceeds its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub machine_id: String,
    pub current: f64,
    pub threshold: f64,
    /// Trailing average over the alert horizon, excluding the triggering sample
    pub trailing_average: f64,
}
