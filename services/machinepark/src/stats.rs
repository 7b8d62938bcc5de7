//! Statistics helpers: air density, mean, population variance, efficiency ratios

use crate::model::{MachineType, PerType};

/// Specific gas constant of dry air, J/(kg·K)
const R_DRY_AIR: f64 = 287.058;
/// Specific gas constant of water vapour, J/(kg·K)
const R_WATER_VAPOR: f64 = 461.495;
const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Air density in kg/m³ for a temperature (°C), relative humidity (%) and
/// barometric pressure (hPa)
///
/// Saturation vapour pressure uses the Tetens approximation; dry-air and
/// vapour partial pressures are combined through the ideal gas law.
pub fn air_density(temperature: f64, humidity: f64, pressure: f64) -> f64 {
    let saturation = 6.1078 * 10f64.powf(7.5 * temperature / (temperature + 237.3));
    let vapor_pressure = humidity / 100.0 * saturation;
    let dry_pressure = pressure - vapor_pressure;
    let kelvin = temperature + CELSIUS_TO_KELVIN;

    // hPa -> Pa
    (dry_pressure * 100.0) / (R_DRY_AIR * kelvin)
        + (vapor_pressure * 100.0) / (R_WATER_VAPOR * kelvin)
}

/// Arithmetic mean, `0.0` for an empty input
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Population variance `Σ(x - mean)² / n`, `0.0` for an empty input
///
/// Non-finite inputs propagate into the result instead of panicking.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// `density / current` for every machine type
///
/// A zero current yields an infinite or NaN ratio, which is passed through.
pub fn density_ratios(density: f64, current: &PerType<f64>) -> PerType<f64> {
    PerType::from_fn(|t: MachineType| density / current[t])
}
