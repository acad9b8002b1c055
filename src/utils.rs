use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Number of decimal places kept in reported metric values.
pub const REPORT_PRECISION: i32 = 4;

pub fn parse_number<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid value for {}: '{}'", name, value))
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Ratio with the zero-denominator guard used by every metric.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0. {
        numerator / denominator
    } else {
        0.
    }
}
