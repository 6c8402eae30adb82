//! Feature construction shared by training and inference.
//!
//! Every row the forest sees, at fit time or at predict time, is built by
//! [`FeatureVector::new`], so the column order is defined in one place.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::input::ValidatedInput;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 8;

/// Column names in model order. Stored in the artifact and checked on load.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ambient_temperature",
    "module_temperature",
    "irradiation",
    "hour",
    "day_of_year",
    "day_of_week",
    "plant_code",
    "inverter_code",
];

/// Calendar features derived from a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFeatures {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Day of year (1-366).
    pub day_of_year: u32,
    /// Day of week (0=Monday, 6=Sunday).
    pub day_of_week: u32,
}

impl TimeFeatures {
    pub fn from_datetime(timestamp: &NaiveDateTime) -> Self {
        Self {
            hour: timestamp.hour(),
            day_of_year: timestamp.ordinal(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
        }
    }
}

/// Fixed-order model input.
///
/// # Examples
///
/// ```
/// use solar_predict::features::{FeatureVector, TimeFeatures};
/// use solar_predict::input::parse_timestamp;
///
/// let ts = parse_timestamp("2020-06-16 12:00").unwrap();
/// let v = FeatureVector::new(30.0, 45.0, 0.85, TimeFeatures::from_datetime(&ts), 0, 5);
/// assert_eq!(v.as_slice(), &[30.0, 45.0, 0.85, 12.0, 168.0, 1.0, 0.0, 5.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assembles the vector in model order.
    pub fn new(
        ambient_temperature_c: f64,
        module_temperature_c: f64,
        irradiation_kw_m2: f64,
        time: TimeFeatures,
        plant_code: u32,
        inverter_code: u32,
    ) -> Self {
        Self([
            ambient_temperature_c,
            module_temperature_c,
            irradiation_kw_m2,
            f64::from(time.hour),
            f64::from(time.day_of_year),
            f64::from(time.day_of_week),
            f64::from(plant_code),
            f64::from(inverter_code),
        ])
    }

    /// Builds the vector for a validated request.
    pub fn from_input(input: &ValidatedInput) -> Self {
        Self::new(
            input.ambient_temperature_c,
            input.module_temperature_c,
            input.irradiation_kw_m2,
            TimeFeatures::from_datetime(&input.timestamp),
            input.plant_code,
            input.inverter_code,
        )
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of the named column, if the name is a known feature.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Flattens rows into a row-major buffer for the matrix backend.
pub fn to_row_major(rows: &[FeatureVector]) -> Vec<f64> {
    rows.iter().flat_map(|r| r.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_timestamp;

    fn input_at(ts: &str) -> ValidatedInput {
        ValidatedInput {
            timestamp: parse_timestamp(ts).expect("timestamp should parse"),
            ambient_temperature_c: 30.0,
            module_temperature_c: 45.0,
            irradiation_kw_m2: 0.85,
            plant_code: 0,
            inverter_code: 5,
            plant_label: "Plant 1 (ID: 4135001)".to_string(),
            inverter_key: "VHMLBKoKgIrUVDU".to_string(),
        }
    }

    #[test]
    fn reference_request_builds_expected_vector() {
        let v = FeatureVector::from_input(&input_at("2020-06-16 12:00"));
        assert_eq!(v.as_slice().len(), FEATURE_COUNT);
        assert_eq!(
            v.as_slice(),
            &[30.0, 45.0, 0.85, 12.0, 168.0, 1.0, 0.0, 5.0]
        );
    }

    #[test]
    fn names_line_up_with_values() {
        let v = FeatureVector::from_input(&input_at("2020-06-16 12:00"));
        assert_eq!(v.get("ambient_temperature"), Some(30.0));
        assert_eq!(v.get("day_of_year"), Some(168.0));
        assert_eq!(v.get("day_of_week"), Some(1.0));
        assert_eq!(v.get("inverter_code"), Some(5.0));
        assert_eq!(v.get("AC_POWER"), None);
    }

    #[test]
    fn time_features_cover_calendar_edges() {
        let t = TimeFeatures::from_datetime(&parse_timestamp("2020-12-31 23:45").unwrap());
        assert_eq!(t.hour, 23);
        assert_eq!(t.day_of_year, 366);
        assert_eq!(t.day_of_week, 3); // Thursday

        let t = TimeFeatures::from_datetime(&parse_timestamp("2021-01-03 00:00").unwrap());
        assert_eq!(t.hour, 0);
        assert_eq!(t.day_of_year, 3);
        assert_eq!(t.day_of_week, 6); // Sunday
    }

    #[test]
    fn row_major_flattening_keeps_order() {
        let a = FeatureVector::from_input(&input_at("2020-06-16 12:00"));
        let b = FeatureVector::from_input(&input_at("2020-06-17 13:00"));
        let flat = to_row_major(&[a, b]);
        assert_eq!(flat.len(), 2 * FEATURE_COUNT);
        assert_eq!(&flat[..FEATURE_COUNT], a.as_slice());
        assert_eq!(flat[FEATURE_COUNT + 3], 13.0);
    }
}
