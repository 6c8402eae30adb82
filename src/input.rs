//! Raw prediction requests and their validation.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDateTime;

use crate::categories::{CategoryKind, CategoryTables};
use crate::error::ValidationError;

/// The only accepted timestamp layout.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Ambient temperature bounds (°C).
pub const AMBIENT_TEMPERATURE_RANGE: RangeInclusive<f64> = -50.0..=60.0;
/// Module temperature bounds (°C).
pub const MODULE_TEMPERATURE_RANGE: RangeInclusive<f64> = -50.0..=100.0;
/// Irradiation bounds (kW/m²).
pub const IRRADIATION_RANGE: RangeInclusive<f64> = 0.0..=1.5;

/// Names the six request fields in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    AmbientTemperature,
    ModuleTemperature,
    Irradiation,
    Plant,
    Inverter,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Timestamp => "timestamp",
            Field::AmbientTemperature => "ambient temperature",
            Field::ModuleTemperature => "module temperature",
            Field::Irradiation => "irradiation",
            Field::Plant => "plant",
            Field::Inverter => "inverter",
        };
        f.write_str(name)
    }
}

/// Six user-supplied fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInput {
    pub timestamp: Option<String>,
    pub ambient_temperature: Option<String>,
    pub module_temperature: Option<String>,
    pub irradiation: Option<String>,
    pub plant: Option<String>,
    pub inverter: Option<String>,
}

impl RawInput {
    /// Convenience constructor with every field present.
    pub fn new(
        timestamp: &str,
        ambient_temperature: &str,
        module_temperature: &str,
        irradiation: &str,
        plant: &str,
        inverter: &str,
    ) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            ambient_temperature: Some(ambient_temperature.to_string()),
            module_temperature: Some(module_temperature.to_string()),
            irradiation: Some(irradiation.to_string()),
            plant: Some(plant.to_string()),
            inverter: Some(inverter.to_string()),
        }
    }

    /// Validates this request against the given category tables.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, in order: missing fields, numeric
    /// parsing, numeric ranges, timestamp format, category lookup.
    pub fn validate(&self, tables: &CategoryTables) -> Result<ValidatedInput, ValidationError> {
        let timestamp = required(&self.timestamp, Field::Timestamp)?;
        let ambient = required(&self.ambient_temperature, Field::AmbientTemperature)?;
        let module = required(&self.module_temperature, Field::ModuleTemperature)?;
        let irradiation = required(&self.irradiation, Field::Irradiation)?;
        let plant = required(&self.plant, Field::Plant)?;
        let inverter = required(&self.inverter, Field::Inverter)?;

        let ambient = parse_number(ambient, Field::AmbientTemperature)?;
        let module = parse_number(module, Field::ModuleTemperature)?;
        let irradiation = parse_number(irradiation, Field::Irradiation)?;

        check_range(ambient, Field::AmbientTemperature, AMBIENT_TEMPERATURE_RANGE, "°C")?;
        check_range(module, Field::ModuleTemperature, MODULE_TEMPERATURE_RANGE, "°C")?;
        check_range(irradiation, Field::Irradiation, IRRADIATION_RANGE, "kW/m²")?;

        let timestamp = parse_timestamp(timestamp)?;

        let plant = tables.plants.resolve(plant).ok_or_else(|| {
            ValidationError::UnknownCategory {
                kind: CategoryKind::Plant,
                value: plant.to_string(),
            }
        })?;
        let inverter = tables.inverters.resolve(inverter).ok_or_else(|| {
            ValidationError::UnknownCategory {
                kind: CategoryKind::Inverter,
                value: inverter.to_string(),
            }
        })?;

        Ok(ValidatedInput {
            timestamp,
            ambient_temperature_c: ambient,
            module_temperature_c: module,
            irradiation_kw_m2: irradiation,
            plant_code: plant.code,
            inverter_code: inverter.code,
            plant_label: plant.label.clone(),
            inverter_key: inverter.key.clone(),
        })
    }
}

/// A request that passed every check.
///
/// Numeric fields are inside their closed intervals and the codes come from
/// the table the request was validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    pub timestamp: NaiveDateTime,
    pub ambient_temperature_c: f64,
    pub module_temperature_c: f64,
    pub irradiation_kw_m2: f64,
    pub plant_code: u32,
    pub inverter_code: u32,
    /// Label of the resolved plant, for display.
    pub plant_label: String,
    /// Source key of the resolved inverter, for display.
    pub inverter_key: String,
}

impl fmt::Display for ValidatedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date/Time:           {}", self.timestamp.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "Plant:               {}", self.plant_label)?;
        writeln!(f, "Inverter:            {}", self.inverter_key)?;
        writeln!(f, "Ambient temperature: {:.1} °C", self.ambient_temperature_c)?;
        writeln!(f, "Module temperature:  {:.1} °C", self.module_temperature_c)?;
        write!(f, "Irradiation:         {:.2} kW/m²", self.irradiation_kw_m2)
    }
}

fn required(value: &Option<String>, field: Field) -> Result<&str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField { field }),
    }
}

fn parse_number(value: &str, field: Field) -> Result<f64, ValidationError> {
    value
        .parse::<f64>()
        .map_err(|_| ValidationError::NotNumeric {
            field,
            value: value.to_string(),
        })
}

fn check_range(
    value: f64,
    field: Field,
    range: RangeInclusive<f64>,
    unit: &'static str,
) -> Result<(), ValidationError> {
    // NaN fails `contains`, so non-finite input is rejected here too.
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
            unit,
        })
    }
}

/// Parses `YYYY-MM-DD HH:MM` strictly.
///
/// chrono accepts unpadded fields, so the layout is checked byte by byte
/// before the calendar check.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let bad = || ValidationError::BadTimestampFormat {
        value: value.to_string(),
    };
    let bytes = value.as_bytes();
    if bytes.len() != 16 {
        return Err(bad());
    }
    let layout_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b' ',
        13 => *b == b':',
        _ => b.is_ascii_digit(),
    });
    if !layout_ok {
        return Err(bad());
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| bad())
}
