//! Generation and weather-sensor CSV readers and the per-plant join.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::PlantDataset;
use crate::error::TrainError;

/// Timestamp layouts seen in the plant datasets, tried in order.
pub const DATASET_TIMESTAMP_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%d-%m-%Y %H:%M", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct GenerationRow {
    #[serde(rename = "DATE_TIME")]
    date_time: String,
    #[serde(rename = "PLANT_ID")]
    plant_id: u64,
    #[serde(rename = "SOURCE_KEY")]
    source_key: String,
    #[serde(rename = "AC_POWER")]
    ac_power: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    #[serde(rename = "DATE_TIME")]
    date_time: String,
    #[serde(rename = "PLANT_ID")]
    plant_id: u64,
    #[serde(rename = "AMBIENT_TEMPERATURE")]
    ambient_temperature: Option<f64>,
    #[serde(rename = "MODULE_TEMPERATURE")]
    module_temperature: Option<f64>,
    #[serde(rename = "IRRADIATION")]
    irradiation: Option<f64>,
}

/// One inverter reading from a generation file.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub timestamp: NaiveDateTime,
    pub plant_id: u64,
    pub source_key: String,
    pub ac_power_kw: f64,
}

/// One plant-level reading from a weather-sensor file. Blank values read as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub timestamp: NaiveDateTime,
    pub plant_id: u64,
    pub ambient_temperature_c: f64,
    pub module_temperature_c: f64,
    pub irradiation_kw_m2: f64,
}

/// A generation reading joined with the plant's weather at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub plant_id: u64,
    pub source_key: String,
    pub ambient_temperature_c: f64,
    pub module_temperature_c: f64,
    pub irradiation_kw_m2: f64,
    pub ac_power_kw: f64,
}

/// Parses a dataset timestamp in any of [`DATASET_TIMESTAMP_FORMATS`].
pub fn parse_dataset_timestamp(value: &str) -> Option<NaiveDateTime> {
    DATASET_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}

/// Reads a generation CSV.
///
/// # Errors
///
/// Returns [`TrainError::Dataset`] naming `source` and the line for malformed
/// CSV, missing columns, bad numbers or unparseable timestamps.
pub fn read_generation(reader: impl Read, source: &Path) -> Result<Vec<GenerationRecord>, TrainError> {
    read_rows::<GenerationRow>(reader, source)?
        .into_iter()
        .map(|(line, row)| {
            Ok(GenerationRecord {
                timestamp: timestamp(&row.date_time, source, line)?,
                plant_id: row.plant_id,
                source_key: row.source_key,
                ac_power_kw: row.ac_power,
            })
        })
        .collect()
}

/// Reads a weather-sensor CSV.
///
/// # Errors
///
/// See [`read_generation`].
pub fn read_weather(reader: impl Read, source: &Path) -> Result<Vec<WeatherRecord>, TrainError> {
    read_rows::<WeatherRow>(reader, source)?
        .into_iter()
        .map(|(line, row)| {
            Ok(WeatherRecord {
                timestamp: timestamp(&row.date_time, source, line)?,
                plant_id: row.plant_id,
                ambient_temperature_c: row.ambient_temperature.unwrap_or(0.0),
                module_temperature_c: row.module_temperature.unwrap_or(0.0),
                irradiation_kw_m2: row.irradiation.unwrap_or(0.0),
            })
        })
        .collect()
}

/// Left-joins generation readings with weather on `(timestamp, plant_id)`.
///
/// Readings without a weather match get zeros for the weather values. If the
/// weather data repeats a key, the first row wins.
pub fn merge(generation: Vec<GenerationRecord>, weather: &[WeatherRecord]) -> Vec<Observation> {
    let mut by_key: HashMap<(NaiveDateTime, u64), &WeatherRecord> =
        HashMap::with_capacity(weather.len());
    for w in weather {
        by_key.entry((w.timestamp, w.plant_id)).or_insert(w);
    }

    let mut unmatched = 0_usize;
    let observations: Vec<Observation> = generation
        .into_iter()
        .map(|g| {
            let w = by_key.get(&(g.timestamp, g.plant_id));
            if w.is_none() {
                unmatched += 1;
            }
            Observation {
                timestamp: g.timestamp,
                plant_id: g.plant_id,
                source_key: g.source_key,
                ambient_temperature_c: w.map_or(0.0, |w| w.ambient_temperature_c),
                module_temperature_c: w.map_or(0.0, |w| w.module_temperature_c),
                irradiation_kw_m2: w.map_or(0.0, |w| w.irradiation_kw_m2),
                ac_power_kw: g.ac_power_kw,
            }
        })
        .collect();

    if unmatched > 0 {
        warn!(
            unmatched,
            total = observations.len(),
            "generation rows without weather data, filled with zeros"
        );
    }
    observations
}

/// Reads and joins both files of one plant.
///
/// # Errors
///
/// Returns [`TrainError::Dataset`] if either file cannot be opened or parsed.
pub fn load_plant(dataset: &PlantDataset) -> Result<Vec<Observation>, TrainError> {
    let generation = read_generation(open(&dataset.generation)?, &dataset.generation)?;
    let weather = read_weather(open(&dataset.weather)?, &dataset.weather)?;
    debug!(
        generation = %dataset.generation.display(),
        generation_rows = generation.len(),
        weather_rows = weather.len(),
        "plant dataset read"
    );
    Ok(merge(generation, &weather))
}

fn open(path: &Path) -> Result<File, TrainError> {
    File::open(path).map_err(|e| TrainError::Dataset {
        path: path.to_path_buf(),
        message: format!("cannot open: {e}"),
    })
}

fn read_rows<T: DeserializeOwned>(
    reader: impl Read,
    source: &Path,
) -> Result<Vec<(u64, T)>, TrainError> {
    let dataset_err = |message: String| TrainError::Dataset {
        path: source.to_path_buf(),
        message,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(|e| dataset_err(e.to_string()))?.clone();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| dataset_err(e.to_string()))?;
        let line = record.position().map_or(0, csv::Position::line);
        let row = record
            .deserialize(Some(&headers))
            .map_err(|e| dataset_err(format!("line {line}: {e}")))?;
        rows.push((line, row));
    }
    Ok(rows)
}

fn timestamp(value: &str, source: &Path, line: u64) -> Result<NaiveDateTime, TrainError> {
    parse_dataset_timestamp(value).ok_or_else(|| TrainError::Dataset {
        path: source.to_path_buf(),
        message: format!("line {line}: unrecognized DATE_TIME \"{value}\""),
    })
}
