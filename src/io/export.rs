//! CSV export for held-out predictions.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::training::HoldoutPrediction;

/// Column header for the held-out prediction export.
const HEADER: &str = "date_time,plant_id,source_key,actual_ac_power_kw,\
                       predicted_ac_power_kw,abs_error_kw";

/// Timestamp layout used in the export.
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports held-out predictions to a CSV file at the given path.
///
/// Writes a header row followed by one data row per prediction, in the order
/// given. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `predictions` - Held-out rows from a training run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(predictions: &[HoldoutPrediction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(predictions, buf)
}

/// Writes held-out predictions as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(predictions: &[HoldoutPrediction], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for p in predictions {
        wtr.write_record(&[
            p.timestamp.format(DATE_TIME_FORMAT).to_string(),
            p.plant_id.to_string(),
            p.source_key.clone(),
            format!("{:.4}", p.actual_kw),
            format!("{:.4}", p.predicted_kw),
            format!("{:.4}", p.abs_error_kw()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_timestamp;

    fn make_row(i: usize) -> HoldoutPrediction {
        HoldoutPrediction {
            timestamp: parse_timestamp(&format!("2020-05-15 {:02}:15", i % 24)).unwrap(),
            plant_id: 4135001,
            source_key: "1BY6WEcLGh8j5v7".to_string(),
            actual_kw: 100.0 + i as f64,
            predicted_kw: 98.5 + i as f64,
        }
    }

    fn render(rows: &[HoldoutPrediction]) -> String {
        let mut buf = Vec::new();
        write_csv(rows, &mut buf).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn header_matches_columns() {
        let output = render(&[make_row(0)]);
        assert_eq!(
            output.lines().next(),
            Some(
                "date_time,plant_id,source_key,actual_ac_power_kw,\
                 predicted_ac_power_kw,abs_error_kw"
            )
        );
    }

    #[test]
    fn row_count_matches_prediction_count() {
        let rows: Vec<HoldoutPrediction> = (0..24).map(make_row).collect();
        // 1 header + 24 data rows
        assert_eq!(render(&rows).lines().count(), 25);
    }

    #[test]
    fn row_values_are_formatted() {
        let output = render(&[make_row(12)]);
        assert_eq!(
            output.lines().nth(1),
            Some("2020-05-15 12:15:00,4135001,1BY6WEcLGh8j5v7,112.0000,110.5000,1.5000")
        );
    }

    #[test]
    fn empty_export_has_only_header() {
        assert_eq!(render(&[]).lines().count(), 1);
    }

    #[test]
    fn file_export_writes_same_bytes() {
        let rows: Vec<HoldoutPrediction> = (0..3).map(make_row).collect();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("holdout.csv");
        export_csv(&rows, &path).expect("export");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), render(&rows));
    }
}
