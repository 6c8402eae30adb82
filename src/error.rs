//! Error taxonomy for validation, prediction, model artifacts and training.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::categories::CategoryKind;
use crate::config::ConfigError;
use crate::input::Field;

/// Rejection of a raw prediction request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A field was absent or blank.
    #[error("missing required field: {field}")]
    MissingField { field: Field },
    /// A temperature or irradiation field did not parse as a number.
    #[error("{field} must be numeric, got \"{value}\"")]
    NotNumeric { field: Field, value: String },
    /// A numeric field fell outside its closed interval.
    #[error("{field} {value} is outside the valid range [{min}, {max}] {unit}")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
        unit: &'static str,
    },
    /// The timestamp did not match `YYYY-MM-DD HH:MM`.
    #[error("timestamp \"{value}\" does not match the format YYYY-MM-DD HH:MM")]
    BadTimestampFormat { value: String },
    /// The plant or inverter selection is not in the lookup table.
    #[error("unknown {kind} \"{value}\"")]
    UnknownCategory { kind: CategoryKind, value: String },
}

/// Failure while producing a prediction from validated input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// No model artifact has been loaded successfully.
    #[error("model not loaded: {reason}")]
    ModelNotLoaded { reason: String },
    /// The model call failed or returned an unusable value.
    #[error("inference failed: {message}")]
    Inference { message: String },
}

/// Failure reading, writing or checking a model artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model file \"{}\" not found", path.display())]
    Missing { path: PathBuf },
    #[error("cannot access model file \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("model file \"{}\" is corrupt: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
    #[error("model format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("model was trained on features [{}], expected [{}]", found.join(", "), expected.join(", "))]
    FeatureMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },
    #[error("invalid {kind} table in model file: {message}")]
    InvalidCategories { kind: CategoryKind, message: String },
}

/// Failure in the offline training pipeline.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("dataset \"{}\": {message}", path.display())]
    Dataset { path: PathBuf, message: String },
    #[error("not enough data to train: {message}")]
    InsufficientData { message: String },
    #[error("no code assigned to {kind} \"{key}\"")]
    Encoding { kind: CategoryKind, key: String },
    #[error("forest fitting failed: {0}")]
    Fit(String),
    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input error: {0}")]
    Validation(#[from] ValidationError),
    #[error("prediction error: {0}")]
    Predict(#[from] PredictError),
    #[error("model error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("training error: {0}")]
    Train(#[from] TrainError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("export error: {0}")]
    Export(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        let err = ValidationError::OutOfRange {
            field: Field::AmbientTemperature,
            value: 70.0,
            min: -50.0,
            max: 60.0,
            unit: "°C",
        };
        assert_eq!(
            err.to_string(),
            "ambient temperature 70 is outside the valid range [-50, 60] °C"
        );

        let err = ValidationError::UnknownCategory {
            kind: CategoryKind::Inverter,
            value: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "unknown inverter \"nope\"");
    }

    #[test]
    fn crate_error_prefixes_category() {
        let err = Error::from(PredictError::ModelNotLoaded {
            reason: "model file \"model.json\" not found".to_string(),
        });
        assert!(err.to_string().starts_with("prediction error: model not loaded"));
    }
}
