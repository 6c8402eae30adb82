//! TOML application configuration: model location, training hyper-parameters
//! and the plant datasets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::features::FEATURE_COUNT;
use crate::model::ForestParams;

/// Top-level configuration parsed from TOML.
///
/// Every section has defaults, so an empty file (or no file at all, see
/// [`AppConfig::load`]) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Where the model artifact lives.
    #[serde(default)]
    pub model: ModelConfig,
    /// Forest hyper-parameters and the train/test split.
    #[serde(default)]
    pub training: TrainingConfig,
    /// Input files for training.
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Model artifact location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Path of the JSON artifact read by `predict` and written by `train`.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model.json"),
        }
    }
}

/// Training parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    /// Number of trees in the forest (must be > 0).
    pub n_trees: usize,
    /// Maximum tree depth; 0 means unlimited.
    pub max_depth: u16,
    /// Minimum rows needed to split a node (must be >= 2).
    pub min_samples_split: usize,
    /// Minimum rows in a leaf (must be >= 1).
    pub min_samples_leaf: usize,
    /// Features tried at each split, in 1..=8.
    pub max_features: usize,
    /// Share of rows held out for evaluation, in (0.0, 1.0).
    pub test_fraction: f64,
    /// Seed for the split and the forest.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let forest = ForestParams::default();
        Self {
            n_trees: forest.n_trees,
            max_depth: forest.max_depth.unwrap_or(0),
            min_samples_split: forest.min_samples_split,
            min_samples_leaf: forest.min_samples_leaf,
            max_features: forest.max_features,
            test_fraction: 0.2,
            seed: forest.seed,
        }
    }
}

impl TrainingConfig {
    /// Forest hyper-parameters described by this section.
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            seed: self.seed,
        }
    }
}

/// Training datasets, one entry per plant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub plants: Vec<PlantDataset>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            plants: (1..=2)
                .map(|n| PlantDataset {
                    generation: PathBuf::from(format!("dataset/Plant_{n}_Generation_Data.csv")),
                    weather: PathBuf::from(format!("dataset/Plant_{n}_Weather_Sensor_Data.csv")),
                })
                .collect(),
        }
    }
}

/// Generation and weather-sensor files of one plant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantDataset {
    pub generation: PathBuf,
    pub weather: PathBuf,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"training.n_trees"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AppConfig {
    /// Loads the file at `path` if given, otherwise the defaults, and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns every [`ConfigError`] found: a single read/parse error, or all
    /// constraint violations reported by [`AppConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, Vec<ConfigError>> {
        let config = match path {
            Some(path) => Self::from_toml_file(path).map_err(|e| vec![e])?,
            None => Self::default(),
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.model.path.as_os_str().is_empty() {
            errors.push(ConfigError::new("model.path", "must not be empty"));
        }

        let t = &self.training;
        if t.n_trees == 0 {
            errors.push(ConfigError::new("training.n_trees", "must be > 0"));
        }
        if t.min_samples_split < 2 {
            errors.push(ConfigError::new("training.min_samples_split", "must be >= 2"));
        }
        if t.min_samples_leaf == 0 {
            errors.push(ConfigError::new("training.min_samples_leaf", "must be >= 1"));
        }
        if !(1..=FEATURE_COUNT).contains(&t.max_features) {
            errors.push(ConfigError::new(
                "training.max_features",
                format!("must be in [1, {FEATURE_COUNT}], got {}", t.max_features),
            ));
        }
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            errors.push(ConfigError::new(
                "training.test_fraction",
                format!("must be in (0.0, 1.0), got {}", t.test_fraction),
            ));
        }

        if self.dataset.plants.is_empty() {
            errors.push(ConfigError::new("dataset.plants", "at least one plant is required"));
        }
        for (i, plant) in self.dataset.plants.iter().enumerate() {
            if plant.generation.as_os_str().is_empty() {
                errors.push(ConfigError::new(
                    format!("dataset.plants[{i}].generation"),
                    "must not be empty",
                ));
            }
            if plant.weather.as_os_str().is_empty() {
                errors.push(ConfigError::new(
                    format!("dataset.plants[{i}].weather"),
                    "must not be empty",
                ));
            }
        }

        errors
    }
}
