//! JSON model artifact.
//!
//! One file holds everything inference needs: the fitted forest, the feature
//! order it was fitted with, and the category tables that produced its codes.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::forest::{ForestModel, ForestParams};
use crate::categories::{CategoryKind, CategoryTables};
use crate::error::ArtifactError;
use crate::features::FEATURE_NAMES;
use crate::training::metrics::EvaluationReport;

/// Bumped whenever the artifact layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Provenance of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// When training finished.
    pub trained_at: DateTime<Utc>,
    /// Rows used to fit the forest.
    pub training_rows: usize,
    /// Rows held out for evaluation.
    pub test_rows: usize,
    /// Hyper-parameters the forest was fitted with.
    pub params: ForestParams,
    /// Scores on the held-out rows.
    pub evaluation: EvaluationReport,
}

/// Trained forest plus everything needed to feed it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub categories: CategoryTables,
    pub metadata: ModelMetadata,
    pub forest: ForestModel,
}

impl ModelArtifact {
    /// Wraps a freshly fitted forest with the current format and feature order.
    pub fn new(categories: CategoryTables, metadata: ModelMetadata, forest: ForestModel) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            categories,
            metadata,
            forest,
        }
    }

    /// Reads and checks an artifact from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Missing`] if the file does not exist, and the
    /// other [`ArtifactError`] variants if it cannot be read or fails a check.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ArtifactError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ArtifactError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Reads and checks an artifact from any reader; `path` is used in errors.
    ///
    /// # Errors
    ///
    /// See [`ModelArtifact::load`].
    pub fn from_reader(reader: impl Read, path: &Path) -> Result<Self, ArtifactError> {
        let artifact: Self =
            serde_json::from_reader(reader).map_err(|e| corrupt_or_io(path, e))?;
        artifact.check()?;
        Ok(artifact)
    }

    /// Writes the artifact to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let io_err = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| io_err(io::Error::other(e)))?;
        writer.flush().map_err(io_err)
    }

    fn check(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ArtifactError::FeatureMismatch {
                found: self.feature_names.clone(),
                expected: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            });
        }
        for kind in [CategoryKind::Plant, CategoryKind::Inverter] {
            let table = self.categories.table(kind);
            let checked = if table.kind() == kind {
                table.check()
            } else {
                Err(format!("table is tagged as {}", table.kind()))
            };
            checked.map_err(|message| ArtifactError::InvalidCategories { kind, message })?;
        }
        Ok(())
    }
}

fn corrupt_or_io(path: &Path, err: serde_json::Error) -> ArtifactError {
    let path: PathBuf = path.to_path_buf();
    if err.is_io() {
        ArtifactError::Io {
            path,
            source: err.into(),
        }
    } else {
        ArtifactError::Corrupt {
            path,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureVector, TimeFeatures};
    use crate::model::Regressor;

    fn tiny_artifact() -> ModelArtifact {
        let time = TimeFeatures {
            hour: 10,
            day_of_year: 100,
            day_of_week: 2,
        };
        let rows: Vec<FeatureVector> = (0..30)
            .map(|i| FeatureVector::new(20.0, 30.0, i as f64 / 30.0, time, 0, 0))
            .collect();
        let targets: Vec<f64> = (0..30).map(|i| i as f64 * 10.0).collect();
        let params = ForestParams {
            n_trees: 3,
            max_depth: Some(4),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 8,
            seed: 1,
        };
        let forest = ForestModel::fit(&rows, &targets, &params).expect("fit");
        let metadata = ModelMetadata {
            trained_at: Utc::now(),
            training_rows: rows.len(),
            test_rows: 0,
            params,
            evaluation: EvaluationReport::from_predictions(&[], &[]),
        };
        ModelArtifact::new(CategoryTables::builtin().clone(), metadata, forest)
    }

    #[test]
    fn save_then_load_preserves_predictions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        let artifact = tiny_artifact();
        artifact.save(&path).expect("save");

        let loaded = ModelArtifact::load(&path).expect("load");
        let row = FeatureVector::new(
            20.0,
            30.0,
            0.5,
            TimeFeatures {
                hour: 10,
                day_of_year: 100,
                day_of_week: 2,
            },
            0,
            0,
        );
        assert_eq!(
            artifact.forest.predict_row(&row).unwrap(),
            loaded.forest.predict_row(&row).unwrap()
        );
        assert_eq!(loaded.categories, artifact.categories);
        assert_eq!(loaded.metadata.params, artifact.metadata.params);
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let err = ModelArtifact::from_reader(&b"{\"model\": 1}"[..], Path::new("x.json"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn reordered_features_are_rejected() {
        let mut artifact = tiny_artifact();
        artifact.feature_names.swap(0, 1);
        let json = serde_json::to_vec(&artifact).unwrap();
        let err = ModelArtifact::from_reader(json.as_slice(), Path::new("m.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::FeatureMismatch { .. }));
    }

    #[test]
    fn future_format_version_is_rejected() {
        let mut artifact = tiny_artifact();
        artifact.format_version = ARTIFACT_FORMAT_VERSION + 1;
        let json = serde_json::to_vec(&artifact).unwrap();
        let err = ModelArtifact::from_reader(json.as_slice(), Path::new("m.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedVersion { .. }));
    }
}
