//! Offline training: datasets in, model artifact and held-out predictions out.

/// Generation/weather CSV readers and the per-plant join.
pub mod dataset;
/// Regression scores over the held-out rows.
pub mod metrics;
/// Seeded train/test split.
pub mod split;

use std::collections::BTreeSet;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::categories::{CategoryKind, CategoryTable, CategoryTables};
use crate::config::{PlantDataset, TrainingConfig};
use crate::error::TrainError;
use crate::features::{FeatureVector, TimeFeatures};
use crate::model::{ForestModel, ModelArtifact, ModelMetadata};

use self::dataset::Observation;
use self::metrics::EvaluationReport;
use self::split::train_test_split;

/// Model output for one held-out row next to the observed value.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutPrediction {
    pub timestamp: NaiveDateTime,
    pub plant_id: u64,
    pub source_key: String,
    pub actual_kw: f64,
    pub predicted_kw: f64,
}

impl HoldoutPrediction {
    /// Absolute prediction error (kW).
    pub fn abs_error_kw(&self) -> f64 {
        (self.predicted_kw - self.actual_kw).abs()
    }
}

/// Result of a training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub holdout: Vec<HoldoutPrediction>,
}

impl TrainingOutcome {
    pub fn evaluation(&self) -> &EvaluationReport {
        &self.artifact.metadata.evaluation
    }
}

/// Assigns codes in sorted order: plant IDs ascending, inverter keys by byte
/// order.
pub fn encode_categories(observations: &[Observation]) -> CategoryTables {
    let plant_ids: BTreeSet<u64> = observations.iter().map(|o| o.plant_id).collect();
    let inverter_keys: BTreeSet<&str> =
        observations.iter().map(|o| o.source_key.as_str()).collect();

    CategoryTables {
        plants: CategoryTable::from_ordered_keys(
            CategoryKind::Plant,
            plant_ids.into_iter().map(|id| id.to_string()),
            CategoryTables::plant_label,
        ),
        inverters: CategoryTable::from_ordered_keys(
            CategoryKind::Inverter,
            inverter_keys.into_iter().map(str::to_string),
            |_, key| key.to_string(),
        ),
    }
}

/// Builds one feature row and target per observation.
///
/// # Errors
///
/// Returns [`TrainError::Encoding`] if an observation's plant or inverter is
/// missing from `tables`.
pub fn feature_rows(
    observations: &[Observation],
    tables: &CategoryTables,
) -> Result<(Vec<FeatureVector>, Vec<f64>), TrainError> {
    let code = |kind: CategoryKind, key: &str| {
        tables
            .table(kind)
            .by_key(key)
            .map(|e| e.code)
            .ok_or_else(|| TrainError::Encoding {
                kind,
                key: key.to_string(),
            })
    };

    let mut rows = Vec::with_capacity(observations.len());
    let mut targets = Vec::with_capacity(observations.len());
    for o in observations {
        rows.push(FeatureVector::new(
            o.ambient_temperature_c,
            o.module_temperature_c,
            o.irradiation_kw_m2,
            TimeFeatures::from_datetime(&o.timestamp),
            code(CategoryKind::Plant, &o.plant_id.to_string())?,
            code(CategoryKind::Inverter, &o.source_key)?,
        ));
        targets.push(o.ac_power_kw);
    }
    Ok((rows, targets))
}

/// Trains and evaluates a forest on already-joined observations.
///
/// # Errors
///
/// Returns [`TrainError::InsufficientData`] for fewer than two observations
/// or a split that leaves either side empty, and [`TrainError::Fit`] if the
/// forest cannot be fitted.
pub fn train(
    observations: &[Observation],
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainError> {
    if observations.len() < 2 {
        return Err(TrainError::InsufficientData {
            message: format!("{} usable rows, need at least 2", observations.len()),
        });
    }

    let categories = encode_categories(observations);
    let (rows, targets) = feature_rows(observations, &categories)?;
    debug!(
        rows = rows.len(),
        plants = categories.plants.len(),
        inverters = categories.inverters.len(),
        "features built"
    );

    let split = train_test_split(rows.len(), config.test_fraction, config.seed);
    if split.train.is_empty() || split.test.is_empty() {
        return Err(TrainError::InsufficientData {
            message: format!(
                "test fraction {} leaves {} training and {} test rows",
                config.test_fraction,
                split.train.len(),
                split.test.len()
            ),
        });
    }

    let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<f64>) {
        idx.iter().map(|&i| (rows[i], targets[i])).unzip()
    };
    let (train_rows, train_targets) = pick(&split.train);
    let (test_rows, test_targets) = pick(&split.test);

    let params = config.forest_params();
    info!(
        train_rows = train_rows.len(),
        test_rows = test_rows.len(),
        n_trees = params.n_trees,
        "fitting random forest"
    );
    let forest = ForestModel::fit(&train_rows, &train_targets, &params)?;

    let predicted = forest.predict_batch(&test_rows)?;
    let evaluation = EvaluationReport::from_predictions(&test_targets, &predicted);
    info!(
        mae_kw = evaluation.mae_kw,
        rmse_kw = evaluation.rmse_kw,
        r2 = evaluation.r2,
        "model evaluated"
    );

    let holdout = split
        .test
        .iter()
        .zip(&predicted)
        .map(|(&i, &predicted_kw)| {
            let o = &observations[i];
            HoldoutPrediction {
                timestamp: o.timestamp,
                plant_id: o.plant_id,
                source_key: o.source_key.clone(),
                actual_kw: o.ac_power_kw,
                predicted_kw,
            }
        })
        .collect();

    let metadata = ModelMetadata {
        trained_at: Utc::now(),
        training_rows: train_rows.len(),
        test_rows: test_rows.len(),
        params,
        evaluation,
    };
    Ok(TrainingOutcome {
        artifact: ModelArtifact::new(categories, metadata, forest),
        holdout,
    })
}

/// Loads every plant dataset, concatenates them, and trains.
///
/// # Errors
///
/// Returns [`TrainError::Dataset`] for unreadable files and the errors of
/// [`train`] otherwise.
pub fn train_from_datasets(
    plants: &[PlantDataset],
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainError> {
    let mut observations = Vec::new();
    for plant in plants {
        let merged = dataset::load_plant(plant)?;
        info!(
            generation = %plant.generation.display(),
            rows = merged.len(),
            "plant dataset loaded"
        );
        observations.extend(merged);
    }
    train(&observations, config)
}
