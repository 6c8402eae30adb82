use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::Regressor;
use crate::error::{PredictError, TrainError};
use crate::features::{FEATURE_COUNT, FeatureVector, to_row_major};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until the split limits stop it.
    pub max_depth: Option<u16>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples in a leaf.
    pub min_samples_leaf: usize,
    /// Features tried at each split; all of them by default.
    #[serde(default = "all_features")]
    pub max_features: usize,
    /// Seed for bootstrap sampling and feature selection.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: Some(15),
            min_samples_split: 5,
            min_samples_leaf: 1,
            max_features: FEATURE_COUNT,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn to_smartcore(&self) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_m(self.max_features)
            .with_seed(self.seed);
        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

fn all_features() -> usize {
    FEATURE_COUNT
}

/// A fitted random forest over [`FeatureVector`] rows.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForestModel {
    forest: Forest,
}

impl ForestModel {
    /// Fits a forest on `rows` against `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InsufficientData`] if the inputs are empty or of
    /// different lengths, and [`TrainError::Fit`] if smartcore rejects them.
    pub fn fit(
        rows: &[FeatureVector],
        targets: &[f64],
        params: &ForestParams,
    ) -> Result<Self, TrainError> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(TrainError::InsufficientData {
                message: format!("{} rows for {} targets", rows.len(), targets.len()),
            });
        }
        let x = matrix(rows);
        let y = targets.to_vec();
        let forest = Forest::fit(&x, &y, params.to_smartcore())
            .map_err(|e| TrainError::Fit(e.to_string()))?;
        Ok(Self { forest })
    }

    /// Predicts many rows in one call.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Inference`] if smartcore fails or returns the
    /// wrong number of values.
    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, PredictError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let predictions = self
            .forest
            .predict(&matrix(rows))
            .map_err(|e| PredictError::Inference {
                message: e.to_string(),
            })?;
        if predictions.len() != rows.len() {
            return Err(PredictError::Inference {
                message: format!(
                    "model returned {} values for {} rows",
                    predictions.len(),
                    rows.len()
                ),
            });
        }
        Ok(predictions)
    }
}

impl fmt::Debug for ForestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForestModel").finish_non_exhaustive()
    }
}

impl Regressor for ForestModel {
    fn predict_row(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        self.predict_batch(std::slice::from_ref(features))?
            .first()
            .copied()
            .ok_or_else(|| PredictError::Inference {
                message: "model returned no value".to_string(),
            })
    }
}

fn matrix(rows: &[FeatureVector]) -> DenseMatrix<f64> {
    DenseMatrix::new(rows.len(), FEATURE_COUNT, to_row_major(rows), false)
}
