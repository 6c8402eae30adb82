//! Trained regressor, its on-disk artifact, and the process-lifetime store.

/// Serialized model artifact: forest, category tables and metadata.
pub mod artifact;
/// Random forest wrapper around `smartcore`.
pub mod forest;
/// Load-once cache for the artifact.
pub mod store;

pub use artifact::{ARTIFACT_FORMAT_VERSION, ModelArtifact, ModelMetadata};
pub use forest::{ForestModel, ForestParams};
pub use store::ModelStore;

use crate::error::PredictError;
use crate::features::FeatureVector;

/// Anything that maps one feature vector to a power estimate in kW.
pub trait Regressor {
    /// Runs inference for a single row.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Inference`] if the underlying model fails.
    fn predict_row(&self, features: &FeatureVector) -> Result<f64, PredictError>;
}

impl<R: Regressor + ?Sized> Regressor for &R {
    fn predict_row(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        (**self).predict_row(features)
    }
}
