//! Process-lifetime holder for the model artifact.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::artifact::ModelArtifact;
use crate::error::ArtifactError;

/// Loads the artifact on first use and keeps it for the life of the process.
///
/// Constructed once at startup and handed to whoever predicts. A failed load
/// is returned to that caller only; the next call tries again.
#[derive(Debug)]
pub struct ModelStore {
    path: PathBuf,
    loaded: Option<ModelArtifact>,
}

impl ModelStore {
    /// Creates an empty store for the artifact at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    /// Creates a store that already holds `artifact`.
    pub fn with_artifact(path: impl Into<PathBuf>, artifact: ModelArtifact) -> Self {
        Self {
            path: path.into(),
            loaded: Some(artifact),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The cached artifact, without attempting a load.
    pub fn loaded(&self) -> Option<&ModelArtifact> {
        self.loaded.as_ref()
    }

    /// Returns the cached artifact, loading it first if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`ArtifactError`] from the load attempt. Nothing is cached
    /// on failure.
    pub fn get(&mut self) -> Result<&ModelArtifact, ArtifactError> {
        let artifact = match self.loaded.take() {
            Some(artifact) => artifact,
            None => {
                debug!(path = %self.path.display(), "loading model artifact");
                let artifact = ModelArtifact::load(&self.path)?;
                info!(
                    path = %self.path.display(),
                    trained_at = %artifact.metadata.trained_at,
                    plants = artifact.categories.plants.len(),
                    inverters = artifact.categories.inverters.len(),
                    "model loaded"
                );
                artifact
            }
        };
        Ok(self.loaded.insert(artifact))
    }

    /// Eager load at startup. Failure is logged and left for the first request
    /// to report.
    pub fn preload(&mut self) -> bool {
        match self.get() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "model preload failed");
                false
            }
        }
    }
}
