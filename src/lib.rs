//! Solar inverter AC power prediction from weather readings.

/// Plant and inverter lookup tables.
pub mod categories;
/// Command-line arguments.
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod input;
/// File export.
pub mod io;
pub mod logging;
/// Trained regressor, artifact and store.
pub mod model;
pub mod predict;
/// Offline training pipeline.
pub mod training;

pub use error::{Error, Result};
