//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::input::RawInput;

/// Solar inverter AC power prediction.
#[derive(Debug, Parser)]
#[command(name = "solar-predict", version)]
#[command(about = "Predict solar inverter AC power from weather readings", long_about = None)]
pub struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict AC power for one inverter at one instant
    Predict(PredictArgs),
    /// Train a model from the configured plant datasets
    Train(TrainArgs),
    /// Show what a trained model contains
    Info(InfoArgs),
}

/// Request fields are taken as text and checked by the input validator, so
/// malformed values get the same errors as any other caller.
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Timestamp as YYYY-MM-DD HH:MM
    #[arg(long)]
    pub timestamp: Option<String>,
    /// Ambient temperature (°C)
    #[arg(long, allow_hyphen_values = true)]
    pub ambient: Option<String>,
    /// Module temperature (°C)
    #[arg(long, allow_hyphen_values = true)]
    pub module: Option<String>,
    /// Irradiation (kW/m²)
    #[arg(long, allow_hyphen_values = true)]
    pub irradiation: Option<String>,
    /// Plant ID or label, e.g. 4135001
    #[arg(long)]
    pub plant: Option<String>,
    /// Inverter source key
    #[arg(long)]
    pub inverter: Option<String>,
    /// Model artifact; overrides model.path from the configuration
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Also print the validated input and feature vector
    #[arg(long)]
    pub details: bool,
}

impl PredictArgs {
    pub fn raw_input(&self) -> RawInput {
        RawInput {
            timestamp: self.timestamp.clone(),
            ambient_temperature: self.ambient.clone(),
            module_temperature: self.module.clone(),
            irradiation: self.irradiation.clone(),
            plant: self.plant.clone(),
            inverter: self.inverter.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Where to write the artifact; overrides model.path
    #[arg(long)]
    pub model_out: Option<PathBuf>,
    /// Override training.seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Write held-out predictions to this CSV file
    #[arg(long)]
    pub predictions_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Model artifact; overrides model.path
    #[arg(long)]
    pub model: Option<PathBuf>,
}
