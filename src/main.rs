//! solar-predict entry point: CLI wiring and config-driven dispatch.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::info;

use solar_predict::cli::{Cli, Command, InfoArgs, PredictArgs, TrainArgs};
use solar_predict::config::AppConfig;
use solar_predict::io::export::export_csv;
use solar_predict::logging;
use solar_predict::model::{ModelArtifact, ModelStore};
use solar_predict::predict::{PredictionService, format_kw};
use solar_predict::training::train_from_datasets;

fn run_predict(config: &AppConfig, args: &PredictArgs) -> solar_predict::Result<()> {
    let path = model_path(config, args.model.as_ref());
    let mut service = PredictionService::new(ModelStore::new(path));
    let (input, prediction) = service.predict(&args.raw_input())?;

    if args.details {
        println!("{input}");
        println!("Features:            {:?}", prediction.features.as_slice());
        if prediction.was_clamped() {
            println!(
                "Model output:        {} (clamped to zero)",
                format_kw(prediction.raw_output_kw)
            );
        }
    }
    println!("Predicted AC Power: {prediction}");
    Ok(())
}

fn run_train(config: &AppConfig, args: &TrainArgs) -> solar_predict::Result<()> {
    let mut training = config.training.clone();
    if let Some(seed) = args.seed {
        training.seed = seed;
    }

    let outcome = train_from_datasets(&config.dataset.plants, &training)?;
    let path = args.model_out.clone().unwrap_or_else(|| config.model.path.clone());
    outcome.artifact.save(&path)?;
    info!(path = %path.display(), "model saved");

    println!("{}", outcome.evaluation());

    if let Some(ref out) = args.predictions_out {
        export_csv(&outcome.holdout, out)?;
        eprintln!("Held-out predictions written to {}", out.display());
    }
    Ok(())
}

fn run_info(config: &AppConfig, args: &InfoArgs) -> solar_predict::Result<()> {
    let path = model_path(config, args.model.as_ref());
    let artifact = ModelArtifact::load(&path)?;
    let meta = &artifact.metadata;

    println!("Model:         {}", path.display());
    println!("Format:        v{}", artifact.format_version);
    println!("Trained at:    {}", meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "Rows:          {} training, {} test",
        meta.training_rows, meta.test_rows
    );
    println!(
        "Forest:        {} trees, max depth {}, min split {}, min leaf {}, max features {}, seed {}",
        meta.params.n_trees,
        meta.params
            .max_depth
            .map_or_else(|| "unlimited".to_string(), |d| d.to_string()),
        meta.params.min_samples_split,
        meta.params.min_samples_leaf,
        meta.params.max_features,
        meta.params.seed
    );
    println!("Features:      {}", artifact.feature_names.join(", "));
    println!("\n{}", meta.evaluation);

    println!("\nPlants:");
    for e in artifact.categories.plants.entries() {
        println!("  {:>3}  {}", e.code, e.label);
    }
    println!("\nInverters:");
    for e in artifact.categories.inverters.entries() {
        println!("  {:>3}  {}", e.code, e.key);
    }
    Ok(())
}

fn model_path(config: &AppConfig, override_path: Option<&PathBuf>) -> PathBuf {
    override_path
        .cloned()
        .unwrap_or_else(|| config.model.path.clone())
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Predict(args) => run_predict(&config, args),
        Command::Train(args) => run_train(&config, args),
        Command::Info(args) => run_info(&config, args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
