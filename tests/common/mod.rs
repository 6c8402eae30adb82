//! Shared test fixtures for integration tests.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use solar_predict::config::{PlantDataset, TrainingConfig};

/// Inverters per synthetic plant, with their relative capacity.
pub const PLANT_1_INVERTERS: [(&str, f64); 3] = [
    ("1BY6WEcLGh8j5v7", 1.0),
    ("VHMLBKoKgIrUVDU", 0.9),
    ("zVJPv84UY57bAof", 1.1),
];
pub const PLANT_2_INVERTERS: [(&str, f64); 2] = [("4UPUqMRk7TRMgml", 1.0), ("Et9kgGMDl729KT4", 0.8)];

/// Irradiation (kW/m²) for a 15-minute slot between 06:00 and 18:00.
fn irradiation(slot: usize) -> f64 {
    let x = slot as f64 / 48.0 * std::f64::consts::PI;
    (x.sin() * 1.1).max(0.0)
}

/// Writes one plant's generation and weather CSVs into `dir`.
///
/// Covers two days at 15-minute resolution from 06:00 to 18:00. Generation
/// timestamps use the day-first layout and weather timestamps the ISO layout
/// with seconds, like the published datasets. The last weather slot of each
/// day is left out so some rows exercise the zero fill.
pub fn write_plant(dir: &Path, plant_id: u64, inverters: &[(&str, f64)]) -> PlantDataset {
    let mut generation =
        String::from("DATE_TIME,PLANT_ID,SOURCE_KEY,DC_POWER,AC_POWER,DAILY_YIELD,TOTAL_YIELD\n");
    let mut weather = String::from(
        "DATE_TIME,PLANT_ID,SOURCE_KEY,AMBIENT_TEMPERATURE,MODULE_TEMPERATURE,IRRADIATION\n",
    );

    for day in 15..=16 {
        for slot in 0..=48 {
            let hour = 6 + slot / 4;
            let minute = (slot % 4) * 15;
            let irr = irradiation(slot);
            let ambient = 24.0 + 8.0 * irr;
            let module = ambient + 25.0 * irr;

            if slot < 48 {
                let _ = writeln!(
                    weather,
                    "2020-05-{day} {hour:02}:{minute:02}:00,{plant_id},HmiyD2TTLFNqkNe,\
                     {ambient:.4},{module:.4},{irr:.4}"
                );
            }
            for (key, capacity) in inverters {
                let ac = irr * 1000.0 * capacity;
                let _ = writeln!(
                    generation,
                    "{day}-05-2020 {hour:02}:{minute:02},{plant_id},{key},{:.3},{ac:.3},0.0,0.0",
                    ac * 10.2
                );
            }
        }
    }

    let dataset = PlantDataset {
        generation: dir.join(format!("Plant_{plant_id}_Generation_Data.csv")),
        weather: dir.join(format!("Plant_{plant_id}_Weather_Sensor_Data.csv")),
    };
    fs::write(&dataset.generation, generation).expect("write generation csv");
    fs::write(&dataset.weather, weather).expect("write weather csv");
    dataset
}

/// Both synthetic plants.
pub fn synthetic_plants(dir: &Path) -> Vec<PlantDataset> {
    vec![
        write_plant(dir, 4135001, &PLANT_1_INVERTERS),
        write_plant(dir, 4136001, &PLANT_2_INVERTERS),
    ]
}

/// Small forest so integration tests stay quick.
pub fn fast_training_config() -> TrainingConfig {
    TrainingConfig {
        n_trees: 10,
        max_depth: 8,
        min_samples_split: 2,
        min_samples_leaf: 1,
        max_features: 8,
        test_fraction: 0.2,
        seed: 42,
    }
}

/// Writes a TOML config pointing at `model` and the synthetic datasets.
pub fn write_config(dir: &Path, model: &Path, plants: &[PlantDataset]) -> PathBuf {
    let t = fast_training_config();
    let mut toml = format!(
        "[model]\npath = \"{}\"\n\n[training]\nn_trees = {}\nmax_depth = {}\n\
         min_samples_split = {}\nmin_samples_leaf = {}\nmax_features = {}\n\
         test_fraction = {}\nseed = {}\n",
        model.display(),
        t.n_trees,
        t.max_depth,
        t.min_samples_split,
        t.min_samples_leaf,
        t.max_features,
        t.test_fraction,
        t.seed
    );
    for plant in plants {
        let _ = write!(
            toml,
            "\n[[dataset.plants]]\ngeneration = \"{}\"\nweather = \"{}\"\n",
            plant.generation.display(),
            plant.weather.display()
        );
    }
    let path = dir.join("solar.toml");
    fs::write(&path, toml).expect("write config");
    path
}
