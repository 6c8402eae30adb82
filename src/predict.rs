//! Inference: feature assembly, the single model call, and clamping.

use std::fmt;

use tracing::{debug, warn};

use crate::categories::CategoryTables;
use crate::error::{Error, PredictError};
use crate::features::FeatureVector;
use crate::input::{RawInput, ValidatedInput};
use crate::model::{ModelStore, Regressor};

/// A finished estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Estimated AC power after clamping (kW, >= 0).
    pub ac_power_kw: f64,
    /// Model output before clamping (kW).
    pub raw_output_kw: f64,
    /// Row the model was called with.
    pub features: FeatureVector,
}

impl Prediction {
    /// Whether a negative model output was raised to zero.
    pub fn was_clamped(&self) -> bool {
        self.ac_power_kw != self.raw_output_kw
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_kw(self.ac_power_kw))
    }
}

/// Power output cannot be negative. Always yields `+0.0` rather than `-0.0`.
pub fn clamp_power(raw_kw: f64) -> f64 {
    if raw_kw > 0.0 { raw_kw } else { 0.0 }
}

/// Formats a power value with two decimals and its unit, e.g. `12.34 kW`.
pub fn format_kw(kw: f64) -> String {
    format!("{kw:.2} kW")
}

/// Runs the model on a validated request.
///
/// # Arguments
///
/// * `model` - The loaded regressor, or `None` if loading never succeeded
/// * `input` - A request that passed validation
///
/// # Errors
///
/// Returns [`PredictError::ModelNotLoaded`] when `model` is `None`, and
/// [`PredictError::Inference`] when the model fails or returns a non-finite
/// value.
pub fn predict<R: Regressor + ?Sized>(
    model: Option<&R>,
    input: &ValidatedInput,
) -> Result<Prediction, PredictError> {
    let model = model.ok_or_else(|| PredictError::ModelNotLoaded {
        reason: "no model has been loaded".to_string(),
    })?;
    let features = FeatureVector::from_input(input);
    let raw_output_kw = model.predict_row(&features)?;
    if !raw_output_kw.is_finite() {
        return Err(PredictError::Inference {
            message: format!("model returned non-finite value {raw_output_kw}"),
        });
    }
    let ac_power_kw = clamp_power(raw_output_kw);
    if ac_power_kw != raw_output_kw {
        debug!(raw_output_kw, "negative model output clamped to zero");
    }
    Ok(Prediction {
        ac_power_kw,
        raw_output_kw,
        features,
    })
}

/// End-to-end prediction over a [`ModelStore`].
#[derive(Debug)]
pub struct PredictionService {
    store: ModelStore,
}

impl PredictionService {
    pub fn new(store: ModelStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Eagerly loads the model; see [`ModelStore::preload`].
    pub fn preload(&mut self) -> bool {
        self.store.preload()
    }

    /// Validates `raw`, then predicts with the stored model.
    ///
    /// Input is checked against the artifact's category tables when the
    /// artifact loads, and against the built-in tables otherwise, so input
    /// mistakes are reported even without a model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad input and [`Error::Predict`] when
    /// the model is unavailable or fails.
    pub fn predict(&mut self, raw: &RawInput) -> Result<(ValidatedInput, Prediction), Error> {
        let (tables, loaded) = match self.store.get() {
            Ok(artifact) => (&artifact.categories, Ok(artifact)),
            Err(e) => {
                warn!(error = %e, "model unavailable, validating with built-in tables");
                (CategoryTables::builtin(), Err(e))
            }
        };
        let input = raw.validate(tables)?;
        let artifact = loaded.map_err(|e| PredictError::ModelNotLoaded {
            reason: e.to_string(),
        })?;
        let prediction = predict(Some(&artifact.forest), &input)?;
        debug!(
            features = ?prediction.features.as_slice(),
            ac_power_kw = prediction.ac_power_kw,
            "prediction complete"
        );
        Ok((input, prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_timestamp;

    struct Fixed(f64);

    impl Regressor for Fixed {
        fn predict_row(&self, _: &FeatureVector) -> Result<f64, PredictError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl Regressor for Broken {
        fn predict_row(&self, _: &FeatureVector) -> Result<f64, PredictError> {
            Err(PredictError::Inference {
                message: "incompatible model".to_string(),
            })
        }
    }

    fn input() -> ValidatedInput {
        ValidatedInput {
            timestamp: parse_timestamp("2020-06-16 12:00").unwrap(),
            ambient_temperature_c: 30.0,
            module_temperature_c: 45.0,
            irradiation_kw_m2: 0.85,
            plant_code: 0,
            inverter_code: 5,
            plant_label: "Plant 1 (ID: 4135001)".to_string(),
            inverter_key: "VHMLBKoKgIrUVDU".to_string(),
        }
    }

    #[test]
    fn negative_output_is_reported_as_zero() {
        let p = predict(Some(&Fixed(-3.2)), &input()).expect("predict");
        assert_eq!(p.ac_power_kw, 0.0);
        assert_eq!(p.raw_output_kw, -3.2);
        assert!(p.was_clamped());
        assert_eq!(p.to_string(), "0.00 kW");
    }

    #[test]
    fn positive_output_passes_through() {
        let p = predict(Some(&Fixed(812.456)), &input()).expect("predict");
        assert_eq!(p.ac_power_kw, 812.456);
        assert!(!p.was_clamped());
        assert_eq!(p.to_string(), "812.46 kW");
        assert_eq!(
            p.features.as_slice(),
            &[30.0, 45.0, 0.85, 12.0, 168.0, 1.0, 0.0, 5.0]
        );
    }

    #[test]
    fn clamp_never_yields_negative_zero() {
        for raw in [-0.0, -1e-12, -3.2, f64::MIN] {
            let clamped = clamp_power(raw);
            assert_eq!(clamped, 0.0);
            assert!(clamped.is_sign_positive(), "raw={raw}");
            assert_eq!(format_kw(clamped), "0.00 kW");
        }
    }

    #[test]
    fn missing_model_is_model_not_loaded() {
        let err = predict::<Fixed>(None, &input()).unwrap_err();
        assert!(matches!(err, PredictError::ModelNotLoaded { .. }));
    }

    #[test]
    fn model_failure_is_inference_error() {
        let err = predict(Some(&Broken), &input()).unwrap_err();
        assert!(matches!(err, PredictError::Inference { .. }));

        let err = predict(Some(&Fixed(f64::NAN)), &input()).unwrap_err();
        assert!(matches!(err, PredictError::Inference { .. }));
    }

    #[test]
    fn trait_objects_work_as_models() {
        let model: Box<dyn Regressor> = Box::new(Fixed(1.5));
        let p = predict(Some(model.as_ref()), &input()).expect("predict");
        assert_eq!(p.ac_power_kw, 1.5);
    }

    #[test]
    fn service_without_model_still_validates_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = PredictionService::new(ModelStore::new(dir.path().join("none.json")));

        let mut raw = RawInput::new(
            "16/06/2020 12:00",
            "30",
            "45",
            "0.85",
            "4135001",
            "VHMLBKoKgIrUVDU",
        );
        assert!(matches!(
            service.predict(&raw),
            Err(Error::Validation(
                crate::error::ValidationError::BadTimestampFormat { .. }
            ))
        ));

        raw.timestamp = Some("2020-06-16 12:00".to_string());
        assert!(matches!(
            service.predict(&raw),
            Err(Error::Predict(PredictError::ModelNotLoaded { .. }))
        ));
    }

    #[test]
    fn builtin_selections_never_reach_a_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = PredictionService::new(ModelStore::new(dir.path().join("none.json")));
        let tables = CategoryTables::builtin();

        for plant in tables.plants.entries() {
            for inverter in tables.inverters.entries() {
                let raw = RawInput::new(
                    "2020-06-16 12:00",
                    "30",
                    "45",
                    "0.85",
                    &plant.key,
                    &inverter.key,
                );
                assert!(
                    matches!(
                        service.predict(&raw),
                        Err(Error::Predict(PredictError::ModelNotLoaded { .. }))
                    ),
                    "{} / {}",
                    plant.key,
                    inverter.key
                );
            }
        }
    }
}
