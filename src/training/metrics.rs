//! Post-hoc evaluation of held-out predictions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Regression scores over a held-out split.
///
/// Computed from paired actual/predicted vectors so the report always
/// matches the predictions it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of scored rows.
    pub samples: usize,
    /// Mean absolute error (kW).
    pub mae_kw: f64,
    /// Root-mean-square error (kW).
    pub rmse_kw: f64,
    /// Coefficient of determination. 0 when the actual values are constant.
    pub r2: f64,
}

impl EvaluationReport {
    /// Scores `predicted` against `actual`.
    ///
    /// # Arguments
    ///
    /// * `actual` - Observed AC power (kW)
    /// * `predicted` - Model output for the same rows (kW)
    ///
    /// Extra elements in the longer slice are ignored.
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                samples: 0,
                mae_kw: 0.0,
                rmse_kw: 0.0,
                r2: 0.0,
            };
        }

        let actual = &actual[..n];
        let predicted = &predicted[..n];
        let nf = n as f64;
        let mean = actual.iter().sum::<f64>() / nf;

        let mut abs_sum = 0.0_f64;
        let mut sq_sum = 0.0_f64;
        let mut total_sq = 0.0_f64;
        for (a, p) in actual.iter().zip(predicted) {
            let err = p - a;
            abs_sum += err.abs();
            sq_sum += err * err;
            total_sq += (a - mean) * (a - mean);
        }

        let r2 = if total_sq > 0.0 {
            1.0 - sq_sum / total_sq
        } else {
            0.0
        };

        Self {
            samples: n,
            mae_kw: abs_sum / nf,
            rmse_kw: (sq_sum / nf).sqrt(),
            r2,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Model Evaluation ---")?;
        writeln!(f, "Held-out rows:              {}", self.samples)?;
        writeln!(f, "Mean Absolute Error (MAE):  {:.2} kW", self.mae_kw)?;
        writeln!(f, "Root Mean Square Error:     {:.2} kW", self.rmse_kw)?;
        write!(f, "R-squared (R2) Score:       {:.4}", self.r2)
    }
}
