//! Hybrid aggregation of the three-model ensemble
//!
//! Combines the XGBoost, LightGBM and Random Forest outputs into a single
//! point estimate using the weight triple calibrated at training time, and
//! derives the ±15% bound band around it.

use crate::error::{PipelineError, PipelineResult};
use crate::types::prediction::{CasePrediction, ModelEstimates};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Relative deviation of the weight sum from 1.0 that triggers a warning.
const WEIGHT_SUM_TOLERANCE: f64 = 0.05;

/// The three combination weights, one per hybrid member.
///
/// Calibrated offline against held-out data and shipped as an artifact; not
/// required to sum to 1, but the reference calibration does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTriple {
    pub xgboost: f64,
    pub lightgbm: f64,
    pub random_forest: f64,
}

impl WeightTriple {
    /// Create a validated weight triple.
    ///
    /// Every weight must be finite and non-negative.
    pub fn new(xgboost: f64, lightgbm: f64, random_forest: f64) -> PipelineResult<Self> {
        for (name, weight) in [
            ("xgboost", xgboost),
            ("lightgbm", lightgbm),
            ("random_forest", random_forest),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(PipelineError::Transformation(format!(
                    "weight for {} must be finite and non-negative, got {}",
                    name, weight
                )));
            }
        }

        Ok(Self {
            xgboost,
            lightgbm,
            random_forest,
        })
    }

    /// Load the weight triple artifact: a JSON file holding a 3-element
    /// array `[w_xgboost, w_lightgbm, w_random_forest]`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::artifact("hybrid_weights", path, e))?;
        let values: [f64; 3] = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::artifact("hybrid_weights", path, e))?;

        let weights = Self::new(values[0], values[1], values[2])
            .map_err(|e| PipelineError::artifact("hybrid_weights", path, e))?;

        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!(sum = sum, "Hybrid weights do not sum to 1; combining as a plain weighted sum");
        }

        Ok(weights)
    }

    pub fn sum(&self) -> f64 {
        self.xgboost + self.lightgbm + self.random_forest
    }

    /// Weighted combination of the three model outputs.
    ///
    /// A weighted arithmetic mean when the triple sums to 1, a general
    /// weighted sum otherwise.
    pub fn combine(&self, estimates: &ModelEstimates) -> f64 {
        self.xgboost * estimates.xgboost
            + self.lightgbm * estimates.lightgbm
            + self.random_forest * estimates.random_forest
    }
}

impl Default for WeightTriple {
    fn default() -> Self {
        // Reference calibration shipped in model/hybrid_weights.json
        Self {
            xgboost: 0.4,
            lightgbm: 0.35,
            random_forest: 0.25,
        }
    }
}

/// ±15% bound band around a point estimate, truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionBand {
    pub lower: i64,
    pub upper: i64,
}

impl PredictionBand {
    /// Band around an estimate: `(estimate * 0.85, estimate * 1.15)`, each
    /// truncated toward zero.
    ///
    /// For negative estimates the multiplicative construction inverts the
    /// ordering; the reference arithmetic is kept as-is rather than
    /// reordered, since counts are non-negative in every calibrated use.
    pub fn around(estimate: f64) -> Self {
        Self {
            lower: (estimate * 0.85) as i64,
            upper: (estimate * 1.15) as i64,
        }
    }
}

/// Combine three model outputs into a full prediction: weighted point
/// estimate plus bound band. Pure; invoking it twice with the same inputs
/// yields the same result, and the summation order is fixed regardless of
/// the order the member models were evaluated in.
pub fn aggregate(estimates: ModelEstimates, weights: &WeightTriple) -> CasePrediction {
    let point_estimate = weights.combine(&estimates);
    let band = PredictionBand::around(point_estimate);

    CasePrediction {
        point_estimate,
        lower_bound: band.lower,
        upper_bound: band.upper,
        model_estimates: estimates,
    }
}
