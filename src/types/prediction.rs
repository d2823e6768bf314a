//! Prediction result and outcome data structures

use crate::models::hybrid::WeightTriple;
use crate::types::request::PredictionRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw outputs of the three hybrid members for one encoded request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelEstimates {
    pub xgboost: f64,
    pub lightgbm: f64,
    pub random_forest: f64,
}

/// The hybrid prediction for one request: weighted point estimate plus the
/// ±15% truncated bound band.
///
/// Created fresh per request and never mutated. For non-negative estimates
/// `lower_bound <= point_estimate <= upper_bound` holds whenever the
/// estimate is whole-valued; the literal truncation arithmetic is kept for
/// every input, so a negative estimate inverts the band ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasePrediction {
    /// Weighted combination of the three model outputs
    pub point_estimate: f64,

    /// `point_estimate * 0.85`, truncated toward zero
    pub lower_bound: i64,

    /// `point_estimate * 1.15`, truncated toward zero
    pub upper_bound: i64,

    /// Individual model outputs behind the estimate
    pub model_estimates: ModelEstimates,
}

impl CasePrediction {
    /// Wrap this prediction into the envelope published for the display
    /// layer, echoing the request context.
    pub fn to_outcome(&self, request: &PredictionRequest, weights: &WeightTriple) -> PredictionOutcome {
        PredictionOutcome::new(request.request_id.clone(), self.clone())
            .with_request_context(request.state.clone(), request.crime_type.clone(), request.year)
            .with_weights(weights.clone())
    }
}

/// Envelope published to the result subject once a request has been scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    /// Unique outcome identifier
    pub outcome_id: String,

    /// Identifier of the request this outcome answers
    pub request_id: String,

    /// Echoed request context
    pub state: String,
    pub crime_type: String,
    pub year: i32,

    /// The hybrid prediction
    pub prediction: CasePrediction,

    /// Weight triple the estimate was combined with
    pub weights: WeightTriple,

    /// Outcome generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionOutcome {
    /// Create a new outcome for a request.
    pub fn new(request_id: String, prediction: CasePrediction) -> Self {
        Self {
            outcome_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            state: String::new(),
            crime_type: String::new(),
            year: 0,
            prediction,
            weights: WeightTriple::default(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the request context for display.
    pub fn with_request_context(mut self, state: String, crime_type: String, year: i32) -> Self {
        self.state = state;
        self.crime_type = crime_type;
        self.year = year;
        self
    }

    /// Attach the weight triple used for the combination.
    pub fn with_weights(mut self, weights: WeightTriple) -> Self {
        self.weights = weights;
        self
    }
}
