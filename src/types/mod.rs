//! Type definitions for the crime prediction pipeline

pub mod indicators;
pub mod prediction;
pub mod request;

pub use indicators::{Indicator, Metric};
pub use prediction::{CasePrediction, ModelEstimates, PredictionOutcome};
pub use request::PredictionRequest;
