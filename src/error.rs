//! Error taxonomy for the crime prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the prediction pipeline library.
///
/// None of these are retried; every variant aborts the request (or, for the
/// load-time variants, the startup phase) and propagates to the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A model, weights or feature-space artifact is missing or corrupt.
    #[error("failed to load artifact '{name}' from {path}: {reason}")]
    ArtifactLoad {
        name: String,
        path: PathBuf,
        reason: String,
    },

    /// Encoded feature vector length disagrees with a model's expected input.
    #[error("feature vector has {actual} values but model '{model}' expects {expected}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// A raw request could not be encoded into model features.
    #[error("cannot encode prediction request: {0}")]
    Transformation(String),

    /// The model backend failed or returned an undecodable output.
    #[error("inference failed for model '{model}': {reason}")]
    Inference { model: String, reason: String },

    /// The tabular dataset could not be read or parsed.
    #[error("failed to load dataset from {path}: {reason}")]
    Dataset { path: PathBuf, reason: String },

    /// ONNX runtime initialization failed.
    #[error("ONNX runtime error: {0}")]
    Runtime(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Shorthand for artifact failures, keeping call sites terse.
    pub fn artifact(name: &str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            name: name.to_string(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::DimensionMismatch {
            model: "xgboost".to_string(),
            expected: 59,
            actual: 58,
        };
        assert_eq!(
            err.to_string(),
            "feature vector has 58 values but model 'xgboost' expects 59"
        );
    }

    #[test]
    fn test_artifact_shorthand() {
        let err = PipelineError::artifact("weights", "model/hybrid_weights.json", "no such file");
        assert!(err.to_string().contains("hybrid_weights.json"));
        assert!(err.to_string().contains("no such file"));
    }
}
