//! ONNX model loader

use crate::encoder::EncodedFeatures;
use crate::error::{PipelineError, PipelineResult};
use crate::models::inference::Regressor;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::RwLock;
use tracing::info;

/// A regression model backed by an ONNX Runtime session.
///
/// The session is behind a write lock because one `run` call needs exclusive
/// access; the lock is held for that call only.
pub struct OnnxRegressor {
    name: String,
    session: RwLock<Session>,
    input_name: String,
    expected_features: usize,
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> usize {
        self.expected_features
    }

    fn predict(&self, features: &EncodedFeatures) -> PipelineResult<f64> {
        use ort::value::Tensor;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.as_slice().to_vec())).map_err(
            |e| PipelineError::Inference {
                model: self.name.clone(),
                reason: format!("failed to build input tensor: {}", e),
            },
        )?;

        let mut session = self.session.write().map_err(|e| PipelineError::Inference {
            model: self.name.clone(),
            reason: format!("session lock poisoned: {}", e),
        })?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PipelineError::Inference {
                model: self.name.clone(),
                reason: e.to_string(),
            })?;

        extract_estimate(&outputs, &self.name)
    }
}

/// Extract the single regression estimate from a model's outputs.
///
/// The exported regressors return one value per request, but the tensor
/// shape differs between exporters: `[1, 1]`, `[1]` or a flat vector. An
/// output no branch can decode is an inference error, never a default.
fn extract_estimate(outputs: &ort::session::SessionOutputs, model_name: &str) -> PipelineResult<f64> {
    for (name, output) in outputs.iter() {
        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (shape, data) = tensor;
            if data.is_empty() {
                continue;
            }

            // `[1, 1]`, `[1]` and flat exports all carry the estimate first.
            let dims: Vec<i64> = shape.iter().copied().collect();
            let estimate = data[0] as f64;

            tracing::debug!(
                model = %model_name,
                output = %name,
                shape = ?dims,
                estimate = estimate,
                "Extracted estimate"
            );
            return Ok(estimate);
        }
    }

    Err(PipelineError::Inference {
        model: model_name.to_string(),
        reason: "no decodable tensor output".to_string(),
    })
}

/// Feature width a model's input metadata declares, if it declares one.
///
/// Regressor exports use `[batch, width]` with a dynamic (-1) batch
/// dimension; a fully dynamic input declares nothing.
fn declared_input_width(dims: &[i64]) -> Option<usize> {
    match dims.last() {
        Some(&width) if width > 0 => Some(width as usize),
        _ => None,
    }
}

/// Fail when a model's declared input width disagrees with the width the
/// rest of the bundle was validated for.
fn check_declared_width(model: &str, dims: &[i64], expected_features: usize) -> PipelineResult<()> {
    if let Some(declared) = declared_input_width(dims) {
        if declared != expected_features {
            return Err(PipelineError::DimensionMismatch {
                model: model.to_string(),
                expected: declared,
                actual: expected_features,
            });
        }
    }
    Ok(())
}

/// Loader for the hybrid member models.
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread).
    pub fn new() -> PipelineResult<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with the given intra-op thread count.
    pub fn with_threads(onnx_threads: usize) -> PipelineResult<Self> {
        ort::init()
            .commit()
            .map_err(|e| PipelineError::Runtime(e.to_string()))?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX regressor from file.
    ///
    /// Every hybrid member is required: a missing or corrupt artifact is a
    /// load failure, not a skip.
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        expected_features: usize,
    ) -> PipelineResult<OnnxRegressor> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PipelineError::artifact(name, path, "file not found"));
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(self.onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| PipelineError::artifact(name, path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // A stale artifact trained on a different layout must fail here,
        // not as an opaque run error on the first request.
        if let Some(input) = session.inputs.first() {
            if let ort::value::ValueType::Tensor { shape, .. } = &input.input_type {
                let dims: Vec<i64> = shape.iter().copied().collect();
                check_declared_width(name, &dims, expected_features)?;
            }
        }

        info!(
            model = %name,
            input = %input_name,
            expected_features = expected_features,
            "Model loaded"
        );

        Ok(OnnxRegressor {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            expected_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_width_with_dynamic_batch() {
        assert_eq!(declared_input_width(&[-1, 59]), Some(59));
        assert_eq!(declared_input_width(&[1, 59]), Some(59));
        assert_eq!(declared_input_width(&[59]), Some(59));
    }

    #[test]
    fn test_fully_dynamic_input_declares_nothing() {
        assert_eq!(declared_input_width(&[-1, -1]), None);
        assert_eq!(declared_input_width(&[]), None);
    }

    #[test]
    fn test_matching_declared_width_passes() {
        assert!(check_declared_width("xgboost", &[-1, 59], 59).is_ok());
        // A model that declares no width cannot be checked at load.
        assert!(check_declared_width("xgboost", &[-1, -1], 59).is_ok());
    }

    #[test]
    fn test_stale_artifact_width_is_a_dimension_mismatch() {
        let result = check_declared_width("lightgbm", &[-1, 36], 59);
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch {
                expected: 36,
                actual: 59,
                ..
            })
        ));
    }
}
