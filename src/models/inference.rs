//! The prediction engine: encoder, hybrid members and weights as one bundle

use crate::config::AppConfig;
use crate::encoder::{EncodedFeatures, FeatureEncoder};
use crate::error::{PipelineError, PipelineResult};
use crate::models::hybrid::{self, WeightTriple};
use crate::models::loader::ModelLoader;
use crate::types::prediction::{CasePrediction, ModelEstimates};
use crate::types::request::PredictionRequest;
use std::path::Path;
use tracing::{debug, info};

/// A regression model: the capability the engine needs from each hybrid
/// member. ONNX sessions implement it in production, stubs in tests.
pub trait Regressor: Send + Sync {
    /// Model name, for logs and errors.
    fn name(&self) -> &str;

    /// Input width the model was trained on.
    fn expected_features(&self) -> usize;

    /// Predict the case count for one encoded request.
    fn predict(&self, features: &EncodedFeatures) -> PipelineResult<f64>;
}

/// The immutable prediction bundle: feature encoder, the three hybrid
/// members and the calibrated weight triple.
///
/// Built once at process start and shared by reference across workers;
/// prediction itself is a pure request-to-result computation.
pub struct PredictionEngine {
    encoder: FeatureEncoder,
    xgboost: Box<dyn Regressor>,
    lightgbm: Box<dyn Regressor>,
    random_forest: Box<dyn Regressor>,
    weights: WeightTriple,
}

impl PredictionEngine {
    /// Build the engine from configuration, loading every artifact.
    ///
    /// All five artifacts (three models, weights, feature space) are
    /// required; any missing or corrupt one fails the whole build.
    pub fn from_config(config: &AppConfig) -> PipelineResult<Self> {
        let models_dir = Path::new(&config.models.models_dir);

        let encoder = FeatureEncoder::from_file(models_dir.join(&config.models.feature_space_file))?;
        let weights = WeightTriple::from_file(models_dir.join(&config.models.weights_file))?;

        let width = encoder.feature_width();
        let loader = ModelLoader::with_threads(config.models.onnx_threads)?;
        let xgboost = loader.load_model(models_dir.join(&config.models.xgboost_file), "xgboost", width)?;
        let lightgbm =
            loader.load_model(models_dir.join(&config.models.lightgbm_file), "lightgbm", width)?;
        let random_forest = loader.load_model(
            models_dir.join(&config.models.random_forest_file),
            "random_forest",
            width,
        )?;

        info!(
            feature_width = width,
            weights = ?(weights.xgboost, weights.lightgbm, weights.random_forest),
            "Prediction engine initialized"
        );

        Ok(Self {
            encoder,
            xgboost: Box::new(xgboost),
            lightgbm: Box::new(lightgbm),
            random_forest: Box::new(random_forest),
            weights,
        })
    }

    /// Build an engine from already-constructed parts.
    pub fn from_parts(
        encoder: FeatureEncoder,
        xgboost: Box<dyn Regressor>,
        lightgbm: Box<dyn Regressor>,
        random_forest: Box<dyn Regressor>,
        weights: WeightTriple,
    ) -> Self {
        Self {
            encoder,
            xgboost,
            lightgbm,
            random_forest,
            weights,
        }
    }

    /// Run the full hybrid prediction for one request.
    ///
    /// Encode, check every member's input width, run the three models,
    /// combine with the weight triple and derive the bound band. Any error
    /// aborts the request; no partial prediction is ever returned.
    pub fn predict(&self, request: &PredictionRequest) -> PipelineResult<CasePrediction> {
        let encoded = self.encoder.encode(request)?;

        for member in [&self.xgboost, &self.lightgbm, &self.random_forest] {
            if member.expected_features() != encoded.len() {
                return Err(PipelineError::DimensionMismatch {
                    model: member.name().to_string(),
                    expected: member.expected_features(),
                    actual: encoded.len(),
                });
            }
        }

        // The three calls are independent; their order does not affect the
        // combination.
        let estimates = ModelEstimates {
            xgboost: self.xgboost.predict(&encoded)?,
            lightgbm: self.lightgbm.predict(&encoded)?,
            random_forest: self.random_forest.predict(&encoded)?,
        };

        let prediction = hybrid::aggregate(estimates, &self.weights);

        debug!(
            request_id = %request.request_id,
            point_estimate = prediction.point_estimate,
            lower = prediction.lower_bound,
            upper = prediction.upper_bound,
            "Hybrid prediction complete"
        );

        Ok(prediction)
    }

    /// Width of the encoded feature vector this engine produces.
    pub fn feature_width(&self) -> usize {
        self.encoder.feature_width()
    }

    /// Member model names, in combination order.
    pub fn model_names(&self) -> [&str; 3] {
        [
            self.xgboost.name(),
            self.lightgbm.name(),
            self.random_forest.name(),
        ]
    }

    /// The weight triple the engine combines with.
    pub fn weights(&self) -> &WeightTriple {
        &self.weights
    }

    /// The feature encoder behind the engine.
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stub member returning a fixed estimate.
    struct FixedRegressor {
        name: &'static str,
        expected: usize,
        estimate: f64,
    }

    impl Regressor for FixedRegressor {
        fn name(&self) -> &str {
            self.name
        }

        fn expected_features(&self) -> usize {
            self.expected
        }

        fn predict(&self, _features: &EncodedFeatures) -> PipelineResult<f64> {
            Ok(self.estimate)
        }
    }

    /// Stub member that always fails.
    struct FailingRegressor;

    impl Regressor for FailingRegressor {
        fn name(&self) -> &str {
            "failing"
        }

        fn expected_features(&self) -> usize {
            20
        }

        fn predict(&self, _features: &EncodedFeatures) -> PipelineResult<f64> {
            Err(PipelineError::Inference {
                model: "failing".to_string(),
                reason: "backend unavailable".to_string(),
            })
        }
    }

    fn test_encoder() -> FeatureEncoder {
        FeatureEncoder::from_parts(
            vec![
                "Kerala".to_string(),
                "Maharashtra".to_string(),
                "Bihar".to_string(),
            ],
            vec!["Murder".to_string(), "Theft".to_string()],
        )
        .unwrap()
    }

    fn member(name: &'static str, estimate: f64) -> Box<dyn Regressor> {
        Box::new(FixedRegressor {
            name,
            expected: 20,
            estimate,
        })
    }

    fn sample_request() -> PredictionRequest {
        PredictionRequest::new(
            "req_1".to_string(),
            "Maharashtra".to_string(),
            "Theft".to_string(),
            2024,
        )
    }

    #[test]
    fn test_end_to_end_prediction() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 1000.0),
            member("lightgbm", 1200.0),
            member("random_forest", 900.0),
            WeightTriple::new(0.4, 0.35, 0.25).unwrap(),
        );

        let prediction = engine.predict(&sample_request()).unwrap();
        assert_eq!(prediction.point_estimate, 1045.0);
        assert_eq!(prediction.lower_bound, 888);
        assert_eq!(prediction.upper_bound, 1201);
        assert_eq!(prediction.model_estimates.lightgbm, 1200.0);
    }

    #[test]
    fn test_members_run_once_each_with_no_shared_state() {
        use std::sync::{Arc, Mutex};

        struct RecordingRegressor {
            name: &'static str,
            estimate: f64,
            calls: Arc<Mutex<Vec<&'static str>>>,
        }

        impl Regressor for RecordingRegressor {
            fn name(&self) -> &str {
                self.name
            }

            fn expected_features(&self) -> usize {
                20
            }

            fn predict(&self, _features: &EncodedFeatures) -> PipelineResult<f64> {
                self.calls.lock().unwrap().push(self.name);
                Ok(self.estimate)
            }
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recording = |name, estimate| -> Box<dyn Regressor> {
            Box::new(RecordingRegressor {
                name,
                estimate,
                calls: calls.clone(),
            })
        };

        let engine = PredictionEngine::from_parts(
            test_encoder(),
            recording("xgboost", 1000.0),
            recording("lightgbm", 1200.0),
            recording("random_forest", 900.0),
            WeightTriple::new(0.4, 0.35, 0.25).unwrap(),
        );

        let prediction = engine.predict(&sample_request()).unwrap();

        // One call per member, and the estimate is the pure combination of
        // the (member, weight) pairs regardless of which ran first.
        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.len(), 3);
        for member in ["xgboost", "lightgbm", "random_forest"] {
            assert_eq!(recorded.iter().filter(|&&c| c == member).count(), 1);
        }
        assert_eq!(prediction.point_estimate, 1045.0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 150.0),
            member("lightgbm", 160.0),
            member("random_forest", 170.0),
            WeightTriple::default(),
        );

        let first = engine.predict(&sample_request()).unwrap();
        let second = engine.predict(&sample_request()).unwrap();
        assert_eq!(first.point_estimate, second.point_estimate);
        assert_eq!(first.lower_bound, second.lower_bound);
        assert_eq!(first.upper_bound, second.upper_bound);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 100.0),
            Box::new(FixedRegressor {
                name: "lightgbm",
                expected: 59,
                estimate: 100.0,
            }),
            member("random_forest", 100.0),
            WeightTriple::default(),
        );

        let result = engine.predict(&sample_request());
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch {
                expected: 59,
                actual: 20,
                ..
            })
        ));
    }

    #[test]
    fn test_failed_member_aborts_the_request() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 100.0),
            Box::new(FailingRegressor),
            member("random_forest", 100.0),
            WeightTriple::default(),
        );

        let result = engine.predict(&sample_request());
        assert!(matches!(result, Err(PipelineError::Inference { .. })));
    }

    #[test]
    fn test_unknown_state_fails_before_any_model_runs() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 100.0),
            member("lightgbm", 100.0),
            member("random_forest", 100.0),
            WeightTriple::default(),
        );

        let mut request = sample_request();
        request.state = "Atlantis".to_string();

        let result = engine.predict(&request);
        assert!(matches!(result, Err(PipelineError::Transformation(_))));
    }

    #[test]
    fn test_engine_accessors() {
        let engine = PredictionEngine::from_parts(
            test_encoder(),
            member("xgboost", 1.0),
            member("lightgbm", 1.0),
            member("random_forest", 1.0),
            WeightTriple::new(0.4, 0.35, 0.25).unwrap(),
        );

        assert_eq!(engine.feature_width(), 20);
        assert_eq!(engine.model_names(), ["xgboost", "lightgbm", "random_forest"]);
        assert_eq!(engine.weights().xgboost, 0.4);
    }
}
