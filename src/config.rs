//! Configuration management for the crime prediction pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub dataset: DatasetConfig,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for outgoing prediction outcomes
    pub result_subject: String,
    /// Queue group for load-balancing requests across pipeline instances
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Tabular dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Path to the merged crime/socio-economic CSV
    pub path: String,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the model artifacts
    pub models_dir: String,
    /// ONNX file names for the three hybrid members
    #[serde(default = "default_xgboost_file")]
    pub xgboost_file: String,
    #[serde(default = "default_lightgbm_file")]
    pub lightgbm_file: String,
    #[serde(default = "default_random_forest_file")]
    pub random_forest_file: String,
    /// Weight triple artifact file name
    #[serde(default = "default_weights_file")]
    pub weights_file: String,
    /// Feature space artifact file name
    #[serde(default = "default_feature_space_file")]
    pub feature_space_file: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_xgboost_file() -> String {
    "xgb_hybrid.onnx".to_string()
}

fn default_lightgbm_file() -> String {
    "lgbm_hybrid.onnx".to_string()
}

fn default_random_forest_file() -> String {
    "rf_hybrid.onnx".to_string()
}

fn default_weights_file() -> String {
    "hybrid_weights.json".to_string()
}

fn default_feature_space_file() -> String {
    "feature_space.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of requests processed concurrently
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "crime.prediction.requests".to_string(),
                result_subject: "crime.prediction.results".to_string(),
                queue_group: None,
            },
            dataset: DatasetConfig {
                path: "data/final_merged_dataset.csv".to_string(),
            },
            models: ModelsConfig {
                models_dir: "model".to_string(),
                xgboost_file: default_xgboost_file(),
                lightgbm_file: default_lightgbm_file(),
                random_forest_file: default_random_forest_file(),
                weights_file: default_weights_file(),
                feature_space_file: default_feature_space_file(),
                onnx_threads: 1,
            },
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "crime.prediction.requests");
        assert!(config.nats.queue_group.is_none());
        assert_eq!(config.models.xgboost_file, "xgb_hybrid.onnx");
        assert_eq!(config.models.onnx_threads, 1);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats.internal:4222"
request_subject = "crime.prediction.requests"
result_subject = "crime.prediction.results"
queue_group = "predictors"

[dataset]
path = "data/final_merged_dataset.csv"

[models]
models_dir = "model"
onnx_threads = 2

[pipeline]
workers = 8

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.nats.url, "nats://nats.internal:4222");
        assert_eq!(config.nats.queue_group.as_deref(), Some("predictors"));
        assert_eq!(config.models.onnx_threads, 2);
        assert_eq!(config.pipeline.workers, 8);
        // Unspecified artifact names fall back to the shipped defaults.
        assert_eq!(config.models.weights_file, "hybrid_weights.json");
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(AppConfig::load_from_path("no/such/config.toml").is_err());
    }
}
