//! Crime Prediction Pipeline Library
//!
//! Backend for a crime prediction & analysis dashboard: loads the merged
//! crime/socio-economic dataset, serves the aggregation queries the charts
//! are built from, and answers prediction requests with a hybrid estimate
//! combined from three pretrained regression models.

pub mod config;
pub mod consumer;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod scorecard;
pub mod summary;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use dataset::CrimeDataset;
pub use encoder::FeatureEncoder;
pub use error::{PipelineError, PipelineResult};
pub use models::inference::PredictionEngine;
pub use producer::ResultProducer;
pub use types::{prediction::PredictionOutcome, request::PredictionRequest};
