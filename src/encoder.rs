//! Feature encoding for hybrid model inference.
//!
//! This module turns a typed prediction request into the numeric vector the
//! three hybrid models were trained on: year and the fourteen socio-economic
//! indicators in declared order, followed by one-hot positions for the state
//! and crime-category vocabularies. The layout is pinned by the feature
//! space artifact exported alongside the models.

use crate::error::{PipelineError, PipelineResult};
use crate::types::indicators::Indicator;
use crate::types::request::PredictionRequest;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Fixed-length numeric form of one request; the only representation the
/// models accept.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures(Vec<f32>);

impl EncodedFeatures {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for EncodedFeatures {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// On-disk layout of the feature space artifact.
#[derive(Debug, Deserialize)]
struct FeatureSpaceFile {
    numeric_features: Vec<String>,
    states: Vec<String>,
    crime_types: Vec<String>,
}

/// Encoder that transforms prediction requests into model input features.
///
/// Matches the preprocessing done in the training pipeline; vocabulary order
/// is the training-time column order.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    states: Vec<String>,
    crime_types: Vec<String>,
}

impl FeatureEncoder {
    /// Build an encoder from explicit vocabularies.
    pub fn from_parts(states: Vec<String>, crime_types: Vec<String>) -> PipelineResult<Self> {
        if states.is_empty() || crime_types.is_empty() {
            return Err(PipelineError::Transformation(
                "feature space vocabularies must not be empty".to_string(),
            ));
        }
        Ok(Self {
            states,
            crime_types,
        })
    }

    /// Load the feature space artifact and validate it against the
    /// compiled-in numeric feature set.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| PipelineError::artifact("feature_space", path, e))?;
        let space: FeatureSpaceFile = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::artifact("feature_space", path, e))?;

        Self::from_space(space).map_err(|e| PipelineError::artifact("feature_space", path, e))
    }

    /// Parse an artifact already held in memory.
    pub fn from_json(raw: &str) -> PipelineResult<Self> {
        let space: FeatureSpaceFile = serde_json::from_str(raw)
            .map_err(|e| PipelineError::Transformation(e.to_string()))?;
        Self::from_space(space)
    }

    fn from_space(space: FeatureSpaceFile) -> PipelineResult<Self> {
        // The artifact documents the training-time layout; any disagreement
        // with the numeric features this build encodes means the bundle is
        // incoherent.
        let expected: Vec<&str> = std::iter::once("year")
            .chain(Indicator::ALL.iter().map(|i| i.name()))
            .collect();
        let declared: Vec<&str> = space.numeric_features.iter().map(|s| s.as_str()).collect();
        if declared != expected {
            return Err(PipelineError::Transformation(format!(
                "numeric feature list {:?} does not match the supported set {:?}",
                declared, expected
            )));
        }

        for (label, vocab) in [("states", &space.states), ("crime_types", &space.crime_types)] {
            if vocab.is_empty() {
                return Err(PipelineError::Transformation(format!(
                    "{} vocabulary is empty",
                    label
                )));
            }
            let mut seen = std::collections::HashSet::new();
            for entry in vocab {
                if !seen.insert(entry.as_str()) {
                    return Err(PipelineError::Transformation(format!(
                        "{} vocabulary has duplicate entry '{}'",
                        label, entry
                    )));
                }
            }
        }

        let encoder = Self {
            states: space.states,
            crime_types: space.crime_types,
        };
        info!(
            width = encoder.feature_width(),
            states = encoder.states.len(),
            crime_types = encoder.crime_types.len(),
            "Feature space loaded"
        );
        Ok(encoder)
    }

    /// Encode a request into the model input vector.
    ///
    /// Layout: year, the 14 indicators in declared order, one-hot state,
    /// one-hot crime category. Unknown categories and non-finite indicator
    /// values are rejected before any model runs.
    pub fn encode(&self, request: &PredictionRequest) -> PipelineResult<EncodedFeatures> {
        let mut values = Vec::with_capacity(self.feature_width());

        values.push(request.year as f32);
        for indicator in Indicator::ALL {
            let value = request.indicator(indicator);
            if !value.is_finite() {
                return Err(PipelineError::Transformation(format!(
                    "indicator {} must be a finite number, got {}",
                    indicator, value
                )));
            }
            values.push(value as f32);
        }

        let state_idx = Self::vocab_index(&self.states, &request.state, "state")?;
        values.extend((0..self.states.len()).map(|i| if i == state_idx { 1.0 } else { 0.0 }));

        let crime_idx = Self::vocab_index(&self.crime_types, &request.crime_type, "crime category")?;
        values.extend((0..self.crime_types.len()).map(|i| if i == crime_idx { 1.0 } else { 0.0 }));

        Ok(EncodedFeatures(values))
    }

    fn vocab_index(vocab: &[String], value: &str, label: &str) -> PipelineResult<usize> {
        vocab.iter().position(|entry| entry == value).ok_or_else(|| {
            PipelineError::Transformation(format!(
                "unknown {} '{}'; not part of the trained vocabulary",
                label, value
            ))
        })
    }

    /// Number of features produced per request.
    pub fn feature_width(&self) -> usize {
        1 + Indicator::ALL.len() + self.states.len() + self.crime_types.len()
    }

    /// Feature names in output order, for logging and display.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.feature_width());
        names.push("year".to_string());
        names.extend(Indicator::ALL.iter().map(|i| i.name().to_string()));
        names.extend(self.states.iter().map(|s| format!("state={}", s)));
        names.extend(self.crime_types.iter().map(|c| format!("crime_type={}", c)));
        names
    }

    /// State vocabulary in artifact order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Crime-category vocabulary in artifact order.
    pub fn crime_types(&self) -> &[String] {
        &self.crime_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_encoder() -> FeatureEncoder {
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

    fn sample_request() -> PredictionRequest {
        let mut request = PredictionRequest::new(
            "req_1".to_string(),
            "Maharashtra".to_string(),
            "Theft".to_string(),
            2024,
        );
        request.unemployment_rate = 7.5;
        request.alcohol_consumption_per_capita = 4.2;
        request
    }

    #[test]
    fn test_feature_width() {
        let encoder = small_encoder();
        assert_eq!(encoder.feature_width(), 1 + 14 + 3 + 2);
        assert_eq!(encoder.feature_names().len(), encoder.feature_width());
    }

    #[test]
    fn test_encoding_layout() {
        let encoder = small_encoder();
        let encoded = encoder.encode(&sample_request()).unwrap();
        let values = encoded.as_slice();

        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 2024.0); // year
        assert_eq!(values[1], 7.5); // unemployment_rate
        assert_eq!(values[14], 4.2); // alcohol_consumption_per_capita
        assert_eq!(&values[15..18], &[0.0, 1.0, 0.0]); // state one-hot
        assert_eq!(&values[18..20], &[0.0, 1.0]); // crime one-hot
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let encoder = small_encoder();
        let mut request = sample_request();
        request.state = "Atlantis".to_string();

        let result = encoder.encode(&request);
        assert!(matches!(result, Err(PipelineError::Transformation(_))));
    }

    #[test]
    fn test_unknown_crime_type_is_rejected() {
        let encoder = small_encoder();
        let mut request = sample_request();
        request.crime_type = "Jaywalking".to_string();

        assert!(encoder.encode(&request).is_err());
    }

    #[test]
    fn test_non_finite_indicator_is_rejected() {
        let encoder = small_encoder();
        let mut request = sample_request();
        request.poverty_rate = f64::NAN;

        let result = encoder.encode(&request);
        assert!(matches!(result, Err(PipelineError::Transformation(_))));
    }

    #[test]
    fn test_artifact_round_trip() {
        let artifact = serde_json::json!({
            "numeric_features": ["year", "unemployment_rate", "poverty_rate",
                "per_capita_income", "inflation_rate", "population_density",
                "gender_ratio", "literacy_rate", "youth_population_percent",
                "urbanization_rate", "human_development_index",
                "police_stations_per_district", "conviction_rate",
                "police_personnel_per_100k", "alcohol_consumption_per_capita"],
            "states": ["Kerala", "Goa"],
            "crime_types": ["Theft"]
        });

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", artifact).unwrap();

        let encoder = FeatureEncoder::from_file(file.path()).unwrap();
        assert_eq!(encoder.feature_width(), 18);
        assert_eq!(encoder.states(), &["Kerala".to_string(), "Goa".to_string()]);
    }

    #[test]
    fn test_artifact_with_wrong_numeric_set_fails() {
        let artifact = serde_json::json!({
            "numeric_features": ["year", "rainfall_mm"],
            "states": ["Kerala"],
            "crime_types": ["Theft"]
        });

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", artifact).unwrap();

        let result = FeatureEncoder::from_file(file.path());
        assert!(matches!(result, Err(PipelineError::ArtifactLoad { .. })));
    }

    #[test]
    fn test_artifact_with_duplicate_vocab_entry_fails() {
        let names: Vec<String> = std::iter::once("year".to_string())
            .chain(Indicator::ALL.iter().map(|i| i.name().to_string()))
            .collect();
        let artifact = serde_json::json!({
            "numeric_features": names,
            "states": ["Kerala", "Kerala"],
            "crime_types": ["Theft"]
        });

        let result = FeatureEncoder::from_json(&artifact.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_shipped_feature_space_is_59_wide() {
        let encoder =
            FeatureEncoder::from_json(include_str!("../model/feature_space.json")).unwrap();
        assert_eq!(encoder.feature_width(), 59);
        assert!(encoder.states().contains(&"Maharashtra".to_string()));
        assert!(encoder.crime_types().contains(&"Cyber Crime".to_string()));
    }

    #[test]
    fn test_missing_artifact_fails() {
        let result = FeatureEncoder::from_file("no/such/feature_space.json");
        assert!(matches!(result, Err(PipelineError::ArtifactLoad { .. })));
    }
}
