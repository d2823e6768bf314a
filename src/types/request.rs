//! Prediction request data structures

use crate::types::indicators::Indicator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One crime-count prediction request for a (state, crime category, year)
/// tuple with its socio-economic context.
///
/// The shape is strict: a request missing any field, or carrying a field the
/// encoder does not know, is rejected at deserialization instead of failing
/// deep inside the feature transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionRequest {
    /// Caller-assigned identifier echoed in the outcome
    pub request_id: String,

    /// State or union territory name as it appears in the dataset
    pub state: String,

    /// Crime category name as it appears in the dataset
    pub crime_type: String,

    /// Year the prediction is for
    pub year: i32,

    pub unemployment_rate: f64,
    pub poverty_rate: f64,
    pub per_capita_income: f64,
    pub inflation_rate: f64,
    pub population_density: f64,
    pub gender_ratio: f64,
    pub literacy_rate: f64,
    pub youth_population_percent: f64,
    pub urbanization_rate: f64,
    pub human_development_index: f64,
    pub police_stations_per_district: f64,
    pub conviction_rate: f64,
    pub police_personnel_per_100k: f64,
    pub alcohol_consumption_per_capita: f64,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PredictionRequest {
    /// Create a request with zeroed indicators, for tests and tooling.
    pub fn new(request_id: String, state: String, crime_type: String, year: i32) -> Self {
        Self {
            request_id,
            state,
            crime_type,
            year,
            unemployment_rate: 0.0,
            poverty_rate: 0.0,
            per_capita_income: 0.0,
            inflation_rate: 0.0,
            population_density: 0.0,
            gender_ratio: 0.0,
            literacy_rate: 0.0,
            youth_population_percent: 0.0,
            urbanization_rate: 0.0,
            human_development_index: 0.0,
            police_stations_per_district: 0.0,
            conviction_rate: 0.0,
            police_personnel_per_100k: 0.0,
            alcohol_consumption_per_capita: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Value of a single indicator.
    pub fn indicator(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::UnemploymentRate => self.unemployment_rate,
            Indicator::PovertyRate => self.poverty_rate,
            Indicator::PerCapitaIncome => self.per_capita_income,
            Indicator::InflationRate => self.inflation_rate,
            Indicator::PopulationDensity => self.population_density,
            Indicator::GenderRatio => self.gender_ratio,
            Indicator::LiteracyRate => self.literacy_rate,
            Indicator::YouthPopulationPercent => self.youth_population_percent,
            Indicator::UrbanizationRate => self.urbanization_rate,
            Indicator::HumanDevelopmentIndex => self.human_development_index,
            Indicator::PoliceStationsPerDistrict => self.police_stations_per_district,
            Indicator::ConvictionRate => self.conviction_rate,
            Indicator::PolicePersonnelPer100k => self.police_personnel_per_100k,
            Indicator::AlcoholConsumptionPerCapita => self.alcohol_consumption_per_capita,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "request_id": "req_001",
            "state": "Maharashtra",
            "crime_type": "Theft",
            "year": 2024,
            "unemployment_rate": 7.1,
            "poverty_rate": 17.4,
            "per_capita_income": 215000.0,
            "inflation_rate": 5.5,
            "population_density": 365.0,
            "gender_ratio": 929.0,
            "literacy_rate": 82.3,
            "youth_population_percent": 27.3,
            "urbanization_rate": 45.2,
            "human_development_index": 0.696,
            "police_stations_per_district": 31.0,
            "conviction_rate": 48.9,
            "police_personnel_per_100k": 196.0,
            "alcohol_consumption_per_capita": 4.9
        })
    }

    #[test]
    fn test_request_serialization() {
        let req = PredictionRequest::new(
            "req_123".to_string(),
            "Kerala".to_string(),
            "Cyber Crime".to_string(),
            2026,
        );

        let json = serde_json::to_string(&req).unwrap();
        let deserialized: PredictionRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(req.request_id, deserialized.request_id);
        assert_eq!(req.state, deserialized.state);
        assert_eq!(req.year, deserialized.year);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value = sample_json();
        value.as_object_mut().unwrap().remove("literacy_rate");

        let result: Result<PredictionRequest, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut value = sample_json();
        value
            .as_object_mut()
            .unwrap()
            .insert("rainfall_mm".to_string(), serde_json::json!(810.0));

        let result: Result<PredictionRequest, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_defaults() {
        let req: PredictionRequest = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(req.state, "Maharashtra");
        assert!(req.timestamp <= Utc::now());
    }

    #[test]
    fn test_indicator_accessor() {
        let req: PredictionRequest = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(req.indicator(Indicator::LiteracyRate), 82.3);
        assert_eq!(req.indicator(Indicator::HumanDevelopmentIndex), 0.696);
    }
}
