//! Test Request Producer
//!
//! Generates and publishes randomized prediction requests to NATS for
//! pipeline testing.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request structure matching the pipeline's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PredictionRequest {
    request_id: String,
    state: String,
    crime_type: String,
    year: i32,
    unemployment_rate: f64,
    poverty_rate: f64,
    per_capita_income: f64,
    inflation_rate: f64,
    population_density: f64,
    gender_ratio: f64,
    literacy_rate: f64,
    youth_population_percent: f64,
    urbanization_rate: f64,
    human_development_index: f64,
    police_stations_per_district: f64,
    conviction_rate: f64,
    police_personnel_per_100k: f64,
    alcohol_consumption_per_capita: f64,
    timestamp: chrono::DateTime<Utc>,
}

const STATES: &[&str] = &[
    "Andhra Pradesh",
    "Bihar",
    "Delhi",
    "Gujarat",
    "Jammu & Kashmir",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Rajasthan",
    "Tamil Nadu",
    "Uttar Pradesh",
    "West Bengal",
];

const CRIME_TYPES: &[&str] = &[
    "Murder",
    "Rape",
    "Kidnapping",
    "Robbery",
    "Theft",
    "Dowry Deaths",
    "Cyber Crime",
    "Riots",
    "Domestic Violence",
];

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a request with indicator values near the dataset means
    fn generate_typical(&mut self) -> PredictionRequest {
        self.request_counter += 1;

        PredictionRequest {
            request_id: format!("req_{:012}", self.request_counter),
            state: self.random_choice(STATES).to_string(),
            crime_type: self.random_choice(CRIME_TYPES).to_string(),
            year: self.rng.gen_range(2001..=2030),
            unemployment_rate: self.rng.gen_range(3.0..12.0),
            poverty_rate: self.rng.gen_range(5.0..35.0),
            per_capita_income: self.rng.gen_range(50_000.0..350_000.0),
            inflation_rate: self.rng.gen_range(2.0..9.0),
            population_density: self.rng.gen_range(100.0..1200.0),
            gender_ratio: self.rng.gen_range(880.0..1090.0),
            literacy_rate: self.rng.gen_range(62.0..96.0),
            youth_population_percent: self.rng.gen_range(22.0..32.0),
            urbanization_rate: self.rng.gen_range(20.0..60.0),
            human_development_index: self.rng.gen_range(0.55..0.80),
            police_stations_per_district: self.rng.gen_range(10.0..45.0),
            conviction_rate: self.rng.gen_range(30.0..70.0),
            police_personnel_per_100k: self.rng.gen_range(100.0..260.0),
            alcohol_consumption_per_capita: self.rng.gen_range(1.0..9.0),
            timestamp: Utc::now(),
        }
    }

    /// Generate a request at the edges of the indicator ranges
    fn generate_extreme(&mut self) -> PredictionRequest {
        self.request_counter += 1;

        PredictionRequest {
            request_id: format!("req_{:012}", self.request_counter),
            state: self.random_choice(STATES).to_string(),
            crime_type: self.random_choice(CRIME_TYPES).to_string(),
            year: 2030,
            unemployment_rate: self.rng.gen_range(18.0..30.0), // High unemployment
            poverty_rate: self.rng.gen_range(40.0..60.0),      // High poverty
            per_capita_income: self.rng.gen_range(20_000.0..45_000.0), // Low income
            inflation_rate: self.rng.gen_range(10.0..18.0),
            population_density: self.rng.gen_range(5_000.0..12_000.0), // Dense urban
            gender_ratio: self.rng.gen_range(850.0..900.0),
            literacy_rate: self.rng.gen_range(45.0..60.0), // Low literacy
            youth_population_percent: self.rng.gen_range(32.0..40.0),
            urbanization_rate: self.rng.gen_range(75.0..95.0),
            human_development_index: self.rng.gen_range(0.40..0.52),
            police_stations_per_district: self.rng.gen_range(3.0..9.0), // Thin coverage
            conviction_rate: self.rng.gen_range(10.0..25.0),
            police_personnel_per_100k: self.rng.gen_range(50.0..90.0),
            alcohol_consumption_per_capita: self.rng.gen_range(10.0..16.0),
            timestamp: Utc::now(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("crime.prediction.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let extreme_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        extreme_rate = extreme_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            // Continue in dry-run mode
            return run_dry_mode(count, extreme_rate, delay_ms).await;
        }
    };

    // Generate and publish requests
    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} requests...", count);

    let mut typical_count = 0;
    let mut extreme_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(extreme_rate) {
            extreme_count += 1;
            generator.generate_extreme()
        } else {
            typical_count += 1;
            generator.generate_typical()
        };

        let payload = serde_json::to_vec(&request)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} typical, {} extreme)",
                i + 1,
                count,
                typical_count,
                extreme_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} requests ({} typical, {} extreme)",
        count, typical_count, extreme_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, extreme_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(extreme_rate) {
            generator.generate_extreme()
        } else {
            generator.generate_typical()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
