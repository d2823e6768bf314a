//! Crime Prediction Pipeline - Main Entry Point
//!
//! Consumes prediction requests from NATS, runs the hybrid three-model
//! inference, and publishes outcomes for the display layer. Supports
//! parallel request processing.

use anyhow::Result;
use crime_prediction_pipeline::{
    config::AppConfig,
    consumer::RequestConsumer,
    dataset::CrimeDataset,
    metrics::{MetricsReporter, PipelineMetrics},
    models::inference::PredictionEngine,
    producer::ResultProducer,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("crime_prediction_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Crime Prediction Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Load the dashboard dataset and log the home-view insights
    let dataset = CrimeDataset::from_path(&config.dataset.path)?;
    let insights = dataset.quick_insights();
    info!(
        records = insights.total_records,
        states = insights.total_states,
        crime_categories = insights.crime_categories,
        "Dataset ready"
    );
    if let Some(top) = dataset.top_states(1).first() {
        info!(
            state = %top.state,
            cases = top.cases,
            "Highest-case state in the dataset"
        );
    }

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Build the prediction engine: encoder, three hybrid members, weights
    let engine = Arc::new(PredictionEngine::from_config(&config)?);
    info!(
        feature_width = engine.feature_width(),
        models = ?engine.model_names(),
        "Prediction engine ready"
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let mut consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    if let Some(group) = &config.nats.queue_group {
        consumer = consumer.with_queue_group(group);
    }
    let producer = Arc::new(ResultProducer::new(client.clone(), &config.nats.result_subject));

    // Parallel processing configuration
    let num_workers = config.pipeline.workers;
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing outcomes to: {}", config.nats.result_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process requests in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await?;

        // Clone shared resources for the spawned task
        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        // Spawn task to process this request
        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<crime_prediction_pipeline::PredictionRequest>(
                &message.payload,
            ) {
                Ok(request) => {
                    let request_id = request.request_id.clone();

                    match engine.predict(&request) {
                        Ok(prediction) => {
                            let processing_time = start_time.elapsed();

                            // Record metrics
                            metrics.record_request(processing_time, prediction.point_estimate);
                            metrics.record_model_agreement(&prediction.model_estimates);

                            let outcome = prediction.to_outcome(&request, engine.weights());

                            if let Err(e) = producer.publish(&outcome).await {
                                error!(
                                    request_id = %request_id,
                                    error = %e,
                                    "Failed to publish prediction outcome"
                                );
                            } else {
                                metrics.record_outcome();
                                debug!(
                                    request_id = %request_id,
                                    state = %outcome.state,
                                    crime_type = %outcome.crime_type,
                                    point_estimate = prediction.point_estimate,
                                    lower = prediction.lower_bound,
                                    upper = prediction.upper_bound,
                                    processing_time_us = processing_time.as_micros(),
                                    "Prediction outcome published"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 requests
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} req/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            // No partial result goes on the wire
                            error!(
                                request_id = %request_id,
                                error = %e,
                                "Prediction failed"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize prediction request");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
