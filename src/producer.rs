//! NATS message producer for prediction outcomes

use crate::types::prediction::PredictionOutcome;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing prediction outcomes to NATS
#[derive(Clone)]
pub struct ResultProducer {
    client: Client,
    subject: String,
}

impl ResultProducer {
    /// Create a new result producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a prediction outcome
    pub async fn publish(&self, outcome: &PredictionOutcome) -> Result<()> {
        let payload = serde_json::to_vec(outcome)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            outcome_id = %outcome.outcome_id,
            request_id = %outcome.request_id,
            point_estimate = outcome.prediction.point_estimate,
            "Published prediction outcome"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
