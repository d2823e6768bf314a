//! NATS message consumer for incoming prediction requests
//!
//! Requests arrive as JSON `PredictionRequest` payloads on the configured
//! request subject. A consumer can join a queue group so that several
//! pipeline instances share one subject without double-scoring a request.

use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving prediction requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: None,
        }
    }

    /// Join a queue group: NATS delivers each request to exactly one member
    /// of the group, load-balancing across pipeline instances.
    pub fn with_queue_group(mut self, group: &str) -> Self {
        self.queue_group = Some(group.to_string());
        self
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(self.subject.clone(), group.clone())
                    .await?
            }
            None => self.client.subscribe(self.subject.clone()).await?,
        };
        info!(
            subject = %self.subject,
            queue_group = self.queue_group.as_deref().unwrap_or("-"),
            "Subscribed to prediction request subject"
        );
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Queue group this consumer joins, if any
    pub fn queue_group(&self) -> Option<&str> {
        self.queue_group.as_deref()
    }
}
