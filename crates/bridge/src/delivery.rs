// Delivery of device payloads to the control plane
//
// One POST per payload with a fixed timeout. Failures are returned to the
// caller and never retried.

use async_trait::async_trait;
use outreach_core::SensorPayload;
use reqwest::Client;
use std::time::Duration;

use crate::error::DeliveryError;

/// HTTP-level result of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// True when the backend answered with a 2xx status
    pub delivered: bool,
    pub http_status: u16,
}

/// Destination for forwarded payloads
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, payload: &SensorPayload) -> Result<DeliveryOutcome, DeliveryError>;
}

/// Posts payloads to the control plane ingest endpoint
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl DeliveryClient {
    /// Create a client for `url` with the given request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl EventSink for DeliveryClient {
    async fn deliver(&self, payload: &SensorPayload) -> Result<DeliveryOutcome, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload.to_json())
            .send()
            .await
            .map_err(|e| DeliveryError::from_reqwest(&self.url, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            tracing::info!(status = status.as_u16(), response = %body.trim(), "Delivered event");
        } else {
            tracing::warn!(status = status.as_u16(), response = %body.trim(), "Backend rejected event");
        }

        Ok(DeliveryOutcome {
            delivered: status.is_success(),
            http_status: status.as_u16(),
        })
    }
}
