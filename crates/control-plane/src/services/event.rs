// Event service: ingest plus admin reads and bulk clear

use outreach_core::{Event, EventIngestor, EventStore, IngestOutcome, Result, Stats};
use serde_json::Value;
use std::sync::Arc;

/// Maximum events returned by the admin listing
pub const EVENT_LIST_LIMIT: usize = 50;

pub struct EventService {
    ingestor: EventIngestor,
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(ingestor: EventIngestor, store: Arc<dyn EventStore>) -> Self {
        Self { ingestor, store }
    }

    /// Run the ingest pipeline for one request body
    pub async fn ingest(&self, body: &Value) -> Result<IngestOutcome> {
        self.ingestor.ingest(body).await
    }

    /// Most recent events first, bounded to `EVENT_LIST_LIMIT`
    pub async fn list_recent(&self) -> Result<Vec<Event>> {
        self.store.list_events(EVENT_LIST_LIMIT).await
    }

    pub async fn clear(&self) -> Result<u64> {
        let deleted = self.store.clear_events().await?;
        tracing::info!(deleted, "Cleared events");
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.store.stats().await
    }
}
