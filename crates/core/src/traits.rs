// Core traits for pluggable backends
//
// These traits allow the ingest pipeline to be used with different backends:
// - In-memory implementations for dev mode and testing
// - Database implementations for production
// - Real or fake messaging providers

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::event::{Event, NewEvent, Stats};
use crate::responder::{NewResponder, Responder};

// ============================================================================
// EventStore - For persisting sensor events
// ============================================================================

/// Trait for storing and retrieving events
///
/// Implementations must support concurrent callers.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event with status `new` and no matched responders
    async fn insert_event(&self, event: NewEvent) -> Result<Event>;

    /// Record the matched responders and set status to `notified`
    async fn mark_notified(&self, event_id: Uuid, responder_ids: &[Uuid]) -> Result<Event>;

    /// Fetch a single event
    async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>>;

    /// List events, most recent first
    async fn list_events(&self, limit: usize) -> Result<Vec<Event>>;

    /// Delete every event, returning how many were removed
    async fn clear_events(&self) -> Result<u64>;

    /// Aggregate counters
    async fn stats(&self) -> Result<Stats>;
}

// ============================================================================
// ResponderStore - For the responder directory
// ============================================================================

/// Trait for registering and listing responders
#[async_trait]
pub trait ResponderStore: Send + Sync {
    /// Register a responder
    async fn create_responder(&self, responder: NewResponder) -> Result<Responder>;

    /// List all responders in storage (creation) order
    async fn list_responders(&self) -> Result<Vec<Responder>>;
}

// ============================================================================
// ResponderMatcher - Strategy for choosing who to notify
// ============================================================================

/// Pure selection of responders for an event
///
/// Contract: the result is an ordered subset of `candidates`, bounded in size,
/// and deterministic for a fixed candidate order.
pub trait ResponderMatcher: Send + Sync {
    /// Strategy name, used in logs
    fn name(&self) -> &str;

    /// Select the responders to notify
    fn score_and_select(&self, event: &Event, candidates: &[Responder]) -> Vec<Responder>;
}

// ============================================================================
// MessagingProvider - Outbound alert delivery
// ============================================================================

/// A single outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub body: String,
}

/// Trait for sending alert messages to a single recipient
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Provider name, used in logs
    fn name(&self) -> &str;

    /// Whether credentials are present. Unconfigured providers are skipped, not errored.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send one message; the returned string is the provider's message id
    async fn send(&self, message: &OutboundMessage) -> Result<String>;
}

/// Messaging provider used when no credentials are configured
#[derive(Debug, Default, Clone)]
pub struct DisabledMessagingProvider;

#[async_trait]
impl MessagingProvider for DisabledMessagingProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, _message: &OutboundMessage) -> Result<String> {
        Err(crate::error::OutreachError::config(
            "messaging provider not configured",
        ))
    }
}
