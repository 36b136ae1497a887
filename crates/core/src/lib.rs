// Outreach core
//
// This crate provides a DB-agnostic implementation of the sensor event pipeline:
// intake -> decision -> responder matching -> notification fan-out.
//
// Key design decisions:
// - Uses traits (EventStore, ResponderStore, MessagingProvider) for pluggable backends
// - Matching is a ResponderMatcher strategy so policies can change without touching ingest
// - Notification sends are independent: one failed recipient never aborts the others
// - Domain entity types (Event, Responder, SensorPayload) are shared by control plane and bridge

// Domain entity types
pub mod event;
pub mod payload;
pub mod responder;

pub mod error;
pub mod ingest;
pub mod matcher;
pub mod notification;
pub mod traits;

// In-memory implementations for dev mode and testing
pub mod memory;

// Logging setup shared by binaries
pub mod telemetry;

// Re-exports for convenience
pub use error::{OutreachError, Result};
pub use event::{Event, EventStatus, NewEvent, Stats};
pub use ingest::{EventIngestor, IngestOutcome, IngestStatus};
pub use matcher::{FirstNMatcher, ServiceTagMatcher, DEFAULT_MAX_RESPONDERS};
pub use memory::InMemoryStore;
pub use notification::{
    AlertTemplate, NotificationDispatcher, NotificationResult, CRITICAL_EVENT_TYPE,
};
pub use payload::SensorPayload;
pub use responder::{parse_services, GeoPoint, NewResponder, Responder};
pub use traits::{
    DisabledMessagingProvider, EventStore, MessagingProvider, OutboundMessage, ResponderMatcher,
    ResponderStore,
};
