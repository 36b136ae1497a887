// Event domain types
//
// An Event is a persisted sensor reading. It is created exactly once on intake
// and updated at most once more when notification completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Event notification status.
/// - `new`: Event stored, no responders notified
/// - `notified`: Responders were matched and a notification attempt was made
/// - `error`: Notification could not be completed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Event stored, no responders notified.
    #[default]
    New,
    /// Responders matched and notification attempted.
    Notified,
    /// Notification could not be completed.
    Error,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::New => write!(f, "new"),
            EventStatus::Notified => write!(f, "notified"),
            EventStatus::Error => write!(f, "error"),
        }
    }
}

impl From<&str> for EventStatus {
    fn from(s: &str) -> Self {
        match s {
            "notified" => EventStatus::Notified,
            "error" => EventStatus::Error,
            _ => EventStatus::New,
        }
    }
}

/// A sensor event recorded by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    /// Unique identifier for the event.
    pub id: Uuid,
    /// Identifier of the reporting device.
    #[cfg_attr(feature = "openapi", schema(example = "ELEGOO_PROTO_01"))]
    pub device_id: String,
    /// Kind of event reported by the device.
    #[cfg_attr(feature = "openapi", schema(example = "possible_encampment"))]
    pub event_type: String,
    /// Full JSON text of the ingested payload.
    pub raw_payload: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Responders notified for this event, in match order.
    #[serde(default)]
    pub matched_responders: Vec<Uuid>,
    /// Current notification status.
    pub status: EventStatus,
}

impl Event {
    /// True when the event satisfies `status = notified => matched_responders non-empty`.
    pub fn is_consistent(&self) -> bool {
        self.status != EventStatus::Notified || !self.matched_responders.is_empty()
    }
}

/// Input for persisting a new event. Status always starts as `new`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub device_id: String,
    pub event_type: String,
    pub raw_payload: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters exposed by the admin stats endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Stats {
    /// Total number of stored events.
    pub total_events: u64,
    /// Total number of registered responders.
    pub total_responders: u64,
    /// Number of events with status `notified`.
    pub active_alerts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [EventStatus::New, EventStatus::Notified, EventStatus::Error] {
            assert_eq!(EventStatus::from(status.to_string().as_str()), status);
        }
        assert_eq!(EventStatus::from("garbage"), EventStatus::New);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(EventStatus::Notified).unwrap();
        assert_eq!(json, "notified");
    }

    #[test]
    fn test_notified_without_responders_is_inconsistent() {
        let mut event = Event {
            id: Uuid::now_v7(),
            device_id: "D1".to_string(),
            event_type: "possible_encampment".to_string(),
            raw_payload: "{}".to_string(),
            created_at: Utc::now(),
            matched_responders: vec![],
            status: EventStatus::New,
        };
        assert!(event.is_consistent());

        event.status = EventStatus::Notified;
        assert!(!event.is_consistent());

        event.matched_responders.push(Uuid::now_v7());
        assert!(event.is_consistent());
    }
}
