// Event ingest orchestration
//
// persist -> decide -> match -> dispatch -> update
//
// The sequence is not transactional: if the process dies between dispatch and the
// status update, the event stays `new` even though responders may have been
// contacted. Every failure after the insert is reported through the outcome
// status; the stored event is never removed or duplicated.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::Result;
use crate::event::{EventStatus, NewEvent};
use crate::matcher::FirstNMatcher;
use crate::notification::{NotificationDispatcher, NotificationResult, CRITICAL_EVENT_TYPE};
use crate::traits::{EventStore, MessagingProvider, ResponderMatcher, ResponderStore};

const UNKNOWN: &str = "unknown";

/// Overall result status reported to the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Ok,
    Warning,
    Error,
}

/// Result of ingesting one event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct IngestOutcome {
    /// `ok`, `warning` or `error`.
    pub status: IngestStatus,
    /// Id of the stored event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    /// Human-readable summary.
    pub message: String,
    /// Stored event status after ingest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_status: Option<EventStatus>,
    /// One entry per matched responder, present when notifications were attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified: Option<Vec<NotificationResult>>,
}

impl IngestOutcome {
    /// Outcome for a request that failed before an event was stored
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Error,
            event_id: None,
            message: message.into(),
            event_status: None,
            notified: None,
        }
    }
}

/// Orchestrates intake of one sensor event
#[derive(Clone)]
pub struct EventIngestor {
    events: Arc<dyn EventStore>,
    responders: Arc<dyn ResponderStore>,
    matcher: Arc<dyn ResponderMatcher>,
    dispatcher: NotificationDispatcher,
    critical_event_type: String,
}

impl EventIngestor {
    /// Create an ingestor with the default first-N matcher
    pub fn new(
        events: Arc<dyn EventStore>,
        responders: Arc<dyn ResponderStore>,
        provider: Arc<dyn MessagingProvider>,
    ) -> Self {
        Self {
            events,
            responders,
            matcher: Arc::new(FirstNMatcher::default()),
            dispatcher: NotificationDispatcher::new(provider),
            critical_event_type: CRITICAL_EVENT_TYPE.to_string(),
        }
    }

    /// Swap the matching strategy
    pub fn with_matcher(mut self, matcher: Arc<dyn ResponderMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Change which event type triggers outreach
    pub fn with_critical_event_type(mut self, event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        self.dispatcher = self.dispatcher.with_critical_event_type(event_type.clone());
        self.critical_event_type = event_type;
        self
    }

    /// Ingest a raw request body.
    ///
    /// Returns `Err` only when the event could not be stored at all.
    pub async fn ingest(&self, body: &Value) -> Result<IngestOutcome> {
        let device_id = extract_device_id(body);
        let event_type = extract_event_type(body);

        let span = tracing::info_span!(
            "ingest_event",
            device_id = %device_id,
            event_type = %event_type,
            event_id = tracing::field::Empty,
        );

        self.ingest_inner(body, device_id, event_type)
            .instrument(span)
            .await
    }

    async fn ingest_inner(&self, body: &Value, device_id: String, event_type: String) -> Result<IngestOutcome> {
        tracing::info!("Received event");

        let raw_payload = serde_json::to_string(body).map_err(anyhow::Error::from)?;
        let event = self
            .events
            .insert_event(NewEvent {
                device_id,
                event_type,
                raw_payload,
                created_at: Utc::now(),
            })
            .await?;
        tracing::Span::current().record("event_id", event.id.to_string().as_str());

        if event.event_type != self.critical_event_type {
            tracing::info!("Event logged (no notification needed)");
            return Ok(IngestOutcome {
                status: IngestStatus::Ok,
                event_id: Some(event.id),
                message: "Event logged".to_string(),
                event_status: Some(event.status),
                notified: None,
            });
        }

        tracing::info!("Critical alert detected, matching responders");

        let candidates = match self.responders.list_responders().await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load responders");
                return Ok(IngestOutcome {
                    status: IngestStatus::Error,
                    event_id: Some(event.id),
                    message: format!("Event saved but responders could not be loaded: {}", e),
                    event_status: Some(event.status),
                    notified: None,
                });
            }
        };

        let matched = self.matcher.score_and_select(&event, &candidates);
        tracing::info!(
            matcher = self.matcher.name(),
            candidates = candidates.len(),
            matched = matched.len(),
            "Matched responders"
        );

        if matched.is_empty() {
            tracing::warn!("No responders available to notify");
            return Ok(IngestOutcome {
                status: IngestStatus::Warning,
                event_id: Some(event.id),
                message: "Event saved but no responders registered".to_string(),
                event_status: Some(event.status),
                notified: None,
            });
        }

        let notified = self.dispatcher.dispatch(&event, &matched).await;
        let responder_ids: Vec<Uuid> = matched.iter().map(|r| r.id).collect();

        match self.events.mark_notified(event.id, &responder_ids).await {
            Ok(updated) => {
                tracing::info!(
                    notified = responder_ids.len(),
                    sent = notified.iter().filter(|n| n.sent).count(),
                    "Responders notified"
                );
                Ok(IngestOutcome {
                    status: IngestStatus::Ok,
                    event_id: Some(updated.id),
                    message: format!("Alert sent to {} responders", responder_ids.len()),
                    event_status: Some(updated.status),
                    notified: Some(notified),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to record notification on event");
                Ok(IngestOutcome {
                    status: IngestStatus::Error,
                    event_id: Some(event.id),
                    message: format!(
                        "Alert sent to {} responders but event status could not be updated: {}",
                        responder_ids.len(),
                        e
                    ),
                    event_status: Some(EventStatus::New),
                    notified: Some(notified),
                })
            }
        }
    }
}

/// `device_id` from the body, `"unknown"` when missing
pub fn extract_device_id(body: &Value) -> String {
    body.get("device_id")
        .and_then(non_empty_text)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `event`, then `event_type`, then `"unknown"`
pub fn extract_event_type(body: &Value) -> String {
    body.get("event")
        .and_then(non_empty_text)
        .or_else(|| body.get("event_type").and_then(non_empty_text))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_defaults() {
        let body = json!({});
        assert_eq!(extract_device_id(&body), "unknown");
        assert_eq!(extract_event_type(&body), "unknown");
    }

    #[test]
    fn test_event_field_takes_precedence() {
        let body = json!({"event": "motion", "event_type": "possible_encampment"});
        assert_eq!(extract_event_type(&body), "motion");
    }

    #[test]
    fn test_empty_event_falls_through_to_event_type() {
        let body = json!({"event": "", "event_type": "possible_encampment"});
        assert_eq!(extract_event_type(&body), "possible_encampment");
    }

    #[test]
    fn test_non_string_device_id_is_kept() {
        let body = json!({"device_id": 42});
        assert_eq!(extract_device_id(&body), "42");
    }

    #[test]
    fn test_outcome_serialization_omits_empty_fields() {
        let outcome = IngestOutcome::failed("boom");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({"status": "error", "message": "boom"}));
    }
}
