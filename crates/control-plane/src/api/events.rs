// Event ingest and admin HTTP routes
//
// POST /api/event is the device-facing intake. The admin routes list recent
// events, clear the log and report counters.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use outreach_core::{Event, EventStatus, IngestOutcome, IngestStatus, Stats};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::StatusResponse;
use crate::services::EventService;

/// Sensor event sent by the device bridge (for documentation only).
/// Any additional fields are stored verbatim in the raw payload.
#[allow(dead_code)]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SensorEventRequest {
    /// Reporting device. Defaults to "unknown".
    #[schema(example = "ELEGOO_PROTO_01")]
    pub device_id: Option<String>,
    /// Event kind. Checked before `event_type`.
    #[schema(example = "possible_encampment")]
    pub event: Option<String>,
    /// Alternative field for the event kind.
    pub event_type: Option<String>,
    /// Device clock in milliseconds.
    pub timestamp_ms: Option<i64>,
}

/// Event as exposed by the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    pub device_id: String,
    pub event_type: String,
    /// ISO-8601 server timestamp.
    pub created_at: DateTime<Utc>,
    pub status: EventStatus,
    /// Comma-separated ids of the responders notified, in match order.
    /// Empty while the event is unmatched.
    #[schema(example = "0190a1b2-0000-7000-8000-000000000001,0190a1b2-0000-7000-8000-000000000002")]
    pub matched_responders: String,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            device_id: event.device_id,
            event_type: event.event_type,
            created_at: event.created_at,
            status: event.status,
            matched_responders: event
                .matched_responders
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Result of a bulk clear.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Number of events deleted.
    pub deleted: u64,
    #[schema(example = "Cleared 5 events")]
    pub message: String,
}

// ============================================
// App State and Routes
// ============================================

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

impl AppState {
    pub fn new(service: Arc<EventService>) -> Self {
        Self { service }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/event", post(ingest_event))
        .route("/admin/events", get(list_events))
        .route("/admin/clear", post(clear_events))
        .route("/admin/stats", get(get_stats))
        .with_state(state)
}

// ============================================
// HTTP Handlers
// ============================================

/// POST /api/event - Ingest a sensor event
#[utoipa::path(
    post,
    path = "/api/event",
    request_body = SensorEventRequest,
    responses(
        (status = 200, description = "Event stored (status ok or warning)", body = IngestOutcome),
        (status = 500, description = "Event could not be processed", body = IngestOutcome)
    ),
    tag = "events"
)]
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<IngestOutcome>) {
    let body = parse_lenient(&body);

    match state.service.ingest(&body).await {
        Ok(outcome) => {
            let status = match outcome.status {
                IngestStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
                IngestStatus::Ok | IngestStatus::Warning => StatusCode::OK,
            };
            (status, Json(outcome))
        }
        Err(e) => {
            tracing::error!("Failed to store event: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IngestOutcome::failed(format!("Failed to store event: {}", e))),
            )
        }
    }
}

/// Invalid JSON or a non-object body is treated as an empty object
fn parse_lenient(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

/// GET /admin/events - List recent events
#[utoipa::path(
    get,
    path = "/admin/events",
    responses(
        (status = 200, description = "Up to 50 events, most recent first", body = Vec<EventSummary>),
        (status = 500, description = "Internal server error")
    ),
    tag = "admin"
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventSummary>>, StatusCode> {
    let events = state.service.list_recent().await.map_err(|e| {
        tracing::error!("Failed to list events: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(events.into_iter().map(EventSummary::from).collect()))
}

/// POST /admin/clear - Delete every event
#[utoipa::path(
    post,
    path = "/admin/clear",
    responses(
        (status = 200, description = "Events cleared", body = ClearResponse),
        (status = 500, description = "Clear failed", body = StatusResponse)
    ),
    tag = "admin"
)]
pub async fn clear_events(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, (StatusCode, Json<StatusResponse>)> {
    match state.service.clear().await {
        Ok(deleted) => Ok(Json(ClearResponse {
            status: "ok".to_string(),
            deleted,
            message: format!("Cleared {} events", deleted),
        })),
        Err(e) => {
            tracing::error!("Failed to clear events: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            ))
        }
    }
}

/// GET /admin/stats - System counters
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Counters", body = Stats),
        (status = 500, description = "Internal server error")
    ),
    tag = "admin"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, StatusCode> {
    let stats = state.service.stats().await.map_err(|e| {
        tracing::error!("Failed to load stats: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(stats))
}
