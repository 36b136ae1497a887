// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use outreach_core::{Event, EventStatus, GeoPoint, Responder};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Events
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub device_id: String,
    pub event_type: String,
    pub raw_payload: String,
    pub created_at: DateTime<Utc>,
    pub matched_responders: Vec<Uuid>,
    pub status: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            device_id: row.device_id,
            event_type: row.event_type,
            raw_payload: row.raw_payload,
            created_at: row.created_at,
            matched_responders: row.matched_responders,
            status: EventStatus::from(row.status.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub id: Uuid,
    pub device_id: String,
    pub event_type: String,
    pub raw_payload: String,
}

// ============================================
// Responders
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ResponderRow {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub services: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ResponderRow> for Responder {
    fn from(row: ResponderRow) -> Self {
        let location = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        };
        Responder {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            location,
            services: row.services,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateResponderRow {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub services: Vec<String>,
}

// ============================================
// Stats
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct StatsRow {
    pub total_events: i64,
    pub total_responders: i64,
    pub active_alerts: i64,
}
