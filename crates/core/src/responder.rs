// Responder domain types
//
// Responders are the organizations contacted when a critical event arrives.
// They are created through the admin API and are read-only input to matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Geographic position of a responder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A responder organization that can be notified about events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Responder {
    /// Unique identifier for the responder.
    pub id: Uuid,
    /// Display name.
    #[cfg_attr(feature = "openapi", schema(example = "Shelter A"))]
    pub name: String,
    /// Phone number used for SMS notifications (E.164).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(example = "+15551234567"))]
    pub phone: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Location, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Service tags offered by the responder (e.g. "shelter", "medical").
    #[serde(default)]
    pub services: Vec<String>,
    /// Timestamp when the responder was registered.
    pub created_at: DateTime<Utc>,
}

impl Responder {
    /// True if the responder lists the given service tag (case-insensitive).
    pub fn offers(&self, service: &str) -> bool {
        self.services
            .iter()
            .any(|s| s.eq_ignore_ascii_case(service))
    }
}

/// Input for registering a responder.
#[derive(Debug, Clone, Default)]
pub struct NewResponder {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<GeoPoint>,
    pub services: Vec<String>,
}

/// Split a comma-separated service list into trimmed, non-empty tags.
pub fn parse_services(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
