// OpenAPI specification generation
//
// Served by the control plane at /api-doc/openapi.json with Swagger UI.

use crate::api;
use crate::api::ErrorResponse;
use outreach_core::{EventStatus, IngestOutcome, IngestStatus, NotificationResult, Stats};
use utoipa::OpenApi;

/// OpenAPI documentation for the outreach API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::events::ingest_event,
        api::events::list_events,
        api::events::clear_events,
        api::events::get_stats,
        api::responders::create_responder,
        api::responders::list_responders,
    ),
    components(
        schemas(
            IngestOutcome, IngestStatus, NotificationResult, EventStatus, Stats,
            api::events::SensorEventRequest,
            api::events::EventSummary,
            api::events::ClearResponse,
            api::responders::CreateResponderRequest,
            api::responders::CreatedResponder,
            api::responders::ResponderSummary,
            api::responders::ServicesField,
            api::common::StatusResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "events", description = "Sensor event intake"),
        (name = "admin", description = "Responder directory, event log and counters")
    ),
    info(
        title = "Outreach API",
        description = "Sensor event intake and responder notification",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Render the OpenAPI document as pretty-printed JSON
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
