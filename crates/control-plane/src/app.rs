// Router assembly
//
// Wires storage, messaging and the core ingest pipeline into the HTTP routes.
// Shared by the server binary and the in-process router tests.

use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, response::Html, routing::get, Json, Router};
use outreach_core::{
    EventIngestor, FirstNMatcher, MessagingProvider, ResponderMatcher, ServiceTagMatcher,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config::ServerConfig;
use crate::openapi::ApiDoc;
use crate::services::{EventService, ResponderService};
use crate::storage::StorageBackend;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

const INDEX_HTML: &str = "<h1>Outreach Backend</h1>\
<p>API available under /api and /admin endpoints. See /swagger-ui for documentation.</p>";

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Pick the matching strategy from configuration
pub fn build_matcher(config: &ServerConfig) -> Arc<dyn ResponderMatcher> {
    match &config.match_service_tag {
        Some(tag) => Arc::new(ServiceTagMatcher::new(
            tag.clone(),
            config.max_matched_responders,
        )),
        None => Arc::new(FirstNMatcher::new(config.max_matched_responders)),
    }
}

/// Build the full application router
pub fn build_app(
    storage: StorageBackend,
    provider: Arc<dyn MessagingProvider>,
    config: &ServerConfig,
) -> Router {
    let store = Arc::new(storage.clone());

    let ingestor = EventIngestor::new(store.clone(), store.clone(), provider)
        .with_matcher(build_matcher(config))
        .with_critical_event_type(config.critical_event_type.clone());

    let events_state = api::events::AppState::new(Arc::new(EventService::new(
        ingestor,
        store.clone(),
    )));
    let responders_state =
        api::responders::AppState::new(Arc::new(ResponderService::new(store)));
    let health_state = HealthState {
        storage: storage.kind(),
    };

    let api_routes = Router::new()
        .merge(api::events::routes(events_state))
        .merge(api::responders::routes(responders_state));

    // Health and index are never prefixed
    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, &config.api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = match cors_layer(&config.cors_allowed_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}

/// CORS layer for the configured origins, if any
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        return None;
    }
    tracing::info!(origins = ?origins, "CORS origins configured");

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
    )
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
