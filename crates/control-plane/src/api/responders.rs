// Responder admin HTTP routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use outreach_core::{parse_services, OutreachError, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::ErrorResponse;
use crate::services::ResponderService;

/// Service tags, either as a list or a comma-separated string
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ServicesField {
    List(Vec<String>),
    Text(String),
}

impl ServicesField {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            ServicesField::List(tags) => tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            ServicesField::Text(text) => parse_services(&text),
        }
    }
}

/// Request to register a responder
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateResponderRequest {
    /// Display name. Required.
    #[schema(example = "Shelter A")]
    pub name: Option<String>,
    /// Phone number for SMS alerts.
    #[schema(example = "+15551234567")]
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Offered services.
    #[schema(example = "shelter,food")]
    pub services: Option<ServicesField>,
    /// Latitude; recorded only together with `lon`.
    pub lat: Option<f64>,
    /// Longitude; recorded only together with `lat`.
    pub lon: Option<f64>,
}

/// Response for a newly created responder
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponder {
    pub id: Uuid,
    pub name: String,
}

/// Responder as exposed by the admin listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponderSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub services: Vec<String>,
}

impl From<Responder> for ResponderSummary {
    fn from(r: Responder) -> Self {
        Self {
            id: r.id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            services: r.services,
        }
    }
}

/// App state for responder routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResponderService>,
}

impl AppState {
    pub fn new(service: Arc<ResponderService>) -> Self {
        Self { service }
    }
}

/// Create responder routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/admin/responders",
            get(list_responders).post(create_responder),
        )
        .with_state(state)
}

/// POST /admin/responders - Register a responder
#[utoipa::path(
    post,
    path = "/admin/responders",
    request_body = CreateResponderRequest,
    responses(
        (status = 201, description = "Responder created", body = CreatedResponder),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_responder(
    State(state): State<AppState>,
    payload: Result<Json<CreateResponderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponder>), (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(|e| {
        ErrorResponse::new(format!("Invalid request body: {}", e.body_text()))
            .into_response(StatusCode::BAD_REQUEST)
    })?;

    let responder = state.service.create(req).await.map_err(|e| match e {
        OutreachError::Validation(msg) => {
            ErrorResponse::new(msg).into_response(StatusCode::BAD_REQUEST)
        }
        other => {
            tracing::error!("Failed to create responder: {}", other);
            ErrorResponse::new(other.to_string()).into_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponder {
            id: responder.id,
            name: responder.name,
        }),
    ))
}

/// GET /admin/responders - List responders
#[utoipa::path(
    get,
    path = "/admin/responders",
    responses(
        (status = 200, description = "Responders in creation order", body = Vec<ResponderSummary>),
        (status = 500, description = "Internal server error")
    ),
    tag = "admin"
)]
pub async fn list_responders(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResponderSummary>>, StatusCode> {
    let responders = state.service.list().await.map_err(|e| {
        tracing::error!("Failed to list responders: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(
        responders.into_iter().map(ResponderSummary::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_accepts_string_or_list() {
        let text: ServicesField = serde_json::from_str(r#""shelter, medical""#).unwrap();
        assert_eq!(text.into_tags(), vec!["shelter", "medical"]);

        let list: ServicesField = serde_json::from_str(r#"["food", " "]"#).unwrap();
        assert_eq!(list.into_tags(), vec!["food"]);
    }
}
