// End-to-end API tests against the in-memory backend
//
// Drives the full router in-process (no server, no database, fake messaging).
// Run with: cargo test -p outreach-control-plane --test api_test

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use outreach_control_plane::storage::StorageBackend;
use outreach_control_plane::{build_app, ServerConfig};
use outreach_core::{MessagingProvider, OutboundMessage, OutreachError, Result};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct FakeSms {
    fail_for: Vec<String>,
    sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl MessagingProvider for FakeSms {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        if self.fail_for.contains(&message.to) {
            return Err(OutreachError::provider("unreachable number"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(format!("SM{}", self.sent.lock().unwrap().len()))
    }
}

fn app_with(provider: Arc<FakeSms>) -> Router {
    build_app(
        StorageBackend::in_memory(),
        provider,
        &ServerConfig::default(),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn add_responder(app: &Router, name: &str, phone: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/admin/responders",
        Some(json!({"name": name, "phone": phone, "services": "shelter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], name);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_motion_event_is_logged_only() {
    let sms = Arc::new(FakeSms::default());
    let app = app_with(sms.clone());
    add_responder(&app, "Shelter A", "+15550001").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/event",
        Some(json!({"device_id": "D1", "event": "motion"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Event logged");
    assert!(body.get("notified").is_none());

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    assert_eq!(events[0]["status"], "new");
    assert_eq!(events[0]["device_id"], "D1");
    assert_eq!(events[0]["event_type"], "motion");
    assert!(sms.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_critical_event_notifies_single_responder() {
    let sms = Arc::new(FakeSms::default());
    let app = app_with(sms.clone());
    let shelter_id = add_responder(&app, "Shelter A", "+15550001").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/event",
        Some(json!({"device_id": "D1", "event_type": "possible_encampment"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Alert sent to 1 responders");
    let notified = body["notified"].as_array().unwrap();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0]["responder"], "Shelter A");
    assert_eq!(notified[0]["phone"], "+15550001");
    assert_eq!(notified[0]["sent"], true);

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    assert_eq!(events[0]["status"], "notified");
    assert_eq!(events[0]["matched_responders"], shelter_id.as_str());

    let sent = sms.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("D1"));
    assert!(sent[0].body.starts_with("ALERT"));
}

#[tokio::test]
async fn test_critical_event_without_responders_warns() {
    let app = app_with(Arc::new(FakeSms::default()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/event",
        Some(json!({"device_id": "D1", "event": "possible_encampment"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "warning");
    assert!(body["event_id"].is_string());

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    assert_eq!(events[0]["status"], "new");
    assert_eq!(events[0]["matched_responders"], "");
}

#[tokio::test]
async fn test_partial_failure_still_notified() {
    let sms = Arc::new(FakeSms {
        fail_for: vec!["+1000".to_string()],
        ..Default::default()
    });
    let app = app_with(sms);
    add_responder(&app, "A", "+1000").await;
    add_responder(&app, "B", "+2000").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/event",
        Some(json!({"event": "possible_encampment"})),
    )
    .await;

    let notified = body["notified"].as_array().unwrap();
    assert_eq!(notified[0]["sent"], false);
    assert!(notified[0]["error"].is_string());
    assert_eq!(notified[1]["sent"], true);

    let (_, stats) = send(&app, "GET", "/admin/stats", None).await;
    assert_eq!(stats["active_alerts"], 1);
    assert_eq!(stats["total_responders"], 2);
}

#[tokio::test]
async fn test_invalid_body_is_treated_as_empty() {
    let app = app_with(Arc::new(FakeSms::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/event")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    assert_eq!(events[0]["device_id"], "unknown");
    assert_eq!(events[0]["event_type"], "unknown");
}

#[tokio::test]
async fn test_clear_after_five_events() {
    let app = app_with(Arc::new(FakeSms::default()));
    for i in 0..5 {
        send(
            &app,
            "POST",
            "/api/event",
            Some(json!({"device_id": format!("D{}", i), "event": "motion"})),
        )
        .await;
    }

    let (status, body) = send(&app, "POST", "/admin/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["deleted"], 5);
    assert_eq!(body["message"], "Cleared 5 events");

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    assert_eq!(events, json!([]));
}

#[tokio::test]
async fn test_event_listing_is_bounded_and_recent_first() {
    let app = app_with(Arc::new(FakeSms::default()));
    for i in 0..55 {
        send(
            &app,
            "POST",
            "/api/event",
            Some(json!({"device_id": format!("D{}", i), "event": "motion"})),
        )
        .await;
    }

    let (_, events) = send(&app, "GET", "/admin/events", None).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 50);
    assert_eq!(events[0]["device_id"], "D54");
}

#[tokio::test]
async fn test_create_responder_requires_name() {
    let app = app_with(Arc::new(FakeSms::default()));

    let (status, body) = send(
        &app,
        "POST",
        "/admin/responders",
        Some(json!({"phone": "+1555"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");

    let (_, responders) = send(&app, "GET", "/admin/responders", None).await;
    assert_eq!(responders, json!([]));
}

#[tokio::test]
async fn test_list_responders_in_creation_order() {
    let app = app_with(Arc::new(FakeSms::default()));
    add_responder(&app, "First", "+1").await;
    add_responder(&app, "Second", "+2").await;

    let (status, responders) = send(&app, "GET", "/admin/responders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(responders[0]["name"], "First");
    assert_eq!(responders[1]["name"], "Second");
    assert_eq!(responders[0]["phone"], "+1");
    assert_eq!(responders[0]["services"], json!(["shelter"]));
}
