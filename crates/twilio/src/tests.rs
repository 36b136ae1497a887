// Unit tests for the Twilio provider

use crate::{TwilioCredentials, TwilioMessenger};
use outreach_core::{MessagingProvider, OutboundMessage, OutreachError};
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> TwilioCredentials {
    TwilioCredentials {
        account_sid: "AC123".to_string(),
        auth_token: "secret".to_string(),
        from: "+15550000".to_string(),
    }
}

fn message() -> OutboundMessage {
    OutboundMessage {
        to: "+15551234".to_string(),
        body: "ALERT: Person needs assistance at D1.".to_string(),
    }
}

#[test]
fn test_messages_url() {
    let messenger = TwilioMessenger::with_base_url(credentials(), "https://example.com/");
    assert_eq!(
        messenger.messages_url().as_deref(),
        Some("https://example.com/2010-04-01/Accounts/AC123/Messages.json")
    );
}

#[test]
fn test_debug_redacts_token() {
    let debug = format!("{:?}", credentials());
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("secret"));
}

#[tokio::test]
async fn test_send_returns_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(basic_auth("AC123", "secret"))
        .and(body_string_contains("To=%2B15551234"))
        .and(body_string_contains("From=%2B15550000"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"sid": "SM42", "status": "queued"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let messenger = TwilioMessenger::with_base_url(credentials(), server.uri());
    assert!(messenger.is_configured());
    let sid = messenger.send(&message()).await.unwrap();
    assert_eq!(sid, "SM42");
}

#[tokio::test]
async fn test_api_error_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
        })))
        .mount(&server)
        .await;

    let messenger = TwilioMessenger::with_base_url(credentials(), server.uri());
    let err = messenger.send(&message()).await.unwrap_err();
    match err {
        OutreachError::ProviderSend(msg) => {
            assert!(msg.contains("400"));
            assert!(msg.contains("not a valid phone number"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_sid_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let messenger = TwilioMessenger::with_base_url(credentials(), server.uri());
    assert!(messenger.send(&message()).await.is_err());
}

#[tokio::test]
async fn test_slow_api_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"sid": "SM42"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let messenger = TwilioMessenger::with_base_url(credentials(), server.uri())
        .with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let err = messenger.send(&message()).await.unwrap_err();
    assert!(matches!(err, OutreachError::ProviderSend(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}
