// Notification dispatch
//
// Builds one alert message per matched responder and sends it through the
// configured MessagingProvider. Sends run concurrently and fail independently:
// a provider error for one responder never blocks the others, and dispatch
// itself never fails.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::event::Event;
use crate::responder::Responder;
use crate::traits::{MessagingProvider, OutboundMessage};

/// Event type that triggers responder outreach
pub const CRITICAL_EVENT_TYPE: &str = "possible_encampment";

/// Message urgency, selected purely from the event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTemplate {
    /// Someone needs assistance; asks for a response
    Critical,
    /// Informational motion notice
    Informational,
}

impl AlertTemplate {
    /// Pick the template for an event type
    pub fn for_event_type(event_type: &str, critical_event_type: &str) -> Self {
        if event_type == critical_event_type {
            AlertTemplate::Critical
        } else {
            AlertTemplate::Informational
        }
    }

    /// Render the message body for a device location
    pub fn render(&self, device_id: &str) -> String {
        match self {
            AlertTemplate::Critical => format!(
                "ALERT: Person needs assistance at {}. They have been present for 3+ minutes. Please respond.",
                device_id
            ),
            AlertTemplate::Informational => format!(
                "NOTIFICATION: Motion detected at {}. Monitoring situation.",
                device_id
            ),
        }
    }
}

/// Outcome of one notification attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NotificationResult {
    /// Responder that was contacted.
    pub responder_id: Uuid,
    /// Responder display name.
    pub responder: String,
    /// Phone number the message was addressed to.
    pub phone: Option<String>,
    /// Message body.
    pub message: String,
    /// True only if the provider accepted the message.
    pub sent: bool,
    /// Provider message id on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    /// Why the message was not sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fans alert messages out to responders
#[derive(Clone)]
pub struct NotificationDispatcher {
    provider: Arc<dyn MessagingProvider>,
    critical_event_type: String,
}

impl NotificationDispatcher {
    pub fn new(provider: Arc<dyn MessagingProvider>) -> Self {
        Self {
            provider,
            critical_event_type: CRITICAL_EVENT_TYPE.to_string(),
        }
    }

    /// Override which event type uses the critical template
    pub fn with_critical_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.critical_event_type = event_type.into();
        self
    }

    /// Send one message per responder and report each outcome, in input order.
    pub async fn dispatch(&self, event: &Event, responders: &[Responder]) -> Vec<NotificationResult> {
        let template = AlertTemplate::for_event_type(&event.event_type, &self.critical_event_type);
        let body = template.render(&event.device_id);

        let sends = responders
            .iter()
            .map(|responder| self.notify_one(event.id, responder, body.clone()));

        join_all(sends).await
    }

    async fn notify_one(&self, event_id: Uuid, responder: &Responder, body: String) -> NotificationResult {
        let mut result = NotificationResult {
            responder_id: responder.id,
            responder: responder.name.clone(),
            phone: responder.phone.clone(),
            message: body,
            sent: false,
            provider_message_id: None,
            error: None,
        };

        tracing::info!(
            event_id = %event_id,
            responder_id = %responder.id,
            responder = %responder.name,
            "Notifying responder"
        );

        if !self.provider.is_configured() {
            tracing::debug!(
                responder_id = %responder.id,
                provider = self.provider.name(),
                "Messaging provider not configured, skipping send"
            );
            result.error = Some("messaging provider not configured".to_string());
            return result;
        }

        let Some(phone) = responder.phone.as_deref().filter(|p| !p.trim().is_empty()) else {
            tracing::warn!(responder_id = %responder.id, "Responder has no phone number, skipping send");
            result.error = Some("responder has no phone number".to_string());
            return result;
        };

        let message = OutboundMessage {
            to: phone.to_string(),
            body: result.message.clone(),
        };

        match self.provider.send(&message).await {
            Ok(message_id) => {
                tracing::info!(
                    responder_id = %responder.id,
                    provider = self.provider.name(),
                    message_id = %message_id,
                    "Alert sent"
                );
                result.sent = true;
                result.provider_message_id = Some(message_id);
            }
            Err(e) => {
                tracing::warn!(
                    responder_id = %responder.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Failed to send alert"
                );
                result.error = Some(e.to_string());
            }
        }

        result
    }
}
