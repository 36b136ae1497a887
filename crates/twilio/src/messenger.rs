// Twilio messenger
//
// One form-encoded POST per message to
// {api_base}/2010-04-01/Accounts/{sid}/Messages.json with HTTP basic auth.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use outreach_core::{MessagingProvider, OutboundMessage, Result};

use crate::error::TwilioError;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Upper bound on one Messages API call, connect through body
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build Twilio HTTP client, using defaults");
            Client::new()
        }
    }
}

/// Account credentials and sender number
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
}

impl TwilioCredentials {
    /// Read `TWILIO_SID`, `TWILIO_TOKEN` and `TWILIO_FROM`.
    ///
    /// Returns `None` if any of them is missing or empty.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            account_sid: var("TWILIO_SID")?,
            auth_token: var("TWILIO_TOKEN")?,
            from: var("TWILIO_FROM")?,
        })
    }
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// Twilio SMS provider
///
/// # Example
///
/// ```ignore
/// use outreach_twilio::TwilioMessenger;
///
/// let messenger = TwilioMessenger::from_env();
/// // or with a custom endpoint
/// let messenger = TwilioMessenger::with_base_url(credentials, "http://localhost:4010");
/// ```
#[derive(Clone)]
pub struct TwilioMessenger {
    client: Client,
    credentials: Option<TwilioCredentials>,
    api_base: String,
}

impl TwilioMessenger {
    /// Create a messenger with the given credentials
    pub fn new(credentials: TwilioCredentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_API_BASE)
    }

    /// Create a messenger from environment credentials.
    ///
    /// When credentials are incomplete the messenger reports itself as not
    /// configured and the dispatcher skips sending.
    pub fn from_env() -> Self {
        Self {
            client: http_client(DEFAULT_TIMEOUT),
            credentials: TwilioCredentials::from_env(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a messenger against a custom API base URL
    pub fn with_base_url(credentials: TwilioCredentials, api_base: impl Into<String>) -> Self {
        Self {
            client: http_client(DEFAULT_TIMEOUT),
            credentials: Some(credentials),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    /// Full URL of the Messages resource, if configured
    pub fn messages_url(&self) -> Option<String> {
        self.credentials
            .as_ref()
            .map(|c| self.url_for(&c.account_sid))
    }

    fn url_for(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, account_sid
        )
    }

    async fn send_sms(
        &self,
        credentials: &TwilioCredentials,
        message: &OutboundMessage,
    ) -> std::result::Result<String, TwilioError> {
        let url = self.url_for(&credentials.account_sid);

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", credentials.from.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(text);
            return Err(TwilioError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessageResponse = response
            .json()
            .await
            .map_err(|e| TwilioError::InvalidResponse(e.to_string()))?;

        body.sid
            .ok_or_else(|| TwilioError::InvalidResponse("missing sid".to_string()))
    }
}

#[async_trait]
impl MessagingProvider for TwilioMessenger {
    fn name(&self) -> &str {
        "twilio"
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            outreach_core::OutreachError::config("Twilio credentials not configured")
        })?;

        let sid = self.send_sms(credentials, message).await?;
        tracing::debug!(to = %message.to, sid = %sid, "SMS accepted by Twilio");
        Ok(sid)
    }
}

impl std::fmt::Debug for TwilioMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioMessenger")
            .field("api_base", &self.api_base)
            .field("configured", &self.credentials.is_some())
            .finish()
    }
}
