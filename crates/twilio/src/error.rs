use outreach_core::OutreachError;
use thiserror::Error;

/// Errors from the Twilio Messages API
#[derive(Debug, Error)]
pub enum TwilioError {
    /// Request never reached Twilio or the connection failed
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// Twilio rejected the message
    #[error("Twilio API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response did not carry a message sid
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<TwilioError> for OutreachError {
    fn from(err: TwilioError) -> Self {
        OutreachError::provider(err.to_string())
    }
}
