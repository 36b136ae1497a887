// Error types for the outreach pipeline

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for outreach operations
pub type Result<T> = std::result::Result<T, OutreachError>;

/// Errors that can occur while ingesting events or notifying responders
#[derive(Debug, Error)]
pub enum OutreachError {
    /// Event or responder store error
    #[error("Store error: {0}")]
    Store(String),

    /// Messaging provider failed to send to a single recipient
    #[error("Provider send error: {0}")]
    ProviderSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    /// Request payload failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OutreachError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        OutreachError::Store(msg.into())
    }

    /// Create a provider send error
    pub fn provider(msg: impl Into<String>) -> Self {
        OutreachError::ProviderSend(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        OutreachError::Configuration(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        OutreachError::Validation(msg.into())
    }
}
