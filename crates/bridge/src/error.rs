// Error types for the device bridge

use thiserror::Error;

/// Serial port discovery and open failures
#[derive(Debug, Error)]
pub enum PortError {
    /// No serial ports are attached
    #[error("No serial ports found. Is the device connected?")]
    NoPortsFound,

    /// A named port could not be opened
    #[error("Port {port} unavailable: {reason}")]
    Unavailable { port: String, reason: String },

    /// The OS port list could not be read
    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(String),
}

impl PortError {
    pub fn unavailable(port: impl Into<String>, reason: impl ToString) -> Self {
        PortError::Unavailable {
            port: port.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures shipping a payload to the backend
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No HTTP response within the configured timeout
    #[error("Timed out posting to {url}")]
    Timeout { url: String },

    /// Backend unreachable
    #[error("Could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Any other request failure
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl DeliveryError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            DeliveryError::Timeout { url }
        } else if err.is_connect() {
            DeliveryError::Connect {
                url,
                reason: err.to_string(),
            }
        } else {
            DeliveryError::Request {
                url,
                reason: err.to_string(),
            }
        }
    }
}

/// Fatal bridge failures
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Port(#[from] PortError),

    /// The serial reader stopped producing lines
    #[error("Serial reader for {0} stopped")]
    ReaderClosed(String),
}
