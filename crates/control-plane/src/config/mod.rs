// Server configuration
//
// Everything is read from the environment. A missing DATABASE_URL selects the
// in-memory dev mode backend.

use outreach_core::{CRITICAL_EVENT_TYPE, DEFAULT_MAX_RESPONDERS};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Configuration for the control plane server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL URL; `None` runs with in-memory storage
    pub database_url: Option<String>,
    /// HTTP listen address
    pub bind_addr: String,
    /// Prefix for API routes (e.g. "/v1"); empty for none
    pub api_prefix: String,
    /// Origins allowed for cross-origin requests
    pub cors_allowed_origins: Vec<String>,
    /// Event type that triggers responder outreach
    pub critical_event_type: String,
    /// Upper bound on responders notified per event
    pub max_matched_responders: usize,
    /// Prefer responders offering this service tag
    pub match_service_tag: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_prefix: String::new(),
            cors_allowed_origins: Vec::new(),
            critical_event_type: CRITICAL_EVENT_TYPE.to_string(),
            max_matched_responders: DEFAULT_MAX_RESPONDERS,
            match_service_tag: None,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `DATABASE_URL`: PostgreSQL URL (optional, dev mode when unset)
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:5000")
    /// - `API_PREFIX`: route prefix (default: none)
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origins (default: none)
    /// - `CRITICAL_EVENT_TYPE`: default "possible_encampment"
    /// - `MAX_MATCHED_RESPONDERS`: default 10
    /// - `MATCH_SERVICE_TAG`: prefer responders with this service (default: first N)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: non_empty_var("DATABASE_URL"),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            api_prefix: std::env::var("API_PREFIX").unwrap_or_default(),
            cors_allowed_origins: non_empty_var("CORS_ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_default(),
            critical_event_type: non_empty_var("CRITICAL_EVENT_TYPE")
                .unwrap_or(defaults.critical_event_type),
            max_matched_responders: non_empty_var("MAX_MATCHED_RESPONDERS")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_matched_responders),
            match_service_tag: non_empty_var("MATCH_SERVICE_TAG"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
