// Outreach API server
// Decision: DATABASE_URL selects PostgreSQL; without it the server runs in dev mode with in-memory storage
// Decision: Missing Twilio credentials keep the server running with notifications skipped

use anyhow::{Context, Result};
use outreach_control_plane::storage::StorageBackend;
use outreach_control_plane::{build_app, ServerConfig};
use outreach_core::telemetry::{init_telemetry, TelemetryConfig};
use outreach_core::MessagingProvider;
use outreach_twilio::TwilioMessenger;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - RUST_LOG / LOG_LEVEL: Log filter (default: "outreach_control_plane=debug,outreach_core=debug,tower_http=debug")
    // - LOG_FORMAT: "json" or "pretty"
    init_telemetry(
        TelemetryConfig::from_env()
            .with_default_service_name("outreach-control-plane")
            .with_default_filter(
                "outreach_control_plane=debug,outreach_core=debug,outreach_twilio=debug,tower_http=debug",
            ),
    );

    tracing::info!("outreach-control-plane starting...");

    let config = ServerConfig::from_env();

    let storage = match &config.database_url {
        Some(url) => {
            let storage = StorageBackend::postgres(url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Connected to database");
            storage
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running in dev mode with in-memory storage");
            StorageBackend::in_memory()
        }
    };

    let messenger = TwilioMessenger::from_env();
    if messenger.is_configured() {
        tracing::info!("Twilio messaging configured");
    } else {
        tracing::warn!("Twilio credentials not set (TWILIO_SID, TWILIO_TOKEN, TWILIO_FROM). Notifications will be skipped.");
    }
    let provider: Arc<dyn MessagingProvider> = Arc::new(messenger);

    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }
    tracing::info!(
        critical_event_type = %config.critical_event_type,
        max_matched_responders = config.max_matched_responders,
        match_service_tag = ?config.match_service_tag,
        "Ingest policy configured"
    );

    let app = build_app(storage, provider, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
