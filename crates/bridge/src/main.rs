// Outreach device bridge
//
// Decision: Use clap derive with env fallbacks so the bridge runs from a .env file on the device host.
// Decision: Port selection blocks on stdin, so it runs on the blocking pool.

use anyhow::{Context, Result};
use clap::Parser;
use outreach_bridge::{BridgeConfig, DeliveryClient, DeviceBridge, PortSelector, SystemPorts};
use outreach_core::telemetry::{init_telemetry, TelemetryConfig};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "outreach-bridge")]
#[command(about = "Forward sensor events from a serial device to the outreach backend")]
#[command(version)]
struct Cli {
    /// Serial port to open (e.g. /dev/ttyACM0, COM3). Prompted for when unavailable.
    #[arg(long, env = "SERIAL_PORT")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, env = "SERIAL_BAUD", default_value_t = 115_200)]
    baud: u32,

    /// Ingest endpoint of the control plane
    #[arg(
        long,
        env = "BACKEND_URL",
        default_value = "http://127.0.0.1:5000/api/event"
    )]
    backend_url: String,

    /// Minimum spacing between forwarded events, in device milliseconds
    #[arg(long, env = "MIN_INTERVAL_MS", default_value_t = 2000)]
    min_interval_ms: u64,

    /// HTTP timeout per delivery, in seconds
    #[arg(long, env = "DELIVERY_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    /// Device id used when a payload carries none
    #[arg(long, env = "DEVICE_ID", default_value = outreach_bridge::bridge::DEFAULT_DEVICE_ID)]
    device_id: String,

    /// Wait after opening the port before reading, in milliseconds
    #[arg(long, env = "SERIAL_SETTLE_MS", default_value_t = 2000)]
    settle_ms: u64,

    /// Never prompt; use the first available port
    #[arg(long, env = "NON_INTERACTIVE")]
    non_interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    init_telemetry(
        TelemetryConfig::from_env()
            .with_default_service_name("outreach-bridge")
            .with_default_filter("outreach_bridge=info,outreach_core=info"),
    );

    let cli = Cli::parse();

    let preferred = cli.port.clone();
    let interactive = !cli.non_interactive;
    let baud = cli.baud;
    let selected = tokio::task::spawn_blocking(move || {
        PortSelector::new(SystemPorts::new(baud)).select_port(preferred.as_deref(), interactive)
    })
    .await
    .context("Port selection task failed")?
    .context("No usable serial port")?;

    let Some(port_name) = selected else {
        tracing::info!("No port selected, exiting");
        return Ok(());
    };

    let delivery = DeliveryClient::new(&cli.backend_url, Duration::from_secs(cli.timeout_secs))
        .context("Failed to create delivery client")?;

    tracing::info!(
        port = %port_name,
        baud = cli.baud,
        backend_url = %delivery.url(),
        min_interval_ms = cli.min_interval_ms,
        device_id = %cli.device_id,
        "Bridge configured"
    );

    let config = BridgeConfig {
        port_name,
        baud_rate: cli.baud,
        device_id: cli.device_id,
        min_interval_ms: cli.min_interval_ms,
        settle: Duration::from_millis(cli.settle_ms),
        ..BridgeConfig::new("")
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                // Dropping the sender would read as a shutdown
                std::future::pending::<()>().await;
            }
        }
    });

    let mut bridge = DeviceBridge::new(config, delivery);
    bridge
        .run(shutdown_rx)
        .await
        .context("Bridge stopped with an error")?;

    tracing::info!("Bridge stopped");
    Ok(())
}
