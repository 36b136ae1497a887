// Device bridge
//
// DISCONNECTED -> CONNECTING -> CONNECTED -> READING -> DISCONNECTED
//
// A blocking thread owns the serial port and sends complete lines over a
// channel. The async loop enriches each line, applies the rate limiter and
// hands admitted payloads to the sink. Read errors pause the loop for a fixed
// backoff and never change state. Shutdown is checked before every line, and
// partial lines stay in the reader's buffer.

use chrono::Utc;
use outreach_core::payload::TIMESTAMP_KEY;
use outreach_core::SensorPayload;
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::delivery::{DeliveryOutcome, EventSink};
use crate::error::BridgeError;
use crate::port::open_port;
use crate::rate_limit::RateLimiter;

/// Fallback device identifier when the payload carries none
pub const DEFAULT_DEVICE_ID: &str = "ELEGOO_PROTO_01";

const LINE_CHANNEL_CAPACITY: usize = 64;
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disconnected,
    Connecting,
    Connected,
    Reading,
}

/// Bridge settings
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub device_id: String,
    pub min_interval_ms: u64,
    /// Pause after opening the port while the board resets
    pub settle: Duration,
    /// Pause after a read error
    pub read_error_backoff: Duration,
}

impl BridgeConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: 115_200,
            device_id: DEFAULT_DEVICE_ID.to_string(),
            min_interval_ms: 2000,
            settle: Duration::from_secs(2),
            read_error_backoff: Duration::from_secs(1),
        }
    }
}

/// What happened to one line of device output
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Blank line, ignored
    Skipped,
    /// Too soon after the previous event
    RateLimited { timestamp_ms: i64 },
    /// The device sent a `timestamp_ms` that is not a number
    InvalidTimestamp,
    /// Sent to the backend
    Forwarded(DeliveryOutcome),
    /// Delivery failed; the payload is dropped
    DeliveryFailed(String),
}

/// Reads device lines and forwards them to a sink
pub struct DeviceBridge<S> {
    config: BridgeConfig,
    sink: S,
    limiter: RateLimiter,
    state: BridgeState,
}

impl<S: EventSink> DeviceBridge<S> {
    pub fn new(config: BridgeConfig, sink: S) -> Self {
        let limiter = RateLimiter::new(config.min_interval_ms);
        Self {
            config,
            sink,
            limiter,
            state: BridgeState::Disconnected,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Handle one line using the current wall clock for missing timestamps
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        self.handle_line_at(line, Utc::now().timestamp_millis()).await
    }

    /// Handle one line; `now_ms` fills `timestamp_ms` when the device omitted it
    pub async fn handle_line_at(&mut self, line: &str, now_ms: i64) -> LineOutcome {
        let Some(payload) = SensorPayload::from_line(line, &self.config.device_id, now_ms) else {
            return LineOutcome::Skipped;
        };

        tracing::debug!(line = %line.trim(), "Serial line");

        let Some(timestamp_ms) = payload.timestamp_ms() else {
            tracing::warn!(
                device_id = %payload.device_label(),
                timestamp_ms = ?payload.get(TIMESTAMP_KEY),
                "Dropped event with non-numeric timestamp_ms"
            );
            return LineOutcome::InvalidTimestamp;
        };

        if !self.limiter.admit(timestamp_ms) {
            tracing::debug!(
                timestamp_ms,
                last_event_time = ?self.limiter.last_event_time(),
                "Skipped event, too soon after last event"
            );
            return LineOutcome::RateLimited { timestamp_ms };
        }

        match self.sink.deliver(&payload).await {
            Ok(outcome) => LineOutcome::Forwarded(outcome),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    device_id = %payload.device_label(),
                    event_type = payload.event_type().unwrap_or("unknown"),
                    "Error posting to backend"
                );
                LineOutcome::DeliveryFailed(e.to_string())
            }
        }
    }

    /// Process lines until shutdown is signalled or the reader goes away
    pub async fn run_lines(
        &mut self,
        mut lines: mpsc::Receiver<io::Result<String>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), BridgeError> {
        self.state = BridgeState::Reading;

        let result = loop {
            if *shutdown.borrow() {
                break Ok(());
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.changed() => break Ok(()),
                next = lines.recv() => next,
            };

            match next {
                Some(Ok(line)) => {
                    self.handle_line(&line).await;
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Serial read error");
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => break Ok(()),
                        _ = tokio::time::sleep(self.config.read_error_backoff) => {}
                    }
                }
                None => break Err(BridgeError::ReaderClosed(self.config.port_name.clone())),
            }
        };

        self.state = BridgeState::Disconnected;
        if result.is_ok() {
            tracing::info!("Stopping bridge");
        }
        result
    }

    /// Open the configured port and run until shutdown
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) -> Result<(), BridgeError> {
        self.state = BridgeState::Connecting;
        tracing::info!(port = %self.config.port_name, baud = self.config.baud_rate, "Opening serial port");

        let port = match open_port(&self.config.port_name, self.config.baud_rate) {
            Ok(port) => port,
            Err(e) => {
                self.state = BridgeState::Disconnected;
                return Err(e.into());
            }
        };

        self.state = BridgeState::Connected;
        tracing::info!(port = %self.config.port_name, "Connected");

        // Boards reset when the port opens
        tokio::time::sleep(self.config.settle).await;

        let lines = spawn_reader(port, self.config.port_name.clone());
        self.run_lines(lines, shutdown).await
    }
}

/// Read lines on a dedicated thread. The thread exits once the receiver is dropped.
fn spawn_reader(port: Box<dyn SerialPort>, port_name: String) -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

    std::thread::Builder::new()
        .name(format!("serial-reader-{}", port_name))
        .spawn(move || read_lines(BufReader::new(port), tx))
        .map_err(|e| tracing::error!(error = %e, "Failed to spawn serial reader"))
        .ok();

    rx
}

fn read_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<io::Result<String>>) {
    let mut buf = Vec::new();
    loop {
        if tx.is_closed() {
            return;
        }

        let message = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                std::thread::sleep(IDLE_POLL);
                continue;
            }
            // Partial line still waiting for its newline
            Ok(_) if !buf.ends_with(b"\n") => continue,
            Ok(_) => Ok(decode_line(&std::mem::take(&mut buf))),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };

        if tx.blocking_send(message).is_err() {
            return;
        }
    }
}

/// Decode bytes leniently, dropping invalid UTF-8
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace('\u{FFFD}', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        payloads: Arc<Mutex<Vec<SensorPayload>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, payload: &SensorPayload) -> Result<DeliveryOutcome, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Timeout {
                    url: "http://backend".to_string(),
                });
            }
            self.payloads.lock().unwrap().push(payload.clone());
            Ok(DeliveryOutcome {
                delivered: true,
                http_status: 200,
            })
        }
    }

    fn bridge(sink: RecordingSink) -> DeviceBridge<RecordingSink> {
        let mut config = BridgeConfig::new("/dev/null");
        config.read_error_backoff = Duration::from_millis(10);
        DeviceBridge::new(config, sink)
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());
        assert_eq!(bridge.handle_line_at("   ", 1_000).await, LineOutcome::Skipped);
        assert!(sink.payloads.lock().unwrap().is_empty());
        assert_eq!(bridge.limiter().last_event_time(), None);
    }

    #[tokio::test]
    async fn test_enriches_and_forwards() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        let outcome = bridge.handle_line_at(r#"{"event":"motion"}"#, 5_000).await;
        assert!(matches!(outcome, LineOutcome::Forwarded(_)));

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads[0].device_id(), DEFAULT_DEVICE_ID);
        assert_eq!(payloads[0].timestamp_ms(), Some(5_000));
        assert_eq!(payloads[0].event_type(), Some("motion"));
    }

    #[tokio::test]
    async fn test_device_values_are_not_overridden() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        bridge
            .handle_line_at(r#"{"device_id":"D7","timestamp_ms":42}"#, 5_000)
            .await;

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads[0].device_id(), "D7");
        assert_eq!(payloads[0].timestamp_ms(), Some(42));
    }

    #[tokio::test]
    async fn test_non_numeric_timestamp_is_dropped() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        let outcome = bridge
            .handle_line_at(r#"{"event":"motion","timestamp_ms":"abc"}"#, 5_000)
            .await;

        assert_eq!(outcome, LineOutcome::InvalidTimestamp);
        assert!(sink.payloads.lock().unwrap().is_empty());
        assert_eq!(bridge.limiter().last_event_time(), None);
    }

    #[tokio::test]
    async fn test_device_values_forwarded_unchanged() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        bridge
            .handle_line_at(r#"{"device_id":null,"timestamp_ms":1234.9}"#, 5_000)
            .await;

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(
            payloads[0].to_json(),
            serde_json::json!({"device_id": null, "timestamp_ms": 1234.9})
        );
        assert_eq!(bridge.limiter().last_event_time(), Some(1234));
    }

    #[tokio::test]
    async fn test_malformed_line_forwarded_as_raw() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        bridge.handle_line_at("PIR triggered", 5_000).await;

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads[0].get("raw").unwrap(), "PIR triggered");
    }

    #[tokio::test]
    async fn test_rate_limit_uses_device_timestamps() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());

        let first = r#"{"event":"motion","timestamp_ms":10000}"#;
        let too_soon = r#"{"event":"motion","timestamp_ms":11500}"#;
        let later = r#"{"event":"motion","timestamp_ms":12000}"#;

        assert!(matches!(bridge.handle_line_at(first, 0).await, LineOutcome::Forwarded(_)));
        assert_eq!(
            bridge.handle_line_at(too_soon, 0).await,
            LineOutcome::RateLimited {
                timestamp_ms: 11_500
            }
        );
        assert!(matches!(bridge.handle_line_at(later, 0).await, LineOutcome::Forwarded(_)));
        assert_eq!(sink.payloads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported_not_retried() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut bridge = bridge(sink);

        let outcome = bridge.handle_line_at(r#"{"event":"motion"}"#, 1_000).await;
        assert!(matches!(outcome, LineOutcome::DeliveryFailed(_)));
        // The watermark still advanced: the event was admitted, just not delivered
        assert_eq!(bridge.limiter().last_event_time(), Some(1_000));
    }

    #[tokio::test]
    async fn test_read_errors_do_not_stop_the_loop() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(Err(io::Error::new(io::ErrorKind::BrokenPipe, "glitch")))
            .await
            .unwrap();
        tx.send(Ok(r#"{"event":"motion"}"#.to_string())).await.unwrap();
        drop(tx);

        let result = bridge.run_lines(rx, shutdown_rx).await;
        assert!(matches!(result, Err(BridgeError::ReaderClosed(_))));
        assert_eq!(sink.payloads.lock().unwrap().len(), 1);
        assert_eq!(bridge.state(), BridgeState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_stops_before_next_line() {
        let sink = RecordingSink::default();
        let mut bridge = bridge(sink.clone());
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        shutdown_tx.send(true).unwrap();
        tx.send(Ok(r#"{"event":"motion"}"#.to_string())).await.unwrap();

        bridge.run_lines(rx, shutdown_rx).await.unwrap();
        assert!(sink.payloads.lock().unwrap().is_empty());
        assert_eq!(bridge.state(), BridgeState::Disconnected);
    }

    #[tokio::test]
    async fn test_reader_emits_complete_lines_only() {
        let input: &'static [u8] = b"{\"event\":\"motion\"}\r\n\xffhello\npartial";
        let (tx, mut rx) = mpsc::channel(8);

        let reader = std::thread::spawn(move || read_lines(input, tx));

        assert_eq!(rx.recv().await.unwrap().unwrap(), r#"{"event":"motion"}"#);
        assert_eq!(rx.recv().await.unwrap().unwrap(), "hello");

        // The trailing partial line is held back; dropping the receiver stops the thread
        drop(rx);
        reader.join().unwrap();
    }
}
