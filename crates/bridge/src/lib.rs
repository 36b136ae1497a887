// Outreach Device Bridge
//
// Port Selector -> Device Bridge (read, enrich, rate limit) -> Delivery Client.
//
// Key design decisions:
// - The rate limiter watermark is owned by each DeviceBridge instance
// - Delivery goes through the EventSink trait so the loop is testable without a backend
// - Port discovery goes through PortProvider so selection is testable without hardware

pub mod bridge;
pub mod delivery;
pub mod error;
pub mod port;
pub mod rate_limit;

pub use bridge::{BridgeConfig, BridgeState, DeviceBridge, LineOutcome};
pub use delivery::{DeliveryClient, DeliveryOutcome, EventSink};
pub use error::{BridgeError, DeliveryError, PortError};
pub use port::{parse_choice, PortChoice, PortInfo, PortProvider, PortSelector, SystemPorts};
pub use rate_limit::RateLimiter;
