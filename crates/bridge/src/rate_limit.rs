// Event rate limiting
//
// Compares device-reported timestamps. The watermark moves only when an event
// is admitted, and it never expires: a device clock that jumps backwards keeps
// suppressing events until it catches up with the last admitted timestamp.

/// Drops events that arrive too soon after the last admitted one
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval_ms: i64,
    last_event_time: Option<i64>,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms: i64::try_from(min_interval_ms).unwrap_or(i64::MAX),
            last_event_time: None,
        }
    }

    /// Returns true and advances the watermark if the event may be forwarded
    pub fn admit(&mut self, timestamp_ms: i64) -> bool {
        if let Some(last) = self.last_event_time {
            if timestamp_ms.saturating_sub(last) < self.min_interval_ms {
                return false;
            }
        }
        self.last_event_time = Some(timestamp_ms);
        true
    }

    /// Timestamp of the last admitted event
    pub fn last_event_time(&self) -> Option<i64> {
        self.last_event_time
    }
}
