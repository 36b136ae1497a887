// Device payload shape
//
// A SensorPayload is what the bridge forwards to the control plane: two keys the
// bridge guarantees (`device_id`, `timestamp_ms`) plus whatever else the firmware
// reported. Every value the device sent is kept verbatim, including values of
// unexpected types; defaults only fill keys that are missing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEVICE_ID_KEY: &str = "device_id";
pub const TIMESTAMP_KEY: &str = "timestamp_ms";

/// Device payload with defaulted keys and an open extension bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SensorPayload {
    fields: Map<String, Value>,
}

impl SensorPayload {
    /// Parse one line of device output.
    ///
    /// Returns `None` for blank lines. Anything that is not a JSON object is
    /// wrapped as `{"raw": <line>}` rather than dropped.
    pub fn from_line(line: &str, fallback_device_id: &str, now_ms: i64) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let fields = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => map,
            _ => {
                let mut map = Map::new();
                map.insert("raw".to_string(), Value::String(line.to_string()));
                map
            }
        };

        Some(Self::from_fields(fields, fallback_device_id, now_ms))
    }

    /// Build a payload from parsed fields, inserting `device_id` and
    /// `timestamp_ms` only when the device did not send those keys at all.
    pub fn from_fields(mut fields: Map<String, Value>, fallback_device_id: &str, now_ms: i64) -> Self {
        fields
            .entry(DEVICE_ID_KEY)
            .or_insert_with(|| Value::String(fallback_device_id.to_string()));
        fields
            .entry(TIMESTAMP_KEY)
            .or_insert_with(|| Value::from(now_ms));
        Self { fields }
    }

    /// Device id as sent, or the fallback. May be any JSON value.
    pub fn device_id(&self) -> &Value {
        self.fields.get(DEVICE_ID_KEY).unwrap_or(&Value::Null)
    }

    /// Device id rendered for logs
    pub fn device_label(&self) -> String {
        match self.device_id() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Event time in milliseconds, when the device sent a number.
    ///
    /// Fractional values are floored. Strings, null and other types give `None`.
    pub fn timestamp_ms(&self) -> Option<i64> {
        match self.fields.get(TIMESTAMP_KEY)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
            _ => None,
        }
    }

    /// Look up any field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Event type reported by the device (`event` takes precedence over `event_type`).
    pub fn event_type(&self) -> Option<&str> {
        let non_empty = |key: &str| {
            self.fields
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        non_empty("event").or_else(|| non_empty("event_type"))
    }

    /// Serialize to the JSON object sent over the wire.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
