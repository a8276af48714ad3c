//! Event Envelope
//!
//! The wire shape exchanged over the push transport. The `type` field
//! selects the subscriber set; the payload is passed through unexamined.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed event as carried on the wire: `{"type": ..., "payload": ...}`.
///
/// `payload` is opaque JSON and defaults to `null` when absent. No schema
/// validation is applied beyond the envelope shape itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event type key, e.g. `new_match`, `message`, `online_users`.
    #[serde(rename = "type")]
    pub event: String,
    /// Opaque payload forwarded to subscribers as-is.
    #[serde(default)]
    pub payload: Value,
}

impl EventEnvelope {
    /// Build an envelope for an outbound event.
    pub fn new(event: &str, payload: Value) -> Self {
        Self {
            event: event.to_string(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        let envelope: EventEnvelope =
            serde_json::from_str(r#"{"type": "new_match", "payload": {"user_id": 7}}"#).unwrap();
        assert_eq!(envelope.event, "new_match");
        assert_eq!(envelope.payload, json!({"user_id": 7}));
    }

    #[test]
    fn test_missing_payload_defaults_to_null() {
        let envelope: EventEnvelope = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert_eq!(envelope.event, "ping");
        assert_eq!(envelope.payload, Value::Null);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let result = serde_json::from_str::<EventEnvelope>(r#"{"payload": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_shape() {
        let envelope = EventEnvelope::new("message", json!({"text": "hey"}));
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"type\":\"message\""));
        assert!(json.contains("\"payload\":{\"text\":\"hey\"}"));
    }
}
