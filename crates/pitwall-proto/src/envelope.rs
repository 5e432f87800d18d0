//! Inbound frame and envelope types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Tag identifying what an envelope carries.
///
/// Classification uses this tag together with the destination the frame
/// arrived on; the `data` object is never inspected to resolve the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Progress change on a service project (work item on a vehicle).
    ServiceUpdate,
    /// Appointment created, rescheduled, confirmed, or cancelled.
    AppointmentUpdate,
    /// Direct chat message between two users.
    ChatMessage,
    /// Service-center announcement or personal notification.
    SystemNotification,
}

/// The JSON body delivered on every inbound frame.
///
/// # Invariants
///
/// - `kind` is the routing tag; the shape of `data` is fixed by `kind` and
///   decoded separately (see [`crate::EventPayload::decode`]).
/// - `timestamp` is the server-side publish time. Client code must never use
///   it for ordering; arrival order is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event kind tag.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Kind-specific payload object, decoded after classification.
    pub data: serde_json::Value,

    /// Server-side publish timestamp (ISO-8601).
    pub timestamp: DateTime<Utc>,

    /// User the event originated from, when the backend attributes one.
    /// Used to recognize echoes of this session's own actions.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// One discrete message delivered over the realtime channel.
///
/// The destination is kept as the raw wire path: a frame on an unrecognized
/// path must survive decoding so the router can log it before dropping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Wire path the frame was published on.
    pub destination: String,

    /// The envelope body.
    #[serde(rename = "frame")]
    pub envelope: Envelope,
}

impl Frame {
    /// Decode a frame from WebSocket text.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Malformed` when the text is not valid JSON or does not
    /// match the envelope shape.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Encode a frame to WebSocket text. Used by test doubles; the production
    /// client never originates inbound frames.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_well_formed() {
        let text = r#"{
            "destination": "/user/queue/events",
            "frame": {
                "type": "chat_message",
                "data": {"senderId": "u-2", "receiverId": "u-9", "message": "ready at 5"},
                "timestamp": "2026-03-02T14:30:00Z",
                "userId": "u-2"
            }
        }"#;
        let frame = Frame::decode(text).unwrap();
        assert_eq!(frame.destination, "/user/queue/events");
        assert_eq!(frame.envelope.kind, EventKind::ChatMessage);
        assert_eq!(frame.envelope.user_id.as_deref(), Some("u-2"));
    }

    #[test]
    fn decode_without_user_id() {
        let text = r#"{
            "destination": "/topic/service-center",
            "frame": {
                "type": "system_notification",
                "data": {"title": "closing early"},
                "timestamp": "2026-03-02T14:30:00Z"
            }
        }"#;
        let frame = Frame::decode(text).unwrap();
        assert_eq!(frame.envelope.user_id, None);
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        let text = r#"{
            "destination": "/user/queue/events",
            "frame": {"type": "telemetry", "data": {}, "timestamp": "2026-03-02T14:30:00Z"}
        }"#;
        assert!(matches!(Frame::decode(text), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(matches!(Frame::decode("not json"), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn unknown_destination_survives_decode() {
        // Routing decides what to do with paths outside the contract; the
        // decoder must not reject them.
        let text = r#"{
            "destination": "/topic/unrelated",
            "frame": {"type": "service_update", "data": {}, "timestamp": "2026-03-02T14:30:00Z"}
        }"#;
        assert!(Frame::decode(text).is_ok());
    }
}
