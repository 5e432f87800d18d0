//! Kind-specific payload types.
//!
//! [`EventPayload`] is a tagged union keyed by [`EventKind`]: each variant
//! declares the fields its kind requires, so consumers match on the variant
//! instead of probing a loosely-typed object for whichever field happens to
//! be present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EventKind,
    errors::{ProtocolError, Result},
};

/// Typed payload of an inbound event, keyed by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Progress change on a service project.
    ServiceUpdate(ServiceProgress),
    /// Appointment lifecycle change.
    AppointmentUpdate(AppointmentChange),
    /// Direct chat message.
    ChatMessage(ChatMessage),
    /// Announcement or personal notification.
    SystemNotification(SystemNotice),
}

impl EventPayload {
    /// Decode the `data` object for an already-classified kind.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Payload` when the object is missing required fields or
    /// has the wrong shape for `kind`.
    pub fn decode(kind: EventKind, data: serde_json::Value) -> Result<Self> {
        let payload = match kind {
            EventKind::ServiceUpdate => Self::ServiceUpdate(decode_as(kind, data)?),
            EventKind::AppointmentUpdate => Self::AppointmentUpdate(decode_as(kind, data)?),
            EventKind::ChatMessage => Self::ChatMessage(decode_as(kind, data)?),
            EventKind::SystemNotification => Self::SystemNotification(decode_as(kind, data)?),
        };
        Ok(payload)
    }

    /// Kind this payload was decoded under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ServiceUpdate(_) => EventKind::ServiceUpdate,
            Self::AppointmentUpdate(_) => EventKind::AppointmentUpdate,
            Self::ChatMessage(_) => EventKind::ChatMessage,
            Self::SystemNotification(_) => EventKind::SystemNotification,
        }
    }

    /// Server-assigned id, when the backend provides one. Used for dedup.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::ServiceUpdate(p) => p.update_id.as_deref(),
            Self::AppointmentUpdate(p) => p.update_id.as_deref(),
            Self::ChatMessage(p) => p.message_id.as_deref(),
            Self::SystemNotification(p) => p.notice_id.as_deref(),
        }
    }
}

fn decode_as<T: serde::de::DeserializeOwned>(kind: EventKind, data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| ProtocolError::Payload { kind, reason: e.to_string() })
}

/// Progress snapshot for a service project (work on one vehicle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProgress {
    /// Server id of this update, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,

    /// Project the update belongs to.
    pub project_id: String,

    /// Vehicle under service, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,

    /// Current workflow status (e.g. `"diagnosis"`, `"in_progress"`).
    pub status: String,

    /// Completion percentage, when the workflow tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,

    /// Technician note attached to the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Appointment lifecycle change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChange {
    /// Server id of this update, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_id: Option<String>,

    /// Appointment the change applies to.
    pub appointment_id: String,

    /// New status (e.g. `"confirmed"`, `"cancelled"`).
    pub status: String,

    /// New scheduled time, for reschedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Direct chat message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message id, when present. The only legal dedup key;
    /// transcripts never dedup by content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Sending user.
    pub sender_id: String,

    /// Receiving user.
    pub receiver_id: String,

    /// Message text.
    pub message: String,
}

/// Severity of a system notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    /// Informational.
    Info,
    /// Needs attention.
    Warning,
    /// Service-affecting.
    Critical,
}

/// Service-center announcement or personal notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNotice {
    /// Server id of this notice, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_id: Option<String>,

    /// Short headline.
    pub title: String,

    /// Longer body, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Severity; defaults to informational when the backend omits it.
    #[serde(default = "default_severity")]
    pub severity: NoticeSeverity,
}

fn default_severity() -> NoticeSeverity {
    NoticeSeverity::Info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_decodes() {
        let data = serde_json::json!({
            "messageId": "m-41",
            "senderId": "u-2",
            "receiverId": "u-9",
            "message": "brake pads are in"
        });
        let payload = EventPayload::decode(EventKind::ChatMessage, data).unwrap();
        assert_eq!(payload.server_id(), Some("m-41"));
        match payload {
            EventPayload::ChatMessage(msg) => assert_eq!(msg.receiver_id, "u-9"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_payload_error() {
        let data = serde_json::json!({"senderId": "u-2", "message": "no receiver"});
        let err = EventPayload::decode(EventKind::ChatMessage, data).unwrap_err();
        assert!(matches!(err, ProtocolError::Payload { kind: EventKind::ChatMessage, .. }));
    }

    #[test]
    fn notice_severity_defaults_to_info() {
        let data = serde_json::json!({"title": "lift 3 back in service"});
        let payload = EventPayload::decode(EventKind::SystemNotification, data).unwrap();
        match payload {
            EventPayload::SystemNotification(n) => {
                assert_eq!(n.severity, NoticeSeverity::Info);
                assert_eq!(n.notice_id, None);
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn service_progress_keeps_project_key() {
        let data = serde_json::json!({
            "projectId": "p-7",
            "status": "in_progress",
            "percentComplete": 60
        });
        let payload = EventPayload::decode(EventKind::ServiceUpdate, data).unwrap();
        match payload {
            EventPayload::ServiceUpdate(p) => {
                assert_eq!(p.project_id, "p-7");
                assert_eq!(p.percent_complete, Some(60));
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
