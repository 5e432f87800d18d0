//! Wire-frame builders for scripted deliveries.

use chrono::Utc;
use pitwall_proto::{Destination, Envelope, EventKind, Frame};

/// Chat message on the private queue.
pub fn chat(id: &str, sender: &str, receiver: &str, text: &str) -> Frame {
    Frame {
        destination: Destination::PrivateQueue.path().into(),
        envelope: Envelope {
            kind: EventKind::ChatMessage,
            data: serde_json::json!({
                "messageId": id,
                "senderId": sender,
                "receiverId": receiver,
                "message": text,
            }),
            timestamp: Utc::now(),
            user_id: Some(sender.into()),
        },
    }
}

/// Service-progress update on the private queue.
pub fn service_progress(project: &str, status: &str, percent: u8) -> Frame {
    Frame {
        destination: Destination::PrivateQueue.path().into(),
        envelope: Envelope {
            kind: EventKind::ServiceUpdate,
            data: serde_json::json!({
                "projectId": project,
                "status": status,
                "percentComplete": percent,
            }),
            timestamp: Utc::now(),
            user_id: None,
        },
    }
}

/// Announcement on the broadcast topic.
pub fn broadcast_notice(id: &str, title: &str) -> Frame {
    Frame {
        destination: Destination::Broadcast.path().into(),
        envelope: Envelope {
            kind: EventKind::SystemNotification,
            data: serde_json::json!({
                "noticeId": id,
                "title": title,
            }),
            timestamp: Utc::now(),
            user_id: None,
        },
    }
}

/// Frame whose payload cannot decode for its kind.
pub fn malformed() -> Frame {
    Frame {
        destination: Destination::PrivateQueue.path().into(),
        envelope: Envelope {
            kind: EventKind::ChatMessage,
            data: serde_json::json!({"nothing": "useful"}),
            timestamp: Utc::now(),
            user_id: None,
        },
    }
}
