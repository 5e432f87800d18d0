//! Channel destinations.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EventKind;

/// A named routing path frames are published to or subscribed from.
///
/// The set is fixed by the backend contract: one per-user private queue (the
/// server resolves the user from the connection's authenticated principal),
/// one shared broadcast topic, and one application destination for sending
/// chat messages. On the wire a destination is its path string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Per-user private queue; carries everything addressed to this session.
    PrivateQueue,
    /// Shared broadcast topic for service-center-wide announcements.
    Broadcast,
    /// Application destination for publishing chat messages.
    ChatSend,
}

impl Destination {
    /// Wire path for this destination.
    pub const fn path(self) -> &'static str {
        match self {
            Self::PrivateQueue => "/user/queue/events",
            Self::Broadcast => "/topic/service-center",
            Self::ChatSend => "/app/chat.send",
        }
    }

    /// Resolve a wire path. Returns `None` for paths outside the contract.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/user/queue/events" => Some(Self::PrivateQueue),
            "/topic/service-center" => Some(Self::Broadcast),
            "/app/chat.send" => Some(Self::ChatSend),
            _ => None,
        }
    }

    /// Whether an envelope tagged `kind` is admissible on this destination.
    ///
    /// The private queue carries every kind addressed to the user. The
    /// broadcast topic carries announcements and shop-wide service bulletins;
    /// anything else claiming to arrive there is dropped. The chat-send
    /// destination is publish-only.
    pub fn admits(self, kind: EventKind) -> bool {
        match self {
            Self::PrivateQueue => true,
            Self::Broadcast => {
                matches!(kind, EventKind::SystemNotification | EventKind::ServiceUpdate)
            },
            Self::ChatSend => false,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Self::from_path(&path)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown destination: {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trip() {
        for dest in [Destination::PrivateQueue, Destination::Broadcast, Destination::ChatSend] {
            assert_eq!(Destination::from_path(dest.path()), Some(dest));
        }
    }

    #[test]
    fn unknown_path_rejected() {
        assert_eq!(Destination::from_path("/topic/other"), None);
    }

    #[test]
    fn broadcast_rejects_chat() {
        assert!(!Destination::Broadcast.admits(EventKind::ChatMessage));
        assert!(Destination::Broadcast.admits(EventKind::SystemNotification));
    }

    #[test]
    fn private_queue_admits_all() {
        for kind in [
            EventKind::ServiceUpdate,
            EventKind::AppointmentUpdate,
            EventKind::ChatMessage,
            EventKind::SystemNotification,
        ] {
            assert!(Destination::PrivateQueue.admits(kind));
        }
    }
}
