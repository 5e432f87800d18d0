//! Normalized inbound events.

use chrono::{DateTime, Utc};
use pitwall_proto::{EventKind, EventPayload};

/// A normalized unit of realtime information, produced by the router from
/// exactly one raw frame and consumed by the store.
///
/// Generic over `I` (instant type) so simulation tests can use virtual time
/// for the arrival stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent<I> {
    /// Classified kind.
    pub kind: EventKind,
    /// Typed payload for `kind`.
    pub payload: EventPayload,
    /// Server-side publish timestamp. Display only; never used for
    /// ordering, since client clocks and network delay are not normalized.
    pub sent_at: DateTime<Utc>,
    /// Originating user, when the backend attributes one.
    pub origin_user: Option<String>,
    /// Client-side arrival instant.
    pub received_at: I,
}

impl<I> InboundEvent<I> {
    /// Server-assigned id, when present. The dedup key for the log and for
    /// chat transcripts.
    pub fn server_id(&self) -> Option<&str> {
        self.payload.server_id()
    }

    /// Whether this event should bump the unread counters.
    ///
    /// Chat messages and notifications count; service-progress and
    /// appointment updates feed their own views and leave the badge alone.
    /// Echoes of the session user's own actions never count.
    pub fn counts_as_unread(&self, session_user: Option<&str>) -> bool {
        if !matches!(self.kind, EventKind::ChatMessage | EventKind::SystemNotification) {
            return false;
        }
        match (self.origin_user.as_deref(), session_user) {
            (Some(origin), Some(user)) => origin != user,
            _ => true,
        }
    }
}
