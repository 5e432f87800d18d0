//! Event router: subscription lifecycle and frame classification.
//!
//! The router owns every [`SubscriptionId`] for the session. At most one
//! live subscription exists per destination; subscribing is idempotent via
//! the held id, which is cleared the moment the connection drops so a
//! reconnect starts from a clean state.

use pitwall_proto::{Destination, EventPayload, Frame, ProtocolError, SubscriptionId};

use crate::{ConnectionStatus, InboundEvent};

/// Role of the authenticated session.
///
/// Staff sessions additionally receive the shared broadcast topic used for
/// shop-wide announcements and workload bulletins; customers only get their
/// private queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Vehicle owner; private queue only.
    Customer,
    /// Service technician or advisor.
    Employee,
    /// Service-center administrator.
    Admin,
}

impl SessionRole {
    /// Whether this role subscribes the broadcast topic.
    pub fn receives_broadcast(self) -> bool {
        matches!(self, Self::Employee | Self::Admin)
    }
}

/// Subscription commands the router asks the caller to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// Publish a subscribe for `destination` under `id`.
    Subscribe {
        /// Id binding the subscription.
        id: SubscriptionId,
        /// Destination to subscribe.
        destination: Destination,
    },

    /// Publish an unsubscribe for `id`.
    Unsubscribe {
        /// Id from the matching subscribe.
        id: SubscriptionId,
    },
}

/// Translates destination-qualified raw frames into typed events and manages
/// the subscription lifecycle idempotently.
#[derive(Debug)]
pub struct Router {
    role: SessionRole,
    next_id: u32,
    private_sub: Option<SubscriptionId>,
    broadcast_sub: Option<SubscriptionId>,
}

impl Router {
    /// Create a router for a session with the given role.
    pub fn new(role: SessionRole) -> Self {
        Self { role, next_id: 0, private_sub: None, broadcast_sub: None }
    }

    /// React to a connection status transition.
    ///
    /// On `Connected`, emits subscribes for every channel the role requires
    /// that is not already bound; calling this twice for the same live
    /// connection emits nothing the second time. On any other status,
    /// releases all held subscriptions immediately: they are invalid once
    /// the connection drops, and no unsubscribe is sent over a dead socket.
    pub fn handle_status(&mut self, status: ConnectionStatus) -> Vec<RouterAction> {
        if !status.allows_subscriptions() {
            self.private_sub = None;
            self.broadcast_sub = None;
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.private_sub.is_none() {
            let id = self.fresh_id();
            self.private_sub = Some(id);
            actions.push(RouterAction::Subscribe { id, destination: Destination::PrivateQueue });
        }
        if self.role.receives_broadcast() && self.broadcast_sub.is_none() {
            let id = self.fresh_id();
            self.broadcast_sub = Some(id);
            actions.push(RouterAction::Subscribe { id, destination: Destination::Broadcast });
        }
        actions
    }

    /// Release every held subscription gracefully, emitting unsubscribes.
    ///
    /// Used on orderly shutdown while the connection is still up; for a
    /// dropped connection use [`Router::handle_status`], which releases
    /// without emitting.
    pub fn unsubscribe_all(&mut self) -> Vec<RouterAction> {
        let mut actions = Vec::new();
        if let Some(id) = self.private_sub.take() {
            actions.push(RouterAction::Unsubscribe { id });
        }
        if let Some(id) = self.broadcast_sub.take() {
            actions.push(RouterAction::Unsubscribe { id });
        }
        actions
    }

    /// Held subscription id for a destination, if any.
    pub fn subscription(&self, destination: Destination) -> Option<SubscriptionId> {
        match destination {
            Destination::PrivateQueue => self.private_sub,
            Destination::Broadcast => self.broadcast_sub,
            Destination::ChatSend => None,
        }
    }

    /// Classify one raw frame into a typed event.
    ///
    /// The kind is resolved from the destination path plus the envelope tag;
    /// the `data` object is decoded only after classification succeeds.
    /// Malformed or unclassifiable frames are logged and dropped; never a
    /// crash, never a partial event.
    pub fn classify<I>(&self, frame: Frame, received_at: I) -> Option<InboundEvent<I>> {
        match self.try_classify(frame, received_at) {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::warn!(%error, "dropping frame");
                None
            },
        }
    }

    fn try_classify<I>(
        &self,
        frame: Frame,
        received_at: I,
    ) -> Result<InboundEvent<I>, ProtocolError> {
        let destination = Destination::from_path(&frame.destination)
            .ok_or_else(|| ProtocolError::UnknownDestination(frame.destination.clone()))?;

        let kind = frame.envelope.kind;
        if !destination.admits(kind) {
            return Err(ProtocolError::KindNotAdmissible { kind, destination });
        }

        let payload = EventPayload::decode(kind, frame.envelope.data)?;
        Ok(InboundEvent {
            kind,
            payload,
            sent_at: frame.envelope.timestamp,
            origin_user: frame.envelope.user_id,
            received_at,
        })
    }

    fn fresh_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pitwall_proto::{Envelope, EventKind};

    use super::*;

    fn chat_frame(destination: &str) -> Frame {
        Frame {
            destination: destination.into(),
            envelope: Envelope {
                kind: EventKind::ChatMessage,
                data: serde_json::json!({
                    "messageId": "m-1",
                    "senderId": "u-2",
                    "receiverId": "u-9",
                    "message": "alignment done"
                }),
                timestamp: Utc::now(),
                user_id: Some("u-2".into()),
            },
        }
    }

    #[test]
    fn connected_subscribes_once() {
        let mut router = Router::new(SessionRole::Employee);

        let first = router.handle_status(ConnectionStatus::Connected);
        assert_eq!(first.len(), 2);

        // Idempotent: same live connection, nothing new.
        let second = router.handle_status(ConnectionStatus::Connected);
        assert!(second.is_empty());
    }

    #[test]
    fn customer_skips_broadcast() {
        let mut router = Router::new(SessionRole::Customer);
        let actions = router.handle_status(ConnectionStatus::Connected);

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            actions[0],
            RouterAction::Subscribe { destination: Destination::PrivateQueue, .. }
        ));
        assert_eq!(router.subscription(Destination::Broadcast), None);
    }

    #[test]
    fn drop_releases_and_reconnect_rebinds_fresh() {
        let mut router = Router::new(SessionRole::Admin);
        let first = router.handle_status(ConnectionStatus::Connected);

        assert!(router.handle_status(ConnectionStatus::Reconnecting).is_empty());
        assert_eq!(router.subscription(Destination::PrivateQueue), None);

        let second = router.handle_status(ConnectionStatus::Connected);
        assert_eq!(second.len(), 2);
        // Fresh ids, not reuses of the dead bindings.
        for action in &second {
            assert!(!first.contains(action));
        }
    }

    #[test]
    fn unsubscribe_all_emits_and_clears() {
        let mut router = Router::new(SessionRole::Employee);
        let _ = router.handle_status(ConnectionStatus::Connected);

        let actions = router.unsubscribe_all();
        assert_eq!(actions.len(), 2);
        assert_eq!(router.subscription(Destination::PrivateQueue), None);
        assert!(router.unsubscribe_all().is_empty());
    }

    #[test]
    fn classify_resolves_chat() {
        let router = Router::new(SessionRole::Customer);
        let event = router.classify(chat_frame("/user/queue/events"), 7u64).unwrap();

        assert_eq!(event.kind, EventKind::ChatMessage);
        assert_eq!(event.server_id(), Some("m-1"));
        assert_eq!(event.received_at, 7);
    }

    #[test]
    fn classify_drops_unknown_destination() {
        let router = Router::new(SessionRole::Customer);
        assert!(router.classify(chat_frame("/queue/other"), 0u64).is_none());
    }

    #[test]
    fn classify_drops_kind_not_admissible() {
        // Chat messages never arrive on the broadcast topic.
        let router = Router::new(SessionRole::Employee);
        assert!(router.classify(chat_frame("/topic/service-center"), 0u64).is_none());
    }

    #[test]
    fn classify_drops_bad_payload() {
        let router = Router::new(SessionRole::Customer);
        let mut frame = chat_frame("/user/queue/events");
        frame.envelope.data = serde_json::json!({"message": "missing everything else"});
        assert!(router.classify(frame, 0u64).is_none());
    }
}
