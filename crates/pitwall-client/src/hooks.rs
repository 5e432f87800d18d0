//! Read-only consumer hooks.
//!
//! Typed views over session state for specific concerns. Hooks subscribe on
//! creation and unsubscribe on drop; none of them can write, and all of
//! them read zero/empty state while the store is still uninitialized.

use std::collections::{HashMap, HashSet};

use pitwall_core::{ConnectionInfo, SyncState};
use pitwall_proto::{ChatMessage, EventPayload, ServiceProgress};
use tokio::sync::{broadcast, watch};

use crate::session::{LiveEvent, SessionState};

/// Unread counts plus connection status, for the navbar badge.
#[derive(Debug, Clone)]
pub struct UnreadBadge {
    state: watch::Receiver<SessionState>,
}

impl UnreadBadge {
    pub(crate) fn new(state: watch::Receiver<SessionState>) -> Self {
        Self { state }
    }

    /// Unread notification count. Zero until the first fetch lands.
    pub fn notifications(&self) -> u64 {
        self.state.borrow().unread_notifications
    }

    /// Unread direct-message count. Zero until the first fetch lands.
    pub fn messages(&self) -> u64 {
        self.state.borrow().unread_messages
    }

    /// Connection status for the passive indicator.
    pub fn connection(&self) -> ConnectionInfo {
        self.state.borrow().connection.clone()
    }

    /// Whether the first authoritative fetch has been issued.
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().sync != SyncState::Uninitialized
    }

    /// Whether the server rejected the session credential.
    pub fn auth_rejected(&self) -> bool {
        self.state.borrow().auth_rejected
    }

    /// Most recent events for the badge dropdown, oldest first.
    pub fn recent(&self) -> Vec<LiveEvent> {
        self.state.borrow().recent.clone()
    }

    /// Wait for the next state change. Returns `false` once the session has
    /// shut down.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}

/// Latest service-progress record per project.
#[derive(Debug, Clone)]
pub struct ServiceProgressView {
    state: watch::Receiver<SessionState>,
}

impl ServiceProgressView {
    pub(crate) fn new(state: watch::Receiver<SessionState>) -> Self {
        Self { state }
    }

    /// Latest progress for one project, if any update has arrived.
    pub fn latest(&self, project_id: &str) -> Option<ServiceProgress> {
        self.state.borrow().progress.get(project_id).cloned()
    }

    /// Latest progress for every project seen this session.
    pub fn all(&self) -> HashMap<String, ServiceProgress> {
        self.state.borrow().progress.clone()
    }

    /// Wait for the next state change. Returns `false` once the session has
    /// shut down.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}

/// Transcript of the conversation with one peer.
///
/// Merges live-arrived messages with previously fetched history by
/// append-only ordering: history loads ahead of whatever already arrived
/// live, both segments keep their original order, and nothing is ever
/// reordered. Dedup is by server id only; never by content.
#[derive(Debug)]
pub struct ChatTranscript {
    peer: String,
    events: broadcast::Receiver<LiveEvent>,
    messages: Vec<ChatMessage>,
    seen: HashSet<String>,
}

impl ChatTranscript {
    pub(crate) fn new(peer: String, events: broadcast::Receiver<LiveEvent>) -> Self {
        Self { peer, events, messages: Vec::new(), seen: HashSet::new() }
    }

    /// Peer this transcript tracks.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Merge previously fetched history into the transcript.
    ///
    /// History entries whose server id already arrived live are skipped (the
    /// live copy stays where it landed); everything else is inserted ahead
    /// of the live segment in fetch order.
    pub fn load_history(&mut self, history: Vec<ChatMessage>) {
        let mut merged = Vec::with_capacity(history.len() + self.messages.len());
        for message in history {
            if let Some(id) = &message.message_id
                && !self.seen.insert(id.clone())
            {
                continue;
            }
            merged.push(message);
        }
        merged.append(&mut self.messages);
        self.messages = merged;
    }

    /// The transcript, in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Drain every live message that has already arrived, appending the
    /// relevant ones. Returns how many were appended.
    pub fn poll(&mut self) -> usize {
        let mut appended = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if self.absorb(event) {
                        appended += 1;
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "transcript lagged; live messages dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty
                    | broadcast::error::TryRecvError::Closed,
                ) => break,
            }
        }
        appended
    }

    /// Wait for the next message in this conversation and append it.
    /// Returns `None` once the session has shut down.
    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if self.absorb(event) {
                        return self.messages.last().cloned();
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "transcript lagged; live messages dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Append a live event if it belongs to this conversation and is not a
    /// duplicate. Returns whether it was appended.
    fn absorb(&mut self, event: LiveEvent) -> bool {
        let EventPayload::ChatMessage(message) = event.payload else {
            return false;
        };
        if message.sender_id != self.peer && message.receiver_id != self.peer {
            return false;
        }
        if let Some(id) = &message.message_id
            && !self.seen.insert(id.clone())
        {
            return false;
        }
        self.messages.push(message);
        true
    }
}
