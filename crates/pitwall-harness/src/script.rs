//! Scripted transport.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use pitwall_client::{Transport, TransportEvent};
use pitwall_core::{ConnectionInfo, ConnectionStatus, PublishError};
use pitwall_proto::{ClientCommand, Frame};
use tokio::sync::mpsc;

use crate::lock;

struct Shared {
    status: Mutex<ConnectionStatus>,
    published: Mutex<Vec<ClientCommand>>,
    shutdowns: AtomicUsize,
}

/// Transport double driven entirely by its [`TransportScript`].
pub struct ScriptedTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    shared: Arc<Shared>,
}

/// Test-side handle: injects events, observes published commands.
#[derive(Clone)]
pub struct TransportScript {
    events: mpsc::UnboundedSender<TransportEvent>,
    shared: Arc<Shared>,
}

/// Create a connected pair of transport double and script handle.
pub fn scripted_transport() -> (ScriptedTransport, TransportScript) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        status: Mutex::new(ConnectionStatus::Disconnected),
        published: Mutex::new(Vec::new()),
        shutdowns: AtomicUsize::new(0),
    });
    (
        ScriptedTransport { events: event_rx, shared: shared.clone() },
        TransportScript { events: event_tx, shared },
    )
}

impl TransportScript {
    /// Drive a status transition.
    pub fn set_status(&self, status: ConnectionStatus) {
        *lock(&self.shared.status) = status;
        let _ = self
            .events
            .send(TransportEvent::Status(ConnectionInfo { status, last_error: None }));
    }

    /// Deliver a frame as if it arrived on the channel.
    pub fn inject_frame(&self, frame: Frame) {
        let _ = self.events.send(TransportEvent::Frame(frame));
    }

    /// Simulate the server rejecting the credential at upgrade time.
    pub fn reject_auth(&self) {
        *lock(&self.shared.status) = ConnectionStatus::Disconnected;
        let _ = self.events.send(TransportEvent::AuthRejected);
        let _ = self.events.send(TransportEvent::Status(ConnectionInfo {
            status: ConnectionStatus::Disconnected,
            last_error: Some("credential rejected".into()),
        }));
    }

    /// Every command the session has published, in order.
    pub fn published(&self) -> Vec<ClientCommand> {
        lock(&self.shared.published).clone()
    }

    /// How many times the session tore the transport down.
    pub fn shutdown_count(&self) -> usize {
        self.shared.shutdowns.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn publish(&mut self, command: ClientCommand) -> Result<(), PublishError> {
        let status = *lock(&self.shared.status);
        if !status.is_connected() {
            return Err(PublishError::NotConnected { status });
        }
        lock(&self.shared.published).push(command);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    fn shutdown(&mut self) {
        self.shared.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
