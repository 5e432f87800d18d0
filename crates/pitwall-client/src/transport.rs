//! Realtime transport seam.
//!
//! The transport owns exactly one connection per session and performs no
//! business-logic filtering: raw frames are forwarded verbatim and every
//! failure surfaces as a status transition, never as a panic or an error
//! thrown into consumer code. The one synchronous failure a caller sees is
//! [`PublishError`] on a send attempted while disconnected.

use std::future::Future;

use pitwall_core::{ConnectionInfo, PublishError};
use pitwall_proto::{ClientCommand, Frame};

/// Events a transport surfaces to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection status transition (including the error that caused it).
    Status(ConnectionInfo),

    /// Raw frame, forwarded verbatim.
    Frame(Frame),

    /// The server rejected the credential at connection establishment. The
    /// transport stops retrying; re-authentication is the owner's concern.
    AuthRejected,
}

/// Abstracts the realtime connection.
///
/// Production implementation is the WebSocket transport (`transport`
/// feature); tests script their own to drive the session deterministically.
pub trait Transport: Send + 'static {
    /// Publish a command if and only if the connection is live.
    ///
    /// # Errors
    ///
    /// [`PublishError::NotConnected`] while the connection is down; the
    /// caller decides whether to retry. No implicit queueing.
    fn publish(
        &mut self,
        command: ClientCommand,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Next transport event. `None` once the transport is defunct and will
    /// never produce another event.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;

    /// Release the socket and every internal timer/task. Must be safe to
    /// call mid-connection-attempt.
    fn shutdown(&mut self);
}
