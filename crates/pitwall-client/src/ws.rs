//! WebSocket transport.
//!
//! Owns one connection per session and a supervisor task that keeps it
//! alive: connect, forward traffic, and on any transport error fall back to
//! a fixed-delay retry. The bearer credential rides in the upgrade request
//! headers, never the query string, so it cannot leak through access logs.

use futures_util::{SinkExt, StreamExt};
use pitwall_core::{ConnectionConfig, ConnectionInfo, ConnectionStatus, PublishError};
use pitwall_proto::{ClientCommand, Frame};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, client::IntoClientRequest, http},
};

use crate::{
    AuthToken,
    transport::{Transport, TransportEvent},
};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// WebSocket transport with fixed-delay reconnect.
///
/// Dropping the handle aborts the supervisor, closing the socket and every
/// internal timer, including mid-connection-attempt.
#[derive(Debug)]
pub struct WsTransport {
    commands: mpsc::Sender<ClientCommand>,
    events: mpsc::Receiver<TransportEvent>,
    status: watch::Receiver<ConnectionStatus>,
    supervisor: tokio::task::AbortHandle,
}

impl WsTransport {
    /// Start the connection supervisor for `ws_url`.
    ///
    /// Returns immediately; connection progress arrives as
    /// [`TransportEvent::Status`] transitions. Must be called from within a
    /// tokio runtime.
    pub fn connect(ws_url: impl Into<String>, token: AuthToken, config: ConnectionConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let supervisor = tokio::spawn(supervise(
            ws_url.into(),
            token,
            config,
            command_rx,
            event_tx,
            status_tx,
        ));

        Self {
            commands: command_tx,
            events: event_rx,
            status: status_rx,
            supervisor: supervisor.abort_handle(),
        }
    }
}

impl Transport for WsTransport {
    async fn publish(&mut self, command: ClientCommand) -> Result<(), PublishError> {
        let status = *self.status.borrow();
        if !status.is_connected() {
            return Err(PublishError::NotConnected { status });
        }
        self.commands.send(command).await.map_err(|_| PublishError::Closed)
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    fn shutdown(&mut self) {
        self.supervisor.abort();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

/// Why an established connection ended.
enum ConnectionEnd {
    /// The session side went away; stop supervising.
    HandleDropped,
    /// Server closed or the stream ended.
    ServerClosed,
    /// Transport error.
    Errored(String),
}

async fn supervise(
    url: String,
    token: AuthToken,
    config: ConnectionConfig,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::Sender<TransportEvent>,
    status: watch::Sender<ConnectionStatus>,
) {
    let mut first_attempt = true;
    let mut last_error: Option<String> = None;
    loop {
        let phase = if first_attempt {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Reconnecting
        };
        if !publish_status(&status, &events, phase, last_error.take()).await {
            return;
        }

        // The upgrade request is rebuilt per attempt; a malformed URL cannot
        // be retried into existence, so that one error is terminal.
        let request = match build_request(&url, &token) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "invalid realtime endpoint");
                let _ =
                    publish_status(&status, &events, ConnectionStatus::Disconnected, Some(error))
                        .await;
                return;
            },
        };

        match connect_async(request).await {
            Ok((stream, _response)) => {
                first_attempt = false;
                if !publish_status(&status, &events, ConnectionStatus::Connected, None).await {
                    return;
                }
                tracing::debug!(%url, "realtime channel connected");

                match run_connection(stream, &mut commands, &events, &config).await {
                    ConnectionEnd::HandleDropped => return,
                    ConnectionEnd::ServerClosed => {
                        last_error = None;
                    },
                    ConnectionEnd::Errored(error) => {
                        tracing::debug!(%error, "realtime channel dropped");
                        last_error = Some(error);
                    },
                }
            },
            Err(error) => {
                if auth_was_rejected(&error) {
                    tracing::warn!("realtime credential rejected; not retrying");
                    let _ = events.send(TransportEvent::AuthRejected).await;
                    let _ = publish_status(
                        &status,
                        &events,
                        ConnectionStatus::Disconnected,
                        Some(error.to_string()),
                    )
                    .await;
                    return;
                }
                first_attempt = false;
                last_error = Some(error.to_string());
            },
        }

        // Fixed delay, every attempt, no cap.
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Forward traffic on an established connection until it ends.
async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    commands: &mut mpsc::Receiver<ClientCommand>,
    events: &mpsc::Sender<TransportEvent>,
    config: &ConnectionConfig,
) -> ConnectionEnd {
    let (mut write, mut read) = stream.split();
    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => match Frame::decode(text.as_str()) {
                    Ok(frame) => {
                        if events.send(TransportEvent::Frame(frame)).await.is_err() {
                            return ConnectionEnd::HandleDropped;
                        }
                    },
                    Err(error) => tracing::warn!(%error, "undecodable frame dropped"),
                },
                Some(Ok(Message::Close(_))) => return ConnectionEnd::ServerClosed,
                // Pongs are answered by tungstenite; binary frames are not
                // part of the contract.
                Some(Ok(_)) => {},
                Some(Err(error)) => return ConnectionEnd::Errored(error.to_string()),
                None => return ConnectionEnd::ServerClosed,
            },
            command = commands.recv() => match command {
                Some(command) => match command.encode() {
                    Ok(text) => {
                        if let Err(error) = write.send(Message::text(text)).await {
                            return ConnectionEnd::Errored(error.to_string());
                        }
                    },
                    Err(error) => tracing::warn!(%error, "command encode failed"),
                },
                None => return ConnectionEnd::HandleDropped,
            },
            _ = heartbeat.tick() => {
                if let Err(error) = write.send(Message::Ping(tungstenite::Bytes::new())).await {
                    return ConnectionEnd::Errored(error.to_string());
                }
            },
        }
    }
}

/// Update the publish gate and notify the session. Returns `false` when the
/// session side is gone.
async fn publish_status(
    status: &watch::Sender<ConnectionStatus>,
    events: &mpsc::Sender<TransportEvent>,
    next: ConnectionStatus,
    last_error: Option<String>,
) -> bool {
    let _ = status.send(next);
    events.send(TransportEvent::Status(ConnectionInfo { status: next, last_error })).await.is_ok()
}

fn build_request(
    url: &str,
    token: &AuthToken,
) -> Result<tungstenite::handshake::client::Request, String> {
    let mut request = url.into_client_request().map_err(|e| e.to_string())?;
    let bearer = http::HeaderValue::from_str(&format!("Bearer {}", token.secret()))
        .map_err(|e| e.to_string())?;
    request.headers_mut().insert(http::header::AUTHORIZATION, bearer);
    Ok(request)
}

fn auth_was_rejected(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::Http(response)
            if matches!(response.status().as_u16(), 401 | 403)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_bearer_header() {
        let request =
            build_request("ws://localhost:8080/api/ws", &AuthToken::new("tok-1")).unwrap();
        let auth = request.headers().get(http::header::AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok-1");
        // Never in the query string.
        assert_eq!(request.uri().query(), None);
    }

    #[test]
    fn bad_url_is_an_error() {
        assert!(build_request("not a url", &AuthToken::new("t")).is_err());
    }
}
