//! Session runtime for the Pitwall realtime core.
//!
//! One [`Session`] per authenticated user session. The session owns the
//! transport, the router, and the notification store, serializes every
//! mutation through its single event loop, and exposes read-only hooks
//! ([`UnreadBadge`], [`ServiceProgressView`], [`ChatTranscript`]) for UI
//! consumers. Hooks share read access; all writes go through the session's
//! operations.
//!
//! # Seams
//!
//! - [`Transport`]: the realtime connection. Production implementation is
//!   [`WsTransport`] (WebSocket, `transport` feature); tests script their
//!   own.
//! - [`ServiceApi`]: the HTTP counter endpoints. Production implementation
//!   is [`HttpApi`] (`http` feature); tests use a spy.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod config;
mod hooks;
mod session;
mod transport;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "transport")]
mod ws;

pub use api::{ApiError, ServiceApi};
pub use config::{AuthToken, ENV_API_URL, ENV_WS_URL, SessionConfig};
pub use hooks::{ChatTranscript, ServiceProgressView, UnreadBadge};
#[cfg(feature = "http")]
pub use http::HttpApi;
pub use pitwall_core::{
    ConnectionConfig, ConnectionInfo, ConnectionStatus, PublishError, SessionRole, StoreConfig,
    SyncState,
};
pub use session::{LiveEvent, Session, SessionState};
pub use transport::{Transport, TransportEvent};
#[cfg(feature = "transport")]
pub use ws::WsTransport;
