//! Sans-IO core of the Pitwall realtime client.
//!
//! State machines for connection status, event routing, and notification
//! state. No I/O and no async: callers feed events in and execute the
//! returned actions, and time enters exclusively as method parameters,
//! generic over an `Instant` type so tests drive virtual time.
//!
//! # Components
//!
//! - [`Router`]: subscription lifecycle and frame classification
//! - [`NotificationStore`]: rolling event log plus unread-counter
//!   reconciliation against the server's authoritative counts
//! - [`ConnectionStatus`] / [`ConnectionInfo`]: transport-driven status,
//!   observed by consumers, never written by them

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod connection;
mod error;
mod event;
mod router;
mod store;

pub use connection::{
    ConnectionConfig, ConnectionInfo, ConnectionStatus, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_RECONNECT_DELAY,
};
pub use error::PublishError;
pub use event::InboundEvent;
pub use router::{Router, RouterAction, SessionRole};
pub use store::{
    CounterKind, DEFAULT_LOG_CAP, DEFAULT_POLL_INTERVAL, DEFAULT_SUPPRESSION_WINDOW,
    NotificationStore, StoreAction, StoreConfig, SyncState,
};
