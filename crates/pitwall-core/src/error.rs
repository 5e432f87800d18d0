//! Core error types.
//!
//! The only error that crosses the core boundary into calling code is
//! [`PublishError`]: a send attempted while the connection is down fails
//! synchronously so the caller can show a retry affordance. There is no
//! implicit queueing and no automatic retry.

use thiserror::Error;

use crate::ConnectionStatus;

/// Failure to publish on the realtime channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The connection is not currently usable.
    #[error("cannot publish while {status:?}")]
    NotConnected {
        /// Status at the time of the attempt.
        status: ConnectionStatus,
    },

    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,
}
