//! Protocol error types.
//!
//! Everything here describes a frame we refuse to process. Per the routing
//! policy these errors are logged and the offending frame dropped; they never
//! propagate past the router.

use thiserror::Error;

use crate::{Destination, EventKind};

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding wire traffic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text was not valid JSON or did not match the envelope shape.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame arrived on a destination this client does not recognize.
    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    /// Envelope tag named a kind that is not admissible on the destination
    /// the frame arrived on.
    #[error("event kind {kind:?} not admissible on {destination}")]
    KindNotAdmissible {
        /// Kind named by the envelope tag.
        kind: EventKind,
        /// Destination the frame arrived on.
        destination: Destination,
    },

    /// The `data` object did not decode into the payload type for its kind.
    #[error("payload decode failed for {kind:?}: {reason}")]
    Payload {
        /// Kind the envelope was tagged with.
        kind: EventKind,
        /// Decoder error description.
        reason: String,
    },

    /// Outbound command could not be serialized.
    #[error("command encode failed: {0}")]
    Encode(String),
}
