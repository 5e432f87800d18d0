//! Wire protocol for the Pitwall realtime channel.
//!
//! The service-center backend delivers realtime traffic as JSON text frames
//! over a single authenticated WebSocket. Each inbound [`Frame`] carries the
//! destination it was published on plus an [`Envelope`] tagged with an
//! [`EventKind`]; outbound traffic is a small set of [`ClientCommand`]s
//! (subscribe, unsubscribe, send).
//!
//! Frame headers stay cheap to inspect: routing needs only the destination
//! and the envelope tag, never the kind-specific `data` object. Decoding the
//! `data` object into a typed [`EventPayload`] happens after classification,
//! so a malformed payload can be dropped without disturbing routing state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod destination;
mod envelope;
mod errors;
mod payload;

pub use command::{ChatSend, ClientCommand, SubscriptionId};
pub use destination::Destination;
pub use envelope::{Envelope, EventKind, Frame};
pub use errors::{ProtocolError, Result};
pub use payload::{
    AppointmentChange, ChatMessage, EventPayload, NoticeSeverity, ServiceProgress, SystemNotice,
};
