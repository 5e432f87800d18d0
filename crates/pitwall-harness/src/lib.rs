//! Deterministic test doubles for the Pitwall realtime core.
//!
//! The production session runs over two seams, the realtime
//! [`pitwall_client::Transport`] and the HTTP [`pitwall_client::ServiceApi`].
//! This crate provides scripted implementations of both, so the whole
//! pipeline runs under a paused tokio clock with every interleaving chosen
//! by the test:
//!
//! - [`ScriptedTransport`] / [`TransportScript`]: inject status transitions
//!   and frames, capture published commands.
//! - [`SpyApi`]: scripted count/read-all results with configurable latency
//!   and per-endpoint call counters. Responses are captured at call start,
//!   modeling a server snapshot taken when the request was issued.
//! - [`frames`]: wire-frame builders for the event kinds.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod frames;
mod script;
mod spy;

pub use script::{ScriptedTransport, TransportScript, scripted_transport};
pub use spy::SpyApi;

/// Lock a mutex, recovering from poisoning. The doubles hold locks only for
/// plain reads/writes, so a poisoned lock cannot leave partial state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
