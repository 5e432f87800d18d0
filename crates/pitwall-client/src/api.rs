//! HTTP collaborator seam.

use std::future::Future;

use thiserror::Error;

/// Errors from the counter endpoints.
///
/// Everything except `Unauthorized` is transient for this subsystem: the
/// store keeps its last-known value and retries on the next poll tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Credential missing or rejected. Propagates to the session owner to
    /// force re-authentication.
    #[error("credential missing or rejected")]
    Unauthorized,

    /// Unexpected HTTP status.
    #[error("unexpected status {status}")]
    Status {
        /// Status code returned.
        status: u16,
    },

    /// Request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the contract.
    #[error("response decode failed: {0}")]
    Decode(String),
}

/// The unread-count collaborator contract.
///
/// Implementations attach the bearer credential themselves; when no
/// credential is present they short-circuit to a default/zero result without
/// issuing the call. `Clone` is required because the session runs fetches as
/// spawned tasks so a slow poll can overlap a mark-all-read.
pub trait ServiceApi: Clone + Send + Sync + 'static {
    /// `GET /notifications/unread/count`.
    fn unread_notification_count(&self) -> impl Future<Output = Result<u64, ApiError>> + Send;

    /// `GET /messages/unread/count`.
    fn unread_message_count(&self) -> impl Future<Output = Result<u64, ApiError>> + Send;

    /// `PUT /notifications/read-all`.
    fn mark_all_notifications_read(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}
