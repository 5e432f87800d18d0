//! Spy implementation of the counter endpoints.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use pitwall_client::{ApiError, ServiceApi};

use crate::lock;

struct Inner {
    notifications: Mutex<Result<u64, ApiError>>,
    messages: Mutex<Result<u64, ApiError>>,
    mark_result: Mutex<Result<(), ApiError>>,
    latency: Mutex<Duration>,
    notification_calls: AtomicUsize,
    message_calls: AtomicUsize,
    mark_calls: AtomicUsize,
}

/// Scripted [`ServiceApi`] with per-endpoint call counters.
///
/// Responses are captured when the call starts and returned after the
/// configured latency, matching the server snapshot a real request carries.
/// That is what lets tests stage the mark-all-read race: start a slow poll,
/// change the scripted value, and watch the stale snapshot arrive late.
#[derive(Clone)]
pub struct SpyApi {
    inner: Arc<Inner>,
}

impl Default for SpyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SpyApi {
    /// Spy answering zero on every counter with no latency.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                notifications: Mutex::new(Ok(0)),
                messages: Mutex::new(Ok(0)),
                mark_result: Mutex::new(Ok(())),
                latency: Mutex::new(Duration::ZERO),
                notification_calls: AtomicUsize::new(0),
                message_calls: AtomicUsize::new(0),
                mark_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Script the notification counter.
    pub fn set_notification_count(&self, count: u64) {
        *lock(&self.inner.notifications) = Ok(count);
    }

    /// Script the message counter.
    pub fn set_message_count(&self, count: u64) {
        *lock(&self.inner.messages) = Ok(count);
    }

    /// Fail both counter endpoints.
    pub fn fail_counts(&self, error: ApiError) {
        *lock(&self.inner.notifications) = Err(error.clone());
        *lock(&self.inner.messages) = Err(error);
    }

    /// Script the read-all result.
    pub fn set_mark_result(&self, result: Result<(), ApiError>) {
        *lock(&self.inner.mark_result) = result;
    }

    /// Delay every response by `latency` (virtual time under a paused
    /// clock).
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.inner.latency) = latency;
    }

    /// Calls made to `GET /notifications/unread/count`.
    pub fn notification_calls(&self) -> usize {
        self.inner.notification_calls.load(Ordering::SeqCst)
    }

    /// Calls made to `GET /messages/unread/count`.
    pub fn message_calls(&self) -> usize {
        self.inner.message_calls.load(Ordering::SeqCst)
    }

    /// Calls made to `PUT /notifications/read-all`.
    pub fn mark_calls(&self) -> usize {
        self.inner.mark_calls.load(Ordering::SeqCst)
    }

    /// Calls across all three endpoints.
    pub fn total_calls(&self) -> usize {
        self.notification_calls() + self.message_calls() + self.mark_calls()
    }

    async fn respond<T>(&self, captured: T) -> T {
        let latency = *lock(&self.inner.latency);
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }
        captured
    }
}

impl ServiceApi for SpyApi {
    async fn unread_notification_count(&self) -> Result<u64, ApiError> {
        self.inner.notification_calls.fetch_add(1, Ordering::SeqCst);
        let captured = lock(&self.inner.notifications).clone();
        self.respond(captured).await
    }

    async fn unread_message_count(&self) -> Result<u64, ApiError> {
        self.inner.message_calls.fetch_add(1, Ordering::SeqCst);
        let captured = lock(&self.inner.messages).clone();
        self.respond(captured).await
    }

    async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        self.inner.mark_calls.fetch_add(1, Ordering::SeqCst);
        let captured = lock(&self.inner.mark_result).clone();
        self.respond(captured).await
    }
}
