//! Notification store: rolling event log and unread-counter reconciliation.
//!
//! The store is the single writer for notification state. It never derives
//! the unread count from the log; the server's count endpoints stay the
//! source of truth, and the store's job is reconciling local optimism
//! against them.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──start──> Syncing ──count──> Idle <──poll due── (tick)
//!                             ^                 │
//!                             │                 │ mark_all_read
//!                        confirm fetch          v
//!                             └────────────── Marking
//! ```
//!
//! The one explicit ordering rule in the whole pipeline lives here: a count
//! fetch that STARTED before the last optimistic clear is discarded even if
//! it completes after it, for as long as the suppression window is open.
//! Once the window elapses, the next result is trusted unconditionally.

use std::{collections::VecDeque, ops::Sub, time::Duration};

use crate::InboundEvent;

/// Interval between authoritative count polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How long after an optimistic clear stale poll results are discarded.
/// A fixed constant, not request sequence numbers; preserved from the
/// source design.
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(2);

/// Maximum number of events retained in the log.
pub const DEFAULT_LOG_CAP: usize = 50;

/// Store tuning knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between authoritative count polls.
    pub poll_interval: Duration,
    /// Race-suppression window after an optimistic clear.
    pub suppression_window: Duration,
    /// Maximum events retained in the log.
    pub log_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
            log_cap: DEFAULT_LOG_CAP,
        }
    }
}

/// Synchronization state of the store against the server counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No fetch issued yet; counters read zero.
    Uninitialized,
    /// A count fetch is outstanding.
    Syncing,
    /// Steady state between polls.
    Idle,
    /// A mark-all-read is in flight awaiting its confirm fetch.
    Marking,
}

/// Which server counter an action or result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// `GET /notifications/unread/count`.
    Notifications,
    /// `GET /messages/unread/count`.
    Messages,
}

/// I/O the store asks the caller to perform.
///
/// The store never fetches anything itself; the session executes these and
/// feeds results back through [`NotificationStore::apply_count`] and the
/// mark-all-read callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// Fetch the authoritative value of a counter, recording the instant the
    /// fetch starts.
    FetchCount(CounterKind),
    /// Issue the mark-all-read request.
    MarkAllRead,
}

/// One unread counter with race suppression against stale polls.
#[derive(Debug, Clone)]
struct UnreadCounter<I> {
    value: u64,
    cleared_at: Option<I>,
    window: Duration,
}

impl<I> UnreadCounter<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn new(window: Duration) -> Self {
        Self { value: 0, cleared_at: None, window }
    }

    /// Apply an authoritative result. Returns `false` when the result is
    /// discarded because it raced an optimistic clear.
    fn apply(&mut self, value: u64, started_at: I, now: I) -> bool {
        if let Some(cleared_at) = self.cleared_at
            && started_at < cleared_at
            && now - cleared_at < self.window
        {
            return false;
        }
        self.value = value;
        true
    }

    fn clear(&mut self, now: I) {
        self.value = 0;
        self.cleared_at = Some(now);
    }
}

/// Session-scoped notification state: the rolling event log and the two
/// unread counters, reconciled against the server.
///
/// Generic over `I` (instant type); time enters only as method parameters,
/// so tests drive virtual instants.
#[derive(Debug)]
pub struct NotificationStore<I> {
    config: StoreConfig,
    session_user: Option<String>,
    log: VecDeque<InboundEvent<I>>,
    notifications: UnreadCounter<I>,
    messages: UnreadCounter<I>,
    sync: SyncState,
    last_poll_at: Option<I>,
}

impl<I> NotificationStore<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an uninitialized store.
    ///
    /// `session_user` is the authenticated user id, used to recognize echoes
    /// of this session's own actions; `None` for unauthenticated sessions.
    pub fn new(config: StoreConfig, session_user: Option<String>) -> Self {
        let window = config.suppression_window;
        Self {
            config,
            session_user,
            log: VecDeque::new(),
            notifications: UnreadCounter::new(window),
            messages: UnreadCounter::new(window),
            sync: SyncState::Uninitialized,
            last_poll_at: None,
        }
    }

    /// Begin synchronizing: issues the initial authoritative fetches and
    /// starts the poll schedule.
    pub fn start(&mut self, now: I) -> Vec<StoreAction> {
        self.sync = SyncState::Syncing;
        self.last_poll_at = Some(now);
        vec![
            StoreAction::FetchCount(CounterKind::Notifications),
            StoreAction::FetchCount(CounterKind::Messages),
        ]
    }

    /// Periodic tick. Emits fetches when the poll interval has elapsed;
    /// otherwise a no-op. Ticks before [`NotificationStore::start`] are
    /// ignored.
    pub fn handle_tick(&mut self, now: I) -> Vec<StoreAction> {
        let Some(last) = self.last_poll_at else {
            return Vec::new();
        };
        if now - last < self.config.poll_interval {
            return Vec::new();
        }
        self.last_poll_at = Some(now);
        if self.sync == SyncState::Idle {
            self.sync = SyncState::Syncing;
        }
        vec![
            StoreAction::FetchCount(CounterKind::Notifications),
            StoreAction::FetchCount(CounterKind::Messages),
        ]
    }

    /// Append a routed event to the log.
    ///
    /// Events carrying a server id already present in the log are dropped as
    /// duplicates. Unread-relevant events trigger a counter re-sync rather
    /// than a local increment; the server stays the source of truth.
    pub fn append(&mut self, event: InboundEvent<I>) -> Vec<StoreAction> {
        if let Some(id) = event.server_id()
            && self.log.iter().any(|seen| seen.server_id() == Some(id))
        {
            tracing::debug!(server_id = id, "duplicate event dropped");
            return Vec::new();
        }

        let relevant = event.counts_as_unread(self.session_user.as_deref());
        self.log.push_back(event);
        while self.log.len() > self.config.log_cap {
            self.log.pop_front();
        }

        if !relevant {
            return Vec::new();
        }
        if self.sync == SyncState::Idle {
            self.sync = SyncState::Syncing;
        }
        vec![
            StoreAction::FetchCount(CounterKind::Notifications),
            StoreAction::FetchCount(CounterKind::Messages),
        ]
    }

    /// Optimistically clear the notification counter and request the
    /// mark-all-read call.
    ///
    /// Every poll result that started before `now` is suppressed for the
    /// configured window; the confirm fetch issued on
    /// [`NotificationStore::mark_all_read_confirmed`] re-synchronizes.
    pub fn mark_all_read(&mut self, now: I) -> Vec<StoreAction> {
        self.notifications.clear(now);
        self.sync = SyncState::Marking;
        vec![StoreAction::MarkAllRead]
    }

    /// The mark-all-read call succeeded; issue the confirm fetch.
    pub fn mark_all_read_confirmed(&mut self) -> Vec<StoreAction> {
        self.sync = SyncState::Syncing;
        vec![StoreAction::FetchCount(CounterKind::Notifications)]
    }

    /// The mark-all-read call failed. The optimistic zero stands; the next
    /// trusted poll restores the authoritative value. Notifications are
    /// best-effort, so nothing is surfaced.
    pub fn mark_all_read_failed(&mut self) {
        tracing::warn!("mark-all-read failed; awaiting next poll");
        self.sync = SyncState::Idle;
    }

    /// Force an immediate authoritative fetch of both counters, bypassing
    /// the poll interval. Used after actions expected to change the counts,
    /// e.g. reading a message elsewhere in the UI or regaining focus.
    pub fn refresh(&mut self, now: I) -> Vec<StoreAction> {
        self.last_poll_at = Some(now);
        if matches!(self.sync, SyncState::Uninitialized | SyncState::Idle) {
            self.sync = SyncState::Syncing;
        }
        vec![
            StoreAction::FetchCount(CounterKind::Notifications),
            StoreAction::FetchCount(CounterKind::Messages),
        ]
    }

    /// Apply an authoritative count result.
    ///
    /// `started_at` is the instant the fetch was issued. Returns `false`
    /// when the result was discarded by race suppression.
    pub fn apply_count(&mut self, counter: CounterKind, value: u64, started_at: I, now: I) -> bool {
        let accepted = match counter {
            CounterKind::Notifications => self.notifications.apply(value, started_at, now),
            CounterKind::Messages => self.messages.apply(value, started_at, now),
        };
        if !accepted {
            tracing::debug!(?counter, value, "stale poll discarded inside suppression window");
        }
        if self.sync == SyncState::Syncing {
            self.sync = SyncState::Idle;
        }
        accepted
    }

    /// A count fetch failed. The previous value stays in place
    /// (stale-but-available) and the fetch is retried on the next poll tick;
    /// never surfaced as a consumer-facing error.
    pub fn fetch_failed(&mut self, counter: CounterKind) {
        tracing::warn!(?counter, "count fetch failed; keeping last value");
        if self.sync == SyncState::Syncing {
            self.sync = SyncState::Idle;
        }
    }

    /// Current unread notification count.
    pub fn unread_notifications(&self) -> u64 {
        self.notifications.value
    }

    /// Current unread direct-message count.
    pub fn unread_messages(&self) -> u64 {
        self.messages.value
    }

    /// Current synchronization state.
    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &InboundEvent<I>> {
        self.log.iter()
    }

    /// The most recent `n` events, oldest first within the slice.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &InboundEvent<I>> {
        self.log.iter().skip(self.log.len().saturating_sub(n))
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
