//! The session provider: one event loop owning transport, router, and store.
//!
//! Exactly one `Session` exists per authenticated session. Consumer hooks
//! share read access through a watch channel and an event broadcast; every
//! mutation funnels through the loop, so writes are serialized without
//! locks. Counter fetches and the read-all call run as spawned tasks
//! reporting back into the loop; a slow poll can therefore overlap a
//! mark-all-read, which is exactly the race the store's suppression window
//! arbitrates. Results arriving after shutdown land on a closed channel and
//! mutate nothing.

use std::collections::HashMap;

use pitwall_core::{
    ConnectionInfo, ConnectionStatus, CounterKind, InboundEvent, NotificationStore, PublishError,
    Router, RouterAction, StoreAction, SyncState,
};
use pitwall_proto::{ChatSend, ClientCommand, Destination, EventPayload, ServiceProgress};
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    ApiError, ServiceApi, SessionConfig,
    hooks::{ChatTranscript, ServiceProgressView, UnreadBadge},
    transport::{Transport, TransportEvent},
};

/// Inbound event stamped with the session's instant type.
pub type LiveEvent = InboundEvent<Instant>;

/// How many recent events the published snapshot retains for "latest N"
/// displays (the badge dropdown).
const RECENT_DISPLAY: usize = 10;

/// Capacity of the live-event broadcast. A lagging transcript skips the
/// overwritten events and logs; notifications are best-effort.
const EVENT_BUFFER: usize = 256;

/// Read-only snapshot of session state published to hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Connection status plus last transport error.
    pub connection: ConnectionInfo,
    /// Store synchronization state.
    pub sync: SyncState,
    /// Authoritative-within-poll-interval unread notification count.
    pub unread_notifications: u64,
    /// Authoritative-within-poll-interval unread direct-message count.
    pub unread_messages: u64,
    /// Set when the server rejected the credential; the owner should run
    /// its re-authentication flow.
    pub auth_rejected: bool,
    /// Most recent events, oldest first.
    pub recent: Vec<LiveEvent>,
    /// Latest service-progress record per project id.
    pub progress: HashMap<String, ServiceProgress>,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            connection: ConnectionInfo::disconnected(),
            sync: SyncState::Uninitialized,
            unread_notifications: 0,
            unread_messages: 0,
            auth_rejected: false,
            recent: Vec::new(),
            progress: HashMap::new(),
        }
    }
}

/// Operations forwarded into the session loop.
enum SessionCommand {
    SendChat {
        receiver_id: String,
        message: String,
        reply: oneshot::Sender<Result<(), PublishError>>,
    },
    MarkAllRead,
    Refresh,
    Shutdown,
}

/// Results of spawned API calls, fed back into the loop.
enum ApiOutcome {
    Count { counter: CounterKind, started_at: Instant, result: Result<u64, ApiError> },
    MarkAllRead { result: Result<(), ApiError> },
}

/// Handle to a running session.
///
/// Dropping the handle aborts the loop; prefer [`Session::shutdown`] for an
/// orderly teardown that unsubscribes first.
#[derive(Debug)]
pub struct Session {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    events: broadcast::Sender<LiveEvent>,
    task: JoinHandle<()>,
}

impl Session {
    /// Start a session over the given transport and API collaborator.
    ///
    /// Must be called from within a tokio runtime. The loop begins with the
    /// initial authoritative count fetches before any realtime activity.
    pub fn spawn<T, A>(config: SessionConfig, transport: T, api: A) -> Self
    where
        T: Transport,
        A: ServiceApi,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(SessionState::initial());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (api_tx, api_rx) = mpsc::channel(16);

        let worker = SessionWorker {
            transport,
            transport_live: true,
            api,
            router: Router::new(config.role),
            store: NotificationStore::new(config.store.clone(), config.user_id.clone()),
            poll_interval: config.store.poll_interval,
            connection: ConnectionInfo::disconnected(),
            auth_rejected: false,
            progress: HashMap::new(),
            state_tx,
            event_tx: event_tx.clone(),
            cmd_rx,
            api_tx,
            api_rx,
        };
        let task = tokio::spawn(worker.run());

        Self { commands: cmd_tx, state: state_rx, events: event_tx, task }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Badge hook: unread counts plus connection status.
    pub fn unread_badge(&self) -> UnreadBadge {
        UnreadBadge::new(self.state.clone())
    }

    /// Progress hook: latest service-progress record per project.
    pub fn service_progress(&self) -> ServiceProgressView {
        ServiceProgressView::new(self.state.clone())
    }

    /// Transcript hook for the conversation with `peer`.
    pub fn chat(&self, peer: impl Into<String>) -> ChatTranscript {
        ChatTranscript::new(peer.into(), self.events.subscribe())
    }

    /// Publish a chat message.
    ///
    /// # Errors
    ///
    /// [`PublishError::NotConnected`] while the connection is down, so the
    /// caller can show its retry affordance; nothing is queued or retried
    /// automatically. [`PublishError::Closed`] once the session is shut
    /// down.
    pub async fn send_chat(
        &self,
        receiver_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), PublishError> {
        let (reply, response) = oneshot::channel();
        let command = SessionCommand::SendChat {
            receiver_id: receiver_id.into(),
            message: message.into(),
            reply,
        };
        if self.commands.send(command).await.is_err() {
            return Err(PublishError::Closed);
        }
        response.await.unwrap_or(Err(PublishError::Closed))
    }

    /// Optimistically clear the notification counter and issue the
    /// mark-all-read call. Best-effort; a no-op once the session is down.
    pub async fn mark_all_read(&self) {
        let _ = self.commands.send(SessionCommand::MarkAllRead).await;
    }

    /// Force an immediate authoritative re-fetch of both counters. Exposed
    /// for moments the embedding shell expects the counts to have changed:
    /// a message read elsewhere in the UI, window focus regained.
    pub async fn refresh_counts(&self) {
        let _ = self.commands.send(SessionCommand::Refresh).await;
    }

    /// Orderly teardown: unsubscribes while the connection is still up, then
    /// cancels the loop, its timers, and the transport. In-flight fetches
    /// become no-ops.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        let _ = (&mut self.task).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What woke the loop up.
enum Wake {
    Command(Option<SessionCommand>),
    Transport(Option<TransportEvent>),
    Api(ApiOutcome),
    Poll,
}

struct SessionWorker<T, A> {
    transport: T,
    transport_live: bool,
    api: A,
    router: Router,
    store: NotificationStore<Instant>,
    poll_interval: std::time::Duration,
    connection: ConnectionInfo,
    auth_rejected: bool,
    progress: HashMap<String, ServiceProgress>,
    state_tx: watch::Sender<SessionState>,
    event_tx: broadcast::Sender<LiveEvent>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    api_tx: mpsc::Sender<ApiOutcome>,
    api_rx: mpsc::Receiver<ApiOutcome>,
}

impl<T, A> SessionWorker<T, A>
where
    T: Transport,
    A: ServiceApi,
{
    async fn run(mut self) {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let actions = self.store.start(Instant::now());
        self.execute_store_actions(actions);
        self.publish_state();

        loop {
            let wake = {
                let Self { transport, transport_live, cmd_rx, api_rx, .. } = &mut self;
                tokio::select! {
                    command = cmd_rx.recv() => Wake::Command(command),
                    event = transport.next_event(), if *transport_live => Wake::Transport(event),
                    Some(outcome) = api_rx.recv() => Wake::Api(outcome),
                    _ = poll.tick() => Wake::Poll,
                }
            };

            match wake {
                Wake::Command(None | Some(SessionCommand::Shutdown)) => {
                    self.teardown().await;
                    break;
                },
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Transport(Some(event)) => self.handle_transport_event(event).await,
                Wake::Transport(None) => {
                    // Transport is defunct; nothing will reconnect it.
                    self.transport_live = false;
                    self.connection.status = ConnectionStatus::Disconnected;
                    let _ = self.router.handle_status(ConnectionStatus::Disconnected);
                    self.publish_state();
                },
                Wake::Api(outcome) => self.handle_api_outcome(outcome),
                Wake::Poll => {
                    let actions = self.store.handle_tick(Instant::now());
                    self.execute_store_actions(actions);
                    self.publish_state();
                },
            }
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendChat { receiver_id, message, reply } => {
                let command = ClientCommand::Send {
                    destination: Destination::ChatSend,
                    body: ChatSend { receiver_id, message },
                };
                let result = self.transport.publish(command).await;
                let _ = reply.send(result);
            },
            SessionCommand::MarkAllRead => {
                let actions = self.store.mark_all_read(Instant::now());
                self.execute_store_actions(actions);
                self.publish_state();
            },
            SessionCommand::Refresh => {
                let actions = self.store.refresh(Instant::now());
                self.execute_store_actions(actions);
                self.publish_state();
            },
            SessionCommand::Shutdown => {},
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Status(info) => {
                tracing::debug!(status = ?info.status, "connection transition");
                self.connection = info.clone();
                let actions = self.router.handle_status(info.status);
                for action in actions {
                    self.execute_router_action(action).await;
                }
                self.publish_state();
            },
            TransportEvent::Frame(frame) => {
                let Some(event) = self.router.classify(frame, Instant::now()) else {
                    return;
                };
                self.track_progress(&event);
                // No receivers is fine; transcripts subscribe lazily.
                let _ = self.event_tx.send(event.clone());
                let actions = self.store.append(event);
                self.execute_store_actions(actions);
                self.publish_state();
            },
            TransportEvent::AuthRejected => {
                tracing::warn!("realtime credential rejected");
                self.auth_rejected = true;
                self.publish_state();
            },
        }
    }

    async fn execute_router_action(&mut self, action: RouterAction) {
        let command = match action {
            RouterAction::Subscribe { id, destination } => {
                ClientCommand::Subscribe { id, destination }
            },
            RouterAction::Unsubscribe { id } => ClientCommand::Unsubscribe { id },
        };
        // A failure here means the connection raced away between the status
        // transition and the publish; the next Connected transition rebinds.
        if let Err(error) = self.transport.publish(command).await {
            tracing::warn!(%error, "subscription command not sent");
        }
    }

    fn execute_store_actions(&mut self, actions: Vec<StoreAction>) {
        for action in actions {
            match action {
                StoreAction::FetchCount(counter) => {
                    let api = self.api.clone();
                    let outcomes = self.api_tx.clone();
                    let started_at = Instant::now();
                    tokio::spawn(async move {
                        let result = match counter {
                            CounterKind::Notifications => api.unread_notification_count().await,
                            CounterKind::Messages => api.unread_message_count().await,
                        };
                        let _ = outcomes
                            .send(ApiOutcome::Count { counter, started_at, result })
                            .await;
                    });
                },
                StoreAction::MarkAllRead => {
                    let api = self.api.clone();
                    let outcomes = self.api_tx.clone();
                    tokio::spawn(async move {
                        let result = api.mark_all_notifications_read().await;
                        let _ = outcomes.send(ApiOutcome::MarkAllRead { result }).await;
                    });
                },
            }
        }
    }

    fn handle_api_outcome(&mut self, outcome: ApiOutcome) {
        match outcome {
            ApiOutcome::Count { counter, started_at, result } => match result {
                Ok(value) => {
                    let _ = self.store.apply_count(counter, value, started_at, Instant::now());
                },
                Err(ApiError::Unauthorized) => {
                    self.auth_rejected = true;
                    self.store.fetch_failed(counter);
                },
                Err(error) => {
                    tracing::debug!(%error, ?counter, "count fetch failed");
                    self.store.fetch_failed(counter);
                },
            },
            ApiOutcome::MarkAllRead { result } => match result {
                Ok(()) => {
                    let actions = self.store.mark_all_read_confirmed();
                    self.execute_store_actions(actions);
                },
                Err(ApiError::Unauthorized) => {
                    self.auth_rejected = true;
                    self.store.mark_all_read_failed();
                },
                Err(error) => {
                    tracing::debug!(%error, "mark-all-read failed");
                    self.store.mark_all_read_failed();
                },
            },
        }
        self.publish_state();
    }

    async fn teardown(&mut self) {
        if self.connection.status.is_connected() {
            let actions = self.router.unsubscribe_all();
            for action in actions {
                self.execute_router_action(action).await;
            }
        }
        self.transport.shutdown();
    }

    fn track_progress(&mut self, event: &LiveEvent) {
        if let EventPayload::ServiceUpdate(progress) = &event.payload {
            self.progress.insert(progress.project_id.clone(), progress.clone());
        }
    }

    fn publish_state(&mut self) {
        let state = SessionState {
            connection: self.connection.clone(),
            sync: self.store.sync_state(),
            unread_notifications: self.store.unread_notifications(),
            unread_messages: self.store.unread_messages(),
            auth_rejected: self.auth_rejected,
            recent: self.store.recent(RECENT_DISPLAY).cloned().collect(),
            progress: self.progress.clone(),
        };
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
