//! Teardown safety: no orphaned timers, sockets, or late mutations.

use std::time::Duration;

use pitwall_client::{AuthToken, ConnectionStatus, Session, SessionConfig, SessionRole};
use pitwall_harness::{SpyApi, scripted_transport};
use pitwall_proto::ClientCommand;

fn config() -> SessionConfig {
    SessionConfig::new(SessionRole::Employee).with_auth(AuthToken::new("tok-1"), "u-9")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// A fetch in flight at shutdown time must never mutate state, and the poll
/// timer must die with the session.
#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_fetch_and_poll_timer() {
    let (transport, script) = scripted_transport();
    let api = SpyApi::new();
    api.set_notification_count(9);
    api.set_latency(Duration::from_millis(500));

    let session = Session::spawn(config(), transport, api.clone());
    let badge = session.unread_badge();
    settle().await;
    // Initial fetch still in flight.
    assert_eq!(badge.notifications(), 0);

    session.shutdown().await;
    assert_eq!(script.shutdown_count(), 1);
    let calls_at_shutdown = api.notification_calls();

    // Let the in-flight fetch resolve and two full poll intervals elapse:
    // its result lands on a closed channel, and no timer fires again.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(badge.notifications(), 0);
    assert_eq!(api.notification_calls(), calls_at_shutdown);
    assert_eq!(api.message_calls(), 1);
}

/// Orderly shutdown of a connected session releases its subscriptions.
#[tokio::test(start_paused = true)]
async fn shutdown_while_connected_unsubscribes_first() {
    let (transport, script) = scripted_transport();
    let session = Session::spawn(config(), transport, SpyApi::new());

    script.set_status(ConnectionStatus::Connected);
    settle().await;
    session.shutdown().await;

    let published = script.published();
    let unsubscribes =
        published.iter().filter(|c| matches!(c, ClientCommand::Unsubscribe { .. })).count();
    assert_eq!(unsubscribes, 2);
    assert_eq!(script.shutdown_count(), 1);
}

/// Dropping the handle outright (no orderly shutdown) still cancels
/// everything.
#[tokio::test(start_paused = true)]
async fn dropped_session_stops_polling() {
    let (transport, _script) = scripted_transport();
    let api = SpyApi::new();

    let session = Session::spawn(config(), transport, api.clone());
    let badge = session.unread_badge();
    settle().await;
    let calls = api.notification_calls();
    assert!(calls >= 1);

    drop(session);
    settle().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.notification_calls(), calls);
    // The watch stays readable with the last published value.
    assert_eq!(badge.notifications(), 0);
}

/// A transport that dies for good surfaces as a disconnected status, not a
/// busy loop or a crash.
#[tokio::test(start_paused = true)]
async fn defunct_transport_reads_as_disconnected() {
    let (transport, script) = scripted_transport();
    let session = Session::spawn(config(), transport, SpyApi::new());
    let badge = session.unread_badge();

    script.set_status(ConnectionStatus::Connected);
    settle().await;
    assert!(badge.connection().status.is_connected());

    drop(script);
    settle().await;
    assert_eq!(badge.connection().status, ConnectionStatus::Disconnected);

    session.shutdown().await;
}
