//! Property tests for the router → store pipeline.
//!
//! Verifies delivery-order preservation and parse resilience under arbitrary
//! frame sequences, with malformed frames interleaved at arbitrary points.

use std::time::Duration;

use chrono::Utc;
use pitwall_core::{ConnectionStatus, NotificationStore, Router, SessionRole, StoreConfig};
use pitwall_proto::{Envelope, EventKind, Frame};
use proptest::prelude::*;

fn chat_frame(id: u32) -> Frame {
    Frame {
        destination: "/user/queue/events".into(),
        envelope: Envelope {
            kind: EventKind::ChatMessage,
            data: serde_json::json!({
                "messageId": format!("m-{id}"),
                "senderId": "u-2",
                "receiverId": "u-9",
                "message": format!("update {id}")
            }),
            timestamp: Utc::now(),
            user_id: Some("u-2".into()),
        },
    }
}

fn malformed_frame() -> Frame {
    Frame {
        destination: "/user/queue/events".into(),
        envelope: Envelope {
            kind: EventKind::ChatMessage,
            // Missing every required chat field.
            data: serde_json::json!({"garbage": true}),
            timestamp: Utc::now(),
            user_id: None,
        },
    }
}

/// Pipeline with a large enough cap that nothing is pruned mid-test.
fn pipeline(cap: usize) -> (Router, NotificationStore<Duration>) {
    let mut router = Router::new(SessionRole::Customer);
    let _ = router.handle_status(ConnectionStatus::Connected);
    let config = StoreConfig { log_cap: cap, ..StoreConfig::default() };
    let mut store = NotificationStore::new(config, Some("u-9".into()));
    let _ = store.start(Duration::ZERO);
    (router, store)
}

proptest! {
    /// Frames delivered on one channel appear in the log in delivery order.
    #[test]
    fn prop_order_preserved(ids in prop::collection::vec(0u32..10_000, 1..40)) {
        // Dedup is by server id, so make ids unique to observe pure ordering.
        let mut unique = ids;
        unique.sort_unstable();
        unique.dedup();

        let (router, mut store) = pipeline(unique.len());
        for (i, id) in unique.iter().enumerate() {
            let event = router
                .classify(chat_frame(*id), Duration::from_millis(i as u64))
                .expect("well-formed frame must classify");
            let _ = store.append(event);
        }

        let logged: Vec<String> = store
            .events()
            .map(|e| e.server_id().expect("chat frames carry ids").to_string())
            .collect();
        let expected: Vec<String> = unique.iter().map(|id| format!("m-{id}")).collect();
        prop_assert_eq!(logged, expected);
    }

    /// Malformed frames are dropped without disturbing surrounding entries.
    #[test]
    fn prop_malformed_frames_dropped(
        ids in prop::collection::vec(0u32..10_000, 1..20),
        bad_positions in prop::collection::vec(0usize..20, 0..5),
    ) {
        let mut unique = ids;
        unique.sort_unstable();
        unique.dedup();

        let (router, mut store) = pipeline(unique.len());
        let mut delivered = 0u64;
        for (i, id) in unique.iter().enumerate() {
            if bad_positions.contains(&i) {
                let dropped = router.classify(malformed_frame(), Duration::from_millis(delivered));
                prop_assert!(dropped.is_none());
            }
            let event = router
                .classify(chat_frame(*id), Duration::from_millis(delivered))
                .expect("well-formed frame must classify");
            let _ = store.append(event);
            delivered += 1;
        }

        prop_assert_eq!(store.len(), unique.len());
    }
}

/// One malformed frame between two well-formed ones yields exactly two
/// entries.
#[test]
fn malformed_between_two_well_formed() {
    let (router, mut store) = pipeline(10);

    for frame in [chat_frame(1), malformed_frame(), chat_frame(2)] {
        if let Some(event) = router.classify(frame, Duration::ZERO) {
            let _ = store.append(event);
        }
    }

    let ids: Vec<_> = store.events().filter_map(|e| e.server_id()).collect();
    assert_eq!(ids, vec!["m-1", "m-2"]);
}

/// A duplicate subscribe attempt creates no second delivery path: after two
/// `Connected` transitions, one frame still lands exactly once.
#[test]
fn duplicate_subscribe_delivers_once() {
    let mut router = Router::new(SessionRole::Employee);
    let first = router.handle_status(ConnectionStatus::Connected);
    assert_eq!(first.len(), 2);
    assert!(router.handle_status(ConnectionStatus::Connected).is_empty());

    let mut store = NotificationStore::new(StoreConfig::default(), None);
    let _ = store.start(Duration::ZERO);
    if let Some(event) = router.classify(chat_frame(7), Duration::ZERO) {
        let _ = store.append(event);
    }
    assert_eq!(store.len(), 1);
}
