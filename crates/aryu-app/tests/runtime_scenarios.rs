//! End-to-end runtime scenarios under a paused clock.
//!
//! Each test spawns the production runtime against the simulation
//! transport and backend, drives it with intents and server pushes, and
//! checks the rendered views and the standard invariants.

use std::time::Duration;

use aryu_app::{ApiError, ConnectionState, Draft, GENERIC_ERROR_MESSAGE, Intent, START_NOT_PERMITTED};
use aryu_core::ChannelConfig;
use aryu_harness::{InvariantRegistry, SimBackend, SimSession, ViewSnapshot, fixtures};
use aryu_proto::{Item, Resource, SenderRef, ServerEvent};

fn assert_invariants(session: &SimSession, context: &str) {
    InvariantRegistry::standard().assert_all(&session.surface.history(), context);
}

#[tokio::test(start_paused = true)]
async fn open_loads_history_and_applies_pushes() {
    let room = Resource::chat(1);
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "a"), Item::new(2, "b")]);
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(room.clone())).await;
    assert_eq!(session.view().connection(), ConnectionState::Open);
    assert_eq!(session.view().items().len(), 2);

    session.transport.push(&ServerEvent::ChatMessage { message: Item::new(3, "c") });
    SimSession::settle().await;

    let ids: Vec<u64> = session.view().items().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(session.view().unread_count(), 3);

    assert_invariants(&session, "after push");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn switching_resources_discards_stale_responses() {
    let first = Resource::chat(1);
    let second = Resource::chat(2);
    let backend = SimBackend::new()
        .with_items(&first, vec![Item::new(10, "old room")])
        .with_items(&second, vec![Item::new(20, "new room")]);
    backend.set_latency(Duration::from_millis(100));
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(first)).await;
    session.intent(Intent::Open(second.clone())).await;
    SimSession::advance(Duration::from_millis(200)).await;

    let view = session.view();
    assert_eq!(view.resource(), Some(&second));
    assert_eq!(view.items().iter().map(|i| i.id).collect::<Vec<_>>(), vec![20]);
    assert_eq!(session.transport.live_links(), 1);

    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn quit_closes_the_socket() {
    let session = SimSession::start(fixtures::student(), SimBackend::new());

    session.intent(Intent::Open(Resource::notifications(7))).await;
    assert_eq!(session.transport.live_links(), 1);

    let transport = session.transport.clone();
    assert!(session.quit().await);
    assert_eq!(transport.live_links(), 0);
}

#[tokio::test(start_paused = true)]
async fn send_is_optimistic_then_confirmed() {
    let room = Resource::chat(4);
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "hi")]);
    backend.set_latency(Duration::from_millis(50));
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(room.clone())).await;
    SimSession::advance(Duration::from_millis(50)).await;

    session.intent(Intent::Send(Draft::text("hello there"))).await;
    assert_eq!(session.view().pending().len(), 1);
    assert_eq!(session.view().pending()[0].body, "hello there");

    // Send completes, then the follow-up refetch lands.
    SimSession::advance(Duration::from_millis(150)).await;

    let view = session.view();
    assert!(view.pending().is_empty());
    assert_eq!(view.items().iter().map(|i| i.body.as_str()).collect::<Vec<_>>(), vec![
        "hi",
        "hello there"
    ]);
    assert_eq!(session.backend.requests(), vec!["list chat/4", "send chat/4", "list chat/4"]);

    assert_invariants(&session, "after send");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn own_echo_confirms_pending_instead_of_duplicating() {
    let room = Resource::chat(4);
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "hi")]);
    backend.set_latency(Duration::from_millis(100));
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(room)).await;
    SimSession::advance(Duration::from_millis(100)).await;

    session.intent(Intent::Send(Draft::text("hello"))).await;
    assert_eq!(session.view().pending().len(), 1);

    // Broadcast of our own message arrives before the HTTP response.
    let echo = Item::new(2, "hello").with_sender(SenderRef::id(fixtures::student().user_id()));
    session.transport.push(&ServerEvent::ChatMessage { message: echo });
    SimSession::settle().await;

    let bodies = |session: &SimSession| {
        session.view().items().iter().map(|i| i.body.clone()).collect::<Vec<_>>()
    };
    assert!(session.view().pending().is_empty());
    assert_eq!(bodies(&session), vec!["hi", "hello"]);
    assert_invariants(&session, "after echo");

    SimSession::advance(Duration::from_millis(300)).await;
    assert!(session.view().pending().is_empty());
    assert_eq!(bodies(&session), vec!["hi", "hello"]);

    assert_invariants(&session, "after send completes");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn echo_from_another_user_is_a_new_item() {
    let room = Resource::chat(4);
    let backend = SimBackend::new();
    backend.set_latency(Duration::from_millis(100));
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(room)).await;
    SimSession::advance(Duration::from_millis(100)).await;
    session.intent(Intent::Send(Draft::text("hello"))).await;

    let other = Item::new(9, "hello").with_sender(SenderRef::id(1000));
    session.transport.push(&ServerEvent::ChatMessage { message: other });
    SimSession::settle().await;

    assert_eq!(session.view().pending().len(), 1);
    assert_eq!(session.view().items().len(), 1);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn failed_send_toasts_server_message() {
    let room = Resource::chat(4);
    let session = SimSession::start(fixtures::student(), SimBackend::new());
    session.intent(Intent::Open(room)).await;

    session.backend.fail_next(ApiError::Status {
        code: 413,
        message: Some("File too large".into()),
    });
    session.intent(Intent::Send(Draft::text("big"))).await;

    let view = session.view();
    assert!(view.pending().is_empty());
    assert!(view.items().is_empty());
    assert_eq!(view.notice(), Some("File too large"));
    assert_eq!(session.surface.toasts(), vec!["File too large"]);

    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn empty_draft_is_not_sent() {
    let session = SimSession::start(fixtures::student(), SimBackend::new());
    session.intent(Intent::Open(Resource::chat(1))).await;

    session.intent(Intent::Send(Draft::text("   "))).await;

    assert!(session.view().pending().is_empty());
    assert_eq!(session.backend.requests(), vec!["list chat/1"]);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn mark_read_is_reconciled_with_server_copy() {
    let feed = Resource::notifications(7);
    let backend = SimBackend::new().with_items(&feed, vec![Item::new(1, "a"), Item::new(2, "b")]);
    backend.set_latency(Duration::from_millis(20));
    let session = SimSession::start(fixtures::student(), backend);

    session.intent(Intent::Open(feed)).await;
    SimSession::advance(Duration::from_millis(20)).await;
    assert_eq!(session.view().unread_count(), 2);

    session.intent(Intent::MarkRead(1)).await;
    assert_eq!(session.view().unread_count(), 1, "applied before the server answers");

    SimSession::advance(Duration::from_millis(100)).await;
    assert_eq!(session.view().unread_count(), 1);
    assert_eq!(
        session.backend.requests(),
        vec!["list notifications/7", "read notifications/7/1", "get notifications/7/1"]
    );

    assert_invariants(&session, "after mark read");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn failed_mark_all_read_reverts_through_refetch() {
    let feed = Resource::notifications(7);
    let backend = SimBackend::new().with_items(&feed, vec![Item::new(1, "a"), Item::new(2, "b")]);
    let session = SimSession::start(fixtures::student(), backend);
    session.intent(Intent::Open(feed)).await;

    session.backend.fail_next(ApiError::Network("connection reset".into()));
    session.intent(Intent::MarkAllRead).await;
    SimSession::settle().await;

    assert_eq!(session.view().unread_count(), 2);
    assert_eq!(session.surface.toasts(), vec![GENERIC_ERROR_MESSAGE]);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn poll_picks_up_missed_items() {
    let room = Resource::chat(9);
    let session = SimSession::start(fixtures::student(), SimBackend::new());
    session.intent(Intent::Open(room.clone())).await;
    assert!(session.view().items().is_empty());

    // Arrives on the server without a push.
    session.backend.insert(&room, Item::new(1, "missed"));
    SimSession::advance(Duration::from_secs(29)).await;
    assert!(session.view().items().is_empty());

    SimSession::advance(Duration::from_secs(1)).await;
    assert_eq!(session.view().items().len(), 1);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn quiz_timer_waits_for_server_acknowledgment() {
    let quiz = Resource::quiz(3);
    let backend = SimBackend::new()
        .with_questions(&quiz, vec![fixtures::question(0, 10), fixtures::question(1, 10)]);
    let session = SimSession::start(fixtures::admin(), backend);
    session.intent(Intent::Open(quiz)).await;
    assert_eq!(session.view().quiz().questions().len(), 2);

    session.intent(Intent::StartQuestion(0)).await;
    assert_eq!(session.transport.take_sent(), vec![
        r#"{"type":"start_question","question_index":0}"#
    ]);
    assert!(!session.view().quiz().is_running());
    assert_eq!(session.view().quiz().pending_start(), Some(0));

    session.transport.push(&ServerEvent::StartQuestion { question_index: 0 });
    SimSession::settle().await;

    let quiz_state = session.view().quiz().clone();
    assert!(quiz_state.is_running());
    assert_eq!(quiz_state.timer_key(), 1);
    assert_eq!(quiz_state.current_question_index(), Some(0));
    assert_eq!(quiz_state.question().map(|q| q.index), Some(0));
    assert_eq!(quiz_state.pending_start(), None);

    SimSession::advance(Duration::from_secs(10)).await;
    assert!(!session.view().quiz().is_running());

    assert_invariants(&session, "after countdown");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn stale_acknowledgment_is_ignored() {
    let quiz = Resource::quiz(3);
    let session = SimSession::start(fixtures::admin(), SimBackend::new());
    session.intent(Intent::Open(quiz)).await;

    session.transport.push(&ServerEvent::StartQuestion { question_index: 2 });
    session.transport.push(&ServerEvent::StartQuestion { question_index: 1 });
    SimSession::settle().await;

    let quiz_state = session.view().quiz().clone();
    assert_eq!(quiz_state.current_question_index(), Some(2));
    assert_eq!(quiz_state.timer_key(), 1);

    assert_invariants(&session, "after stale ack");
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn student_cannot_start_questions() {
    let session = SimSession::start(fixtures::student(), SimBackend::new());
    session.intent(Intent::Open(Resource::quiz(3))).await;

    session.intent(Intent::StartQuestion(0)).await;

    assert!(session.transport.take_sent().is_empty());
    assert_eq!(session.view().quiz().pending_start(), None);
    assert_eq!(session.surface.toasts(), vec![START_NOT_PERMITTED]);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn start_failure_with_largest_index_is_reported() {
    let session = SimSession::start(fixtures::admin(), SimBackend::new());
    session.transport.refuse_next("connection refused");
    session.intent(Intent::Open(Resource::quiz(1))).await;
    assert_eq!(session.surface.toasts().len(), 1);

    session.intent(Intent::StartQuestion(usize::MAX)).await;

    let toasts = session.surface.toasts();
    assert_eq!(toasts.len(), 2);
    assert!(toasts[1].starts_with(&format!("Could not start question {}", usize::MAX)));
    assert!(session.transport.take_sent().is_empty());
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn refused_connection_still_loads_over_http() {
    let room = Resource::chat(2);
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "a")]);
    let session = SimSession::start(fixtures::student(), backend);
    session.transport.refuse_next("connection refused");

    session.intent(Intent::Open(room)).await;

    let view = session.view();
    assert_eq!(view.connection(), ConnectionState::Error);
    assert_eq!(view.items().len(), 1);
    assert_eq!(session.surface.toasts().len(), 1);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn hanging_connect_gives_up_after_timeout() {
    let room = Resource::chat(2);
    let config = ChannelConfig { connect_timeout: Duration::from_secs(2), ..ChannelConfig::default() };
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "a")]);
    let session = SimSession::start_with(config, fixtures::student(), backend);
    session.transport.hang_next();

    session.intent(Intent::Open(room)).await;
    assert_ne!(session.view().connection(), ConnectionState::Open);
    assert!(session.surface.toasts().is_empty());

    SimSession::advance(Duration::from_secs(2)).await;

    let view = session.view();
    assert_eq!(view.connection(), ConnectionState::Error);
    assert_eq!(view.items().len(), 1);
    assert_eq!(session.surface.toasts().len(), 1);
    assert!(session.quit().await);
}

#[tokio::test(start_paused = true)]
async fn final_view_snapshot() {
    let room = Resource::chat(5);
    let backend = SimBackend::new().with_items(&room, vec![Item::new(1, "welcome").with_read(true)]);
    let session = SimSession::start(fixtures::student(), backend);
    session.intent(Intent::Open(room)).await;
    session.transport.push(&ServerEvent::ChatMessage { message: Item::new(2, "hello") });
    SimSession::settle().await;

    insta::assert_json_snapshot!(ViewSnapshot::capture(&session.view()), @r#"
    {
      "resource": "chat/5",
      "connection": "Open",
      "items": [
        {
          "id": 1,
          "body": "welcome",
          "read": true
        },
        {
          "id": 2,
          "body": "hello",
          "read": false
        }
      ],
      "unread_count": 1,
      "pending": [],
      "notice": null,
      "quiz": {
        "current": null,
        "timer_key": 0,
        "running": false,
        "pending_start": null,
        "question": null
      }
    }
    "#);
    assert!(session.quit().await);
}
