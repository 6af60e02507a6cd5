use std::sync::{Arc, Once};
use std::time::Duration;

use panel_core::{AllowList, FrameEvent, FrameMessage, Note, TabState};
use panel_runtime::{
    frame_pair, spawn_background, spawn_bridge, BridgeConfig, ChannelHub, FrameStub,
    InMemoryTabDirectory,
};
use pretty_assertions::assert_eq;

const ORIGIN: &str = "http://localhost:5176";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(panel_logging::initialize_for_tests);
}

async fn next_message(stub: &mut FrameStub) -> FrameMessage {
    tokio::time::timeout(Duration::from_secs(30), stub.next())
        .await
        .expect("frame message before timeout")
        .expect("frame port alive")
}

async fn next_tab_state(stub: &mut FrameStub) -> TabState {
    match next_message(stub).await {
        FrameMessage::TabStateUpdate(state) => state,
        other => panic!("expected tab state, got {other:?}"),
    }
}

/// Scheduler barrier: lets the spawned contexts drain their queues.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn visit_revisit_and_reconcile_flow() {
    init_logging();
    let hub = ChannelHub::new();
    let directory = Arc::new(InMemoryTabDirectory::new());
    let events = directory.subscribe();
    let background = spawn_background(directory.clone(), events, &hub, AllowList::default());

    let (port, mut stub) = frame_pair(ORIGIN);
    let bridge = spawn_bridge(hub.connector(), port, BridgeConfig::default());

    bridge.frame_loaded();
    assert_eq!(
        next_message(&mut stub).await,
        FrameMessage::ConnectionState { connected: true }
    );
    // Let the handshake round-trip finish before tabs start moving.
    settle().await;

    // First visit: not seen before.
    let first = directory.open("https://github.com/x", "repo");
    let state = next_tab_state(&mut stub).await;
    assert_eq!(
        state,
        TabState {
            url: "https://github.com/x".to_string(),
            title: "repo".to_string(),
            is_allowed: true,
            was_visited: false,
        }
    );

    // Re-activation of the same URL: now a revisit.
    directory.activate(first).expect("activate");
    let state = next_tab_state(&mut stub).await;
    assert!(state.was_visited);

    // A second tab on a disallowed host.
    let second = directory.open("https://notgithub.com/page", "other");
    let state = next_tab_state(&mut stub).await;
    assert!(!state.is_allowed);
    assert!(!state.was_visited);

    // Closing the first tab reconciles the cache: no open tab holds the
    // URL any more, so a later visit is fresh again.
    directory.close(first).expect("close");
    settle().await;

    let _third = directory.open("https://github.com/x", "repo");
    let state = next_tab_state(&mut stub).await;
    assert_eq!(state.url, "https://github.com/x");
    assert!(!state.was_visited);

    // The second tab's URL stayed cached across the reconciliation.
    directory.activate(second).expect("activate");
    let state = next_tab_state(&mut stub).await;
    assert!(state.was_visited);

    background.shutdown();
    bridge.unload();
}

#[tokio::test(start_paused = true)]
async fn pending_snapshot_is_delivered_on_handshake() {
    init_logging();
    let hub = ChannelHub::new();
    let directory = Arc::new(InMemoryTabDirectory::new());
    let events = directory.subscribe();
    let background = spawn_background(directory.clone(), events, &hub, AllowList::default());

    // Tabs load before any panel exists; nothing is emitted anywhere,
    // the background just retains the latest snapshot.
    directory.open("https://github.com/old", "old");
    directory.open("https://github.com/new", "new");
    settle().await;

    let (port, mut stub) = frame_pair(ORIGIN);
    let bridge = spawn_bridge(hub.connector(), port, BridgeConfig::default());
    bridge.frame_loaded();

    assert_eq!(
        next_message(&mut stub).await,
        FrameMessage::ConnectionState { connected: true }
    );
    // The handshake response is the latest pre-connection snapshot.
    let state = next_tab_state(&mut stub).await;
    assert_eq!(state.url, "https://github.com/new");
    assert!(!state.was_visited);

    background.shutdown();
    bridge.unload();
}

#[tokio::test(start_paused = true)]
async fn notes_flow_to_the_background_and_foreign_origins_do_not() {
    init_logging();
    let hub = ChannelHub::new();
    let directory = Arc::new(InMemoryTabDirectory::new());
    let events = directory.subscribe();
    let background = spawn_background(directory.clone(), events, &hub, AllowList::default());

    let (port, mut stub) = frame_pair(ORIGIN);
    let bridge = spawn_bridge(hub.connector(), port, BridgeConfig::default());
    bridge.frame_loaded();
    assert_eq!(
        next_message(&mut stub).await,
        FrameMessage::ConnectionState { connected: true }
    );

    let note = Note {
        text: "check this repo".to_string(),
        timestamp: "2026-08-30 12:00".to_string(),
    };
    // Fire-and-forget in both cases; the foreign-origin post must be
    // discarded before it reaches the channel.
    bridge.frame_posted(
        "https://evil.example",
        FrameEvent::NoteAdded {
            payload: note.clone(),
        },
    );
    bridge.frame_posted(ORIGIN, FrameEvent::NoteAdded { payload: note });
    settle().await;

    // Neither post produces frame traffic, and nothing crashed.
    let outcome = tokio::time::timeout(Duration::from_secs(5), stub.next()).await;
    assert!(outcome.is_err());
    assert!(stub.connected());

    background.shutdown();
    bridge.unload();
}
