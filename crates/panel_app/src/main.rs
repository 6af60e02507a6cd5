//! Scripted walkthrough of the sidepanel synchronization stack.
//!
//! Stands up the three contexts in-process — background observer, bridge,
//! and an embedded-UI stand-in — then drives a short browsing session
//! including a background-process kill and recovery.

mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use panel_core::{AllowList, FrameEvent, FrameMessage, Note};
use panel_logging::{panel_info, FRAME};
use panel_runtime::{
    frame_pair, spawn_background, spawn_bridge, BridgeConfig, ChannelHub, FrameStub,
    InMemoryTabDirectory,
};

fn main() -> Result<()> {
    logging::initialize(false);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(run())
}

async fn run() -> Result<()> {
    let config = BridgeConfig::default();
    let hub = ChannelHub::new();
    let directory = Arc::new(InMemoryTabDirectory::new());

    let events = directory.subscribe();
    let background = spawn_background(directory.clone(), events, &hub, AllowList::default());

    let (port, mut stub) = frame_pair(&config.frame_origin);
    let bridge = spawn_bridge(hub.connector(), port, config.clone());

    bridge.frame_loaded();
    drain(&mut stub).await;

    let repo = directory.open("https://github.com/rust-lang/rust", "rust-lang/rust");
    drain(&mut stub).await;

    // Revisit: the cache remembers the URL.
    directory
        .activate(repo)
        .context("activate the repo tab")?;
    drain(&mut stub).await;

    let blog = directory.open("https://notgithub.com/post", "someone's blog");
    drain(&mut stub).await;

    // A note typed into the embedded UI travels back to the background.
    bridge.frame_posted(
        &config.frame_origin,
        FrameEvent::NoteAdded {
            payload: Note {
                text: "interesting compiler issue".to_string(),
                timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        },
    );
    drain(&mut stub).await;

    // The browser reclaims the idle service worker. The bridge notices,
    // retries, gives up, and recovers on the next visibility change.
    background.kill();
    tokio::time::sleep(Duration::from_secs(8)).await;
    drain(&mut stub).await;

    let events = directory.subscribe();
    let background = spawn_background(directory.clone(), events, &hub, AllowList::default());
    bridge.visibility_changed(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    directory.close(blog).context("close the blog tab")?;
    directory
        .activate(repo)
        .context("activate the repo tab")?;
    drain(&mut stub).await;

    panel_info!(
        FRAME,
        "final view: connected={} tab={:?}",
        stub.connected(),
        stub.last_tab().map(|t| t.url.as_str())
    );

    background.shutdown();
    bridge.join().await;
    Ok(())
}

/// Pulls every message currently queued for the embedded UI and logs it
/// the way the real panel would render it.
async fn drain(stub: &mut FrameStub) {
    // Give the contexts a moment to settle before reading.
    tokio::time::sleep(Duration::from_millis(50)).await;
    loop {
        let next = tokio::time::timeout(Duration::from_millis(50), stub.next()).await;
        match next {
            Ok(Some(FrameMessage::TabStateUpdate(state))) => {
                panel_info!(
                    FRAME,
                    "tab: {} ({}) allowed={} revisit={}",
                    state.title,
                    state.url,
                    state.is_allowed,
                    state.was_visited
                );
            }
            Ok(Some(FrameMessage::ConnectionState { connected })) => {
                panel_info!(FRAME, "connection: {connected}");
            }
            Ok(None) | Err(_) => break,
        }
    }
}
