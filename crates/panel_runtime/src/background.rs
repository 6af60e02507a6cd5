use std::collections::VecDeque;
use std::sync::Arc;

use panel_core::{
    update_observer, AllowList, ChannelMessage, ObserverEffect, ObserverMsg, ObserverState,
};
use panel_logging::{panel_debug, panel_info, panel_warn, BACKGROUND};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::{ChannelEndpoint, ChannelHub};
use crate::directory::{LoadStatus, TabDirectory, TabEvent};

enum Control {
    PanelEnabled(bool),
    Shutdown,
}

/// Handle to the background task. `kill` simulates the host terminating
/// the service worker: the task dies mid-flight and all its state is
/// gone; a later `spawn_background` on the same hub is the restart.
pub struct BackgroundHandle {
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
    hub: ChannelHub,
}

impl BackgroundHandle {
    /// Signals that the host surface was enabled or disabled.
    pub fn set_panel_enabled(&self, enabled: bool) {
        let _ = self.control.send(Control::PanelEnabled(enabled));
    }

    /// Orderly shutdown.
    pub fn shutdown(&self) {
        let _ = self.control.send(Control::Shutdown);
    }

    /// Abrupt termination, as the browser would do to an idle worker.
    pub fn kill(self) {
        self.hub.unlisten();
        self.task.abort();
    }
}

/// Spawns the background context: owns the observer state and the single
/// accepted channel, reacts to tab lifecycle events, and executes the
/// observer's effects against the directory.
pub fn spawn_background(
    directory: Arc<dyn TabDirectory>,
    mut tab_events: mpsc::UnboundedReceiver<TabEvent>,
    hub: &ChannelHub,
    allow_list: AllowList,
) -> BackgroundHandle {
    let mut listener = hub.listen();
    let (control_tx, mut control_rx) = mpsc::unbounded_channel();
    let hub_clone = hub.clone();

    let task = tokio::spawn(async move {
        panel_info!(BACKGROUND, "starting");
        let mut state = ObserverState::new(allow_list);
        let mut channel: Option<ChannelEndpoint> = None;

        loop {
            tokio::select! {
                incoming = listener.accept() => match incoming {
                    Some(incoming) => {
                        panel_info!(BACKGROUND, "channel '{}' connected", incoming.name);
                        if channel.is_some() {
                            // Single logical channel: a new connection
                            // supersedes the old one.
                            dispatch(&mut state, &mut channel, directory.as_ref(),
                                ObserverMsg::ChannelDisconnected).await;
                        }
                        channel = Some(incoming.endpoint);
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::ChannelConnected).await;
                    }
                    None => break,
                },
                message = next_message(&mut channel) => match message {
                    Some(ChannelMessage::PanelReady) => {
                        panel_debug!(BACKGROUND, "panel ready");
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::PanelReadyReceived).await;
                    }
                    Some(ChannelMessage::NoteAdded { payload }) => {
                        // Informational, fire-and-forget.
                        panel_info!(BACKGROUND, "note added at {}: {}",
                            payload.timestamp, payload.text);
                    }
                    Some(other) => {
                        panel_warn!(BACKGROUND, "unexpected channel message: {other:?}");
                    }
                    None => {
                        panel_warn!(BACKGROUND, "channel disconnected");
                        channel = None;
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::ChannelDisconnected).await;
                    }
                },
                event = tab_events.recv() => match event {
                    Some(TabEvent::Updated { status: LoadStatus::Complete, tab, .. }) => {
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::TabLoaded { tab }).await;
                    }
                    Some(TabEvent::Updated { .. }) => {}
                    Some(TabEvent::Activated { id }) => {
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::TabActivated { tab_id: id }).await;
                    }
                    Some(TabEvent::Removed { .. }) => {
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::TabRemoved).await;
                    }
                    None => break,
                },
                ctl = control_rx.recv() => match ctl {
                    Some(Control::PanelEnabled(false)) => {
                        panel_info!(BACKGROUND, "panel disabled, clearing state");
                        dispatch(&mut state, &mut channel, directory.as_ref(),
                            ObserverMsg::PanelDisabled).await;
                    }
                    Some(Control::PanelEnabled(true)) => {}
                    Some(Control::Shutdown) | None => break,
                },
            }
        }
        panel_info!(BACKGROUND, "stopping");
    });

    BackgroundHandle {
        control: control_tx,
        task,
        hub: hub_clone,
    }
}

async fn next_message(channel: &mut Option<ChannelEndpoint>) -> Option<ChannelMessage> {
    match channel {
        Some(endpoint) => endpoint.recv().await,
        None => std::future::pending().await,
    }
}

/// Runs one message through the observer, executing effects; effects that
/// produce answers feed them back in until the queue drains. Lookup
/// failures are logged and skip the event — the cache is never touched
/// for a tab that could not be read.
async fn dispatch(
    state: &mut ObserverState,
    channel: &mut Option<ChannelEndpoint>,
    directory: &dyn TabDirectory,
    msg: ObserverMsg,
) {
    let mut queue = VecDeque::from([msg]);
    while let Some(msg) = queue.pop_front() {
        let (next, effects) = update_observer(std::mem::take(state), msg);
        *state = next;

        for effect in effects {
            match effect {
                ObserverEffect::GetTab(id) => match directory.get_tab(id).await {
                    Ok(tab) => queue.push_back(ObserverMsg::TabFetched { tab }),
                    Err(err) => panel_warn!(BACKGROUND, "tab lookup failed: {err}"),
                },
                ObserverEffect::QueryActiveTab => match directory.query_active_tab().await {
                    Ok(Some(tab)) => queue.push_back(ObserverMsg::TabFetched { tab }),
                    Ok(None) => {}
                    Err(err) => panel_warn!(BACKGROUND, "active tab lookup failed: {err}"),
                },
                ObserverEffect::QueryOpenTabs => match directory.get_all_tabs().await {
                    Ok(tabs) => queue.push_back(ObserverMsg::OpenTabsListed {
                        open_urls: tabs.into_iter().map(|tab| tab.url).collect(),
                    }),
                    Err(err) => panel_warn!(BACKGROUND, "open tab query failed: {err}"),
                },
                ObserverEffect::Send(message) => {
                    if let Some(endpoint) = channel.as_ref() {
                        if let Err(err) = endpoint.send(&message) {
                            panel_warn!(BACKGROUND, "send failed: {err}");
                            *channel = None;
                            queue.push_back(ObserverMsg::ChannelDisconnected);
                        }
                    }
                }
            }
        }
    }
}
