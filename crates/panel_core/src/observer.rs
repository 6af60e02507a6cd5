use crate::{AllowList, ChannelMessage, Tab, TabId, TabState, VisitedCache};

/// Background-context state: the visited cache, the allow list and the
/// readiness of the single logical channel. All of it is reconstructible
/// from zero — the background process may be killed and restarted at any
/// time, and a fresh `ObserverState` after restart is the expected case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverState {
    allow_list: AllowList,
    visited: VisitedCache,
    channel_open: bool,
    panel_ready: bool,
    /// At most one snapshot retained while the handshake is incomplete;
    /// only the latest tab matters, so a newer snapshot replaces it.
    pending: Option<TabState>,
}

impl ObserverState {
    pub fn new(allow_list: AllowList) -> Self {
        Self {
            allow_list,
            ..Self::default()
        }
    }

    pub fn visited(&self) -> &VisitedCache {
        &self.visited
    }

    pub fn panel_ready(&self) -> bool {
        self.panel_ready
    }
}

/// Inputs to the observer. Tab lookups happen in the runtime, so raw
/// directory events arrive here either with the tab resolved
/// (`TabLoaded`, `TabFetched`) or as a request to resolve it
/// (`TabActivated` triggers a `GetTab` effect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverMsg {
    /// A channel from the bridge was accepted.
    ChannelConnected,
    /// The channel closed; readiness resets, the cache survives.
    ChannelDisconnected,
    /// Handshake received on the open channel.
    PanelReadyReceived,
    /// A tab finished loading (`tab-updated` with status complete).
    TabLoaded { tab: Tab },
    /// The active tab changed; the tab must be looked up.
    TabActivated { tab_id: TabId },
    /// Result of a `GetTab`/`QueryActiveTab` effect.
    TabFetched { tab: Tab },
    /// A tab closed; the cache needs reconciling against open tabs.
    TabRemoved,
    /// Result of a `QueryOpenTabs` effect.
    OpenTabsListed { open_urls: Vec<String> },
    /// The host surface was disabled; drop all tracked state.
    PanelDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEffect {
    GetTab(TabId),
    QueryActiveTab,
    QueryOpenTabs,
    Send(ChannelMessage),
}

/// Pure update function for the background context.
pub fn update(mut state: ObserverState, msg: ObserverMsg) -> (ObserverState, Vec<ObserverEffect>) {
    let effects = match msg {
        ObserverMsg::ChannelConnected => {
            state.channel_open = true;
            Vec::new()
        }
        ObserverMsg::ChannelDisconnected => {
            state.channel_open = false;
            state.panel_ready = false;
            Vec::new()
        }
        ObserverMsg::PanelReadyReceived => {
            state.panel_ready = true;
            // The handshake only arrives over an open channel.
            state.channel_open = true;
            // One emission is owed immediately after readiness. A pending
            // snapshot is the latest observed state; without one, ask the
            // directory for the active tab.
            match state.pending.take() {
                Some(snapshot) => {
                    vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(snapshot))]
                }
                None => vec![ObserverEffect::QueryActiveTab],
            }
        }
        ObserverMsg::TabLoaded { tab } | ObserverMsg::TabFetched { tab } => {
            visit_tab(&mut state, tab)
        }
        ObserverMsg::TabActivated { tab_id } => vec![ObserverEffect::GetTab(tab_id)],
        ObserverMsg::TabRemoved => vec![ObserverEffect::QueryOpenTabs],
        ObserverMsg::OpenTabsListed { open_urls } => {
            state.visited.evict_closed_tabs(&open_urls.into_iter().collect());
            Vec::new()
        }
        ObserverMsg::PanelDisabled => {
            state.visited.clear();
            state.panel_ready = false;
            state.pending = None;
            Vec::new()
        }
    };

    (state, effects)
}

fn visit_tab(state: &mut ObserverState, tab: Tab) -> Vec<ObserverEffect> {
    let was_visited = state.visited.record_visit(&tab.url);
    let snapshot = TabState {
        is_allowed: state.allow_list.is_allowed(&tab.url),
        title: if tab.title.is_empty() {
            "Untitled".to_string()
        } else {
            tab.title
        },
        url: tab.url,
        was_visited,
    };

    if state.channel_open && state.panel_ready {
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(snapshot))]
    } else {
        state.pending = Some(snapshot);
        Vec::new()
    }
}
