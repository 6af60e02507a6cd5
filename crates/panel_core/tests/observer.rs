use std::sync::Once;

use panel_core::{
    update_observer, AllowList, ChannelMessage, ObserverEffect, ObserverMsg, ObserverState, Tab,
    TabState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(panel_logging::initialize_for_tests);
}

fn tab(id: u32, url: &str, title: &str) -> Tab {
    Tab {
        id,
        url: url.to_string(),
        title: title.to_string(),
    }
}

fn ready_observer() -> ObserverState {
    let state = ObserverState::new(AllowList::default());
    let (state, _) = update_observer(state, ObserverMsg::ChannelConnected);
    let (state, _) = update_observer(state, ObserverMsg::PanelReadyReceived);
    state
}

#[test]
fn no_emission_before_handshake() {
    init_logging();
    let state = ObserverState::new(AllowList::default());

    let (state, effects) = update_observer(state, ObserverMsg::ChannelConnected);
    assert!(effects.is_empty());

    // Channel open but handshake incomplete: nothing may be sent.
    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn handshake_flushes_the_single_pending_snapshot() {
    init_logging();
    let state = ObserverState::new(AllowList::default());
    let (state, _) = update_observer(state, ObserverMsg::ChannelConnected);

    // Two loads before readiness: only the latest snapshot is retained.
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(1, "https://github.com/old", "old"),
        },
    );
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(2, "https://github.com/new", "new"),
        },
    );

    let (_state, effects) = update_observer(state, ObserverMsg::PanelReadyReceived);
    assert_eq!(
        effects,
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(
            TabState {
                url: "https://github.com/new".to_string(),
                title: "new".to_string(),
                is_allowed: true,
                was_visited: false,
            }
        ))]
    );
}

#[test]
fn handshake_without_pending_queries_the_active_tab() {
    init_logging();
    let state = ObserverState::new(AllowList::default());
    let (state, _) = update_observer(state, ObserverMsg::ChannelConnected);

    let (state, effects) = update_observer(state, ObserverMsg::PanelReadyReceived);
    assert_eq!(effects, vec![ObserverEffect::QueryActiveTab]);

    // The directory reply is emitted as the owed initial update.
    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(3, "https://docs.google.com", ""),
        },
    );
    assert_eq!(
        effects,
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(
            TabState {
                url: "https://docs.google.com".to_string(),
                title: "Untitled".to_string(),
                is_allowed: true,
                was_visited: false,
            }
        ))]
    );
}

#[test]
fn activation_requests_a_lookup_then_reports_revisit() {
    init_logging();
    let state = ready_observer();
    // Initial handshake already queried the active tab; answer it.
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );

    let (state, effects) = update_observer(state, ObserverMsg::TabActivated { tab_id: 1 });
    assert_eq!(effects, vec![ObserverEffect::GetTab(1)]);

    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );
    assert_eq!(
        effects,
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(
            TabState {
                url: "https://github.com/x".to_string(),
                title: "repo".to_string(),
                is_allowed: true,
                was_visited: true,
            }
        ))]
    );
}

#[test]
fn disallowed_page_is_still_tracked_but_flagged() {
    init_logging();
    let state = ready_observer();
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );

    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(2, "https://notgithub.com/page", "other"),
        },
    );
    assert_eq!(
        effects,
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(
            TabState {
                url: "https://notgithub.com/page".to_string(),
                title: "other".to_string(),
                is_allowed: false,
                was_visited: false,
            }
        ))]
    );
}

#[test]
fn tab_removal_reconciles_the_cache() {
    init_logging();
    let state = ready_observer();
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );
    assert!(state.visited().has("https://github.com/x"));

    let (state, effects) = update_observer(state, ObserverMsg::TabRemoved);
    assert_eq!(effects, vec![ObserverEffect::QueryOpenTabs]);

    // No open tab holds the URL any more: it drops out of the cache.
    let (state, _) = update_observer(
        state,
        ObserverMsg::OpenTabsListed {
            open_urls: vec!["https://example.org".to_string()],
        },
    );
    assert!(!state.visited().has("https://github.com/x"));

    // A third visit is a first visit again.
    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(3, "https://github.com/x", "repo"),
        },
    );
    assert_eq!(
        effects,
        vec![ObserverEffect::Send(ChannelMessage::TabStateUpdate(
            TabState {
                url: "https://github.com/x".to_string(),
                title: "repo".to_string(),
                is_allowed: true,
                was_visited: false,
            }
        ))]
    );
}

#[test]
fn disconnect_resets_readiness_but_keeps_the_cache() {
    init_logging();
    let state = ready_observer();
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );

    let (state, effects) = update_observer(state, ObserverMsg::ChannelDisconnected);
    assert!(effects.is_empty());
    assert!(!state.panel_ready());
    assert!(state.visited().has("https://github.com/x"));

    // Events while disconnected are not emitted.
    let (_state, effects) = update_observer(
        state,
        ObserverMsg::TabLoaded {
            tab: tab(2, "https://github.com/y", "other"),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn panel_disabled_drops_all_tracked_state() {
    init_logging();
    let state = ready_observer();
    let (state, _) = update_observer(
        state,
        ObserverMsg::TabFetched {
            tab: tab(1, "https://github.com/x", "repo"),
        },
    );

    let (state, effects) = update_observer(state, ObserverMsg::PanelDisabled);
    assert!(effects.is_empty());
    assert!(state.visited().is_empty());
    assert!(!state.panel_ready());
}
