use crate::{ChannelMessage, FrameEvent, FrameMessage};

/// Milliseconds since an arbitrary per-document epoch.
pub type Millis = u64;

/// Base delay for the linear reconnect backoff.
pub const RECONNECT_DELAY_BASE_MS: Millis = 1000;
/// Minimum spacing between externally-triggered connection attempts;
/// bounds reconnect storms from rapid visibility toggling.
pub const MIN_RECONNECT_INTERVAL_MS: Millis = 2000;
/// After this many scheduled retries the manager goes quiet until a new
/// visibility event arrives.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Bridge-context state: the single logical channel to the background
/// process and its reconnection bookkeeping. Lives for the duration of
/// the bridging document; the channel handle and the retry timer are
/// owned exclusively by this machine (via its effects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionManager {
    link: LinkState,
    /// Number of the attempt currently underway or due next, >= 1.
    attempt: u32,
    last_attempt_at: Option<Millis>,
    /// A retry timer is armed. At most one exists at any time.
    retry_pending: bool,
    frame_origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMsg {
    /// The embedded UI finished loading.
    FrameLoaded,
    /// The host surface changed visibility.
    VisibilityChanged { visible: bool },
    /// The channel open call succeeded.
    ChannelOpened,
    /// The channel open call failed; treated as an immediate disconnect.
    ChannelOpenFailed,
    /// The remote end closed the channel.
    ChannelClosed,
    /// The armed retry timer fired.
    RetryElapsed,
    /// A message arrived on the channel.
    ChannelReceived(ChannelMessage),
    /// The embedded UI posted a message; `origin` is as reported by the
    /// transport and is validated here.
    FramePosted { origin: String, event: FrameEvent },
    /// The hosting document is unloading.
    Unload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEffect {
    OpenChannel,
    CloseChannel,
    CancelRetry,
    ScheduleRetry { delay_ms: Millis },
    SendOnChannel(ChannelMessage),
    PostToFrame {
        target_origin: String,
        message: FrameMessage,
    },
}

impl ConnectionManager {
    pub fn new(frame_origin: impl Into<String>) -> Self {
        Self {
            link: LinkState::Disconnected,
            attempt: 1,
            last_attempt_at: None,
            retry_pending: false,
            frame_origin: frame_origin.into(),
        }
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn connected(&self) -> bool {
        self.link == LinkState::Connected
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    fn post(&self, message: FrameMessage) -> ConnectionEffect {
        ConnectionEffect::PostToFrame {
            target_origin: self.frame_origin.clone(),
            message,
        }
    }
}

/// Pure update function for the bridge context. `now` is the document
/// clock in milliseconds; only externally-triggered connects consult it.
pub fn update(
    mut state: ConnectionManager,
    msg: ConnectionMsg,
    now: Millis,
) -> (ConnectionManager, Vec<ConnectionEffect>) {
    let effects = match msg {
        ConnectionMsg::FrameLoaded => begin_connect(&mut state, now),
        ConnectionMsg::VisibilityChanged { visible } => {
            if visible && state.link == LinkState::Disconnected {
                begin_connect(&mut state, now)
            } else {
                Vec::new()
            }
        }
        ConnectionMsg::ChannelOpened => {
            state.link = LinkState::Connected;
            state.attempt = 1;
            vec![
                ConnectionEffect::SendOnChannel(ChannelMessage::PanelReady),
                state.post(FrameMessage::ConnectionState { connected: true }),
            ]
        }
        ConnectionMsg::ChannelOpenFailed | ConnectionMsg::ChannelClosed => {
            state.link = LinkState::Disconnected;
            let mut effects = vec![state.post(FrameMessage::ConnectionState { connected: false })];
            if state.attempt <= MAX_RECONNECT_ATTEMPTS {
                if state.retry_pending {
                    effects.push(ConnectionEffect::CancelRetry);
                }
                effects.push(ConnectionEffect::ScheduleRetry {
                    delay_ms: RECONNECT_DELAY_BASE_MS * Millis::from(state.attempt),
                });
                state.retry_pending = true;
            }
            effects
        }
        ConnectionMsg::RetryElapsed => {
            if !state.retry_pending {
                // A cancelled timer can still deliver a stale fire.
                return (state, Vec::new());
            }
            state.retry_pending = false;
            if state.link == LinkState::Disconnected {
                // Timer-fired attempts bypass the min-interval gate; the
                // gate throttles external triggers, not the backoff itself.
                state.attempt += 1;
                state.last_attempt_at = Some(now);
                state.link = LinkState::Connecting;
                vec![ConnectionEffect::OpenChannel]
            } else {
                Vec::new()
            }
        }
        ConnectionMsg::ChannelReceived(message) => {
            if state.link != LinkState::Connected {
                // A late message can race the disconnect notification.
                // Discard it; connectedness is never inferred from receipt.
                return (state, Vec::new());
            }
            match message {
                ChannelMessage::TabStateUpdate(tab_state) => {
                    vec![state.post(FrameMessage::TabStateUpdate(tab_state))]
                }
                ChannelMessage::PanelReady | ChannelMessage::NoteAdded { .. } => Vec::new(),
            }
        }
        ConnectionMsg::FramePosted { origin, event } => {
            if origin != state.frame_origin {
                return (state, Vec::new());
            }
            match event {
                FrameEvent::NoteAdded { payload } if state.connected() => {
                    vec![ConnectionEffect::SendOnChannel(ChannelMessage::NoteAdded {
                        payload,
                    })]
                }
                // Fire-and-forget: dropped while disconnected.
                FrameEvent::NoteAdded { .. } => Vec::new(),
            }
        }
        ConnectionMsg::Unload => {
            let mut effects = Vec::new();
            if state.retry_pending {
                state.retry_pending = false;
                effects.push(ConnectionEffect::CancelRetry);
            }
            if state.link != LinkState::Disconnected {
                effects.push(ConnectionEffect::CloseChannel);
            }
            state.link = LinkState::Disconnected;
            effects
        }
    };

    (state, effects)
}

/// Disconnected -> Connecting on an external trigger (load or visibility),
/// guarded by the minimum-interval gate. Resets the attempt counter and
/// cancels any armed retry before opening.
fn begin_connect(state: &mut ConnectionManager, now: Millis) -> Vec<ConnectionEffect> {
    if state.link != LinkState::Disconnected {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if state.retry_pending {
        state.retry_pending = false;
        effects.push(ConnectionEffect::CancelRetry);
    }
    state.attempt = 1;

    if let Some(last) = state.last_attempt_at {
        if now.saturating_sub(last) < MIN_RECONNECT_INTERVAL_MS {
            // Suppressed: too soon after the previous attempt. Not an
            // error, just throttling; the manager stays Disconnected.
            return effects;
        }
    }

    state.last_attempt_at = Some(now);
    state.link = LinkState::Connecting;
    effects.push(ConnectionEffect::OpenChannel);
    effects
}
