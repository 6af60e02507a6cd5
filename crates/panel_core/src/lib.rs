//! Panel core: pure state machines for tab tracking and connection management.
//!
//! Nothing in this crate performs IO. Each execution context has an
//! `update(state, msg) -> (state, effects)` function; the runtime crate
//! executes the effects and feeds results back in as new messages.
mod allowlist;
mod connection;
mod observer;
mod protocol;
mod visited;

pub use allowlist::{AllowList, MalformedUrl, DEFAULT_ALLOWED_DOMAINS};
pub use connection::{
    update as update_connection, ConnectionEffect, ConnectionManager, ConnectionMsg, LinkState,
    Millis, MAX_RECONNECT_ATTEMPTS, MIN_RECONNECT_INTERVAL_MS, RECONNECT_DELAY_BASE_MS,
};
pub use observer::{update as update_observer, ObserverEffect, ObserverMsg, ObserverState};
pub use protocol::{ChannelMessage, FrameEvent, FrameMessage, Note, Tab, TabId, TabState};
pub use visited::{VisitedCache, MAX_VISITED};
