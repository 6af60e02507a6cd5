use serde::{Deserialize, Serialize};

pub type TabId = u32;

/// Tab descriptor as handed out by the external Tab Directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub title: String,
}

/// Point-in-time snapshot of the active tab. Never mutated after
/// creation; superseded only by a newer message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabState {
    pub url: String,
    pub title: String,
    pub is_allowed: bool,
    pub was_visited: bool,
}

/// A note captured in the embedded UI. Informational, fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub timestamp: String,
}

/// Messages crossing the channel between background process and bridge.
///
/// The wire encoding mirrors the original extension protocol: a flat JSON
/// object discriminated by a `type` field, e.g.
/// `{"type":"TAB_STATE_UPDATE","url":...,"title":...,"isAllowed":...,"wasVisited":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    /// Handshake: the bridge is ready to receive state. The background
    /// must respond with the current `TabStateUpdate`.
    #[serde(rename = "PANEL_READY")]
    PanelReady,
    #[serde(rename = "TAB_STATE_UPDATE")]
    TabStateUpdate(TabState),
    #[serde(rename = "NOTE_ADDED")]
    NoteAdded { payload: Note },
}

/// Messages the bridge posts into the embedded UI. `ConnectionState`
/// never crosses into the background process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FrameMessage {
    #[serde(rename = "TAB_STATE_UPDATE")]
    TabStateUpdate(TabState),
    #[serde(rename = "CONNECTION_STATE")]
    ConnectionState { connected: bool },
}

/// Messages the embedded UI posts back to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FrameEvent {
    #[serde(rename = "NOTE_ADDED")]
    NoteAdded { payload: Note },
}
