use panel_core::{FrameMessage, TabState};
use panel_logging::panel_warn;
use tokio::sync::mpsc;

/// A scoped cross-document delivery: the message plus the origin it was
/// addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePost {
    pub target_origin: String,
    pub message: FrameMessage,
}

/// Posting side of the scoped cross-document pipe. Delivery is
/// fire-and-forget: posts are silently dropped once the receiving
/// document is gone.
#[derive(Clone)]
pub struct FramePort {
    tx: mpsc::UnboundedSender<FramePost>,
}

impl FramePort {
    pub fn post(&self, target_origin: &str, message: FrameMessage) {
        let _ = self.tx.send(FramePost {
            target_origin: target_origin.to_string(),
            message,
        });
    }
}

/// Embedded-UI stand-in: receives scoped posts, enforces the origin
/// scoping the browser would, and folds messages into the two values the
/// real UI renders from — the connected flag and the latest tab snapshot.
pub struct FrameStub {
    origin: String,
    rx: mpsc::UnboundedReceiver<FramePost>,
    connected: bool,
    last_tab: Option<TabState>,
}

pub fn frame_pair(origin: &str) -> (FramePort, FrameStub) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        FramePort { tx },
        FrameStub {
            origin: origin.to_string(),
            rx,
            connected: false,
            last_tab: None,
        },
    )
}

impl FrameStub {
    /// Next message addressed to this document's origin, or `None` once
    /// the posting side is gone. Posts scoped to any other origin are
    /// dropped without processing.
    pub async fn next(&mut self) -> Option<FrameMessage> {
        while let Some(post) = self.rx.recv().await {
            if post.target_origin != self.origin {
                panel_warn!(
                    panel_logging::FRAME,
                    "dropping post scoped to foreign origin {}",
                    post.target_origin
                );
                continue;
            }
            self.apply(&post.message);
            return Some(post.message);
        }
        None
    }

    fn apply(&mut self, message: &FrameMessage) {
        match message {
            FrameMessage::TabStateUpdate(tab_state) => {
                self.last_tab = Some(tab_state.clone());
            }
            FrameMessage::ConnectionState { connected } => {
                self.connected = *connected;
            }
        }
    }

    /// Sole source of truth for the UI's degraded-state indicator.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn last_tab(&self) -> Option<&TabState> {
        self.last_tab.as_ref()
    }
}
