use std::sync::{Arc, Mutex};

use panel_core::ChannelMessage;
use panel_logging::panel_warn;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// No listener is registered; the background process is down.
    #[error("no listener accepts channel '{0}'")]
    OpenFailed(String),
    #[error("channel closed")]
    Closed,
    #[error("bad frame: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One end of an open channel. Messages travel as JSON frames; frames on
/// one endpoint are delivered in send order. Dropping either end closes
/// the pipe for both.
#[derive(Debug)]
pub struct ChannelEndpoint {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelEndpoint {
    pub fn send(&self, message: &ChannelMessage) -> Result<(), ChannelError> {
        let frame = serde_json::to_string(message)?;
        self.tx.send(frame).map_err(|_| ChannelError::Closed)
    }

    /// Next decodable message, or `None` once the peer is gone.
    /// Undecodable frames are logged and skipped.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        while let Some(frame) = self.rx.recv().await {
            match serde_json::from_str(&frame) {
                Ok(message) => return Some(message),
                Err(err) => panel_warn!("channel", "dropping undecodable frame: {err}"),
            }
        }
        None
    }
}

/// A channel accepted on the background side.
pub struct IncomingChannel {
    pub name: String,
    pub endpoint: ChannelEndpoint,
}

/// Shared registry standing in for the extension runtime: the background
/// process registers a listener, the bridging document opens channels
/// against it. Opening fails while no listener is registered, which is
/// exactly the background-process-dead case the bridge must tolerate.
#[derive(Clone, Default)]
pub struct ChannelHub {
    listener: Arc<Mutex<Option<mpsc::UnboundedSender<IncomingChannel>>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the accepting side, replacing any previous listener.
    pub fn listen(&self) -> ChannelListener {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.listener.lock().expect("lock channel hub") = Some(tx);
        ChannelListener { rx }
    }

    /// Deregisters the accepting side; subsequent opens fail.
    pub fn unlisten(&self) {
        *self.listener.lock().expect("lock channel hub") = None;
    }

    pub fn connector(&self) -> Connector {
        Connector { hub: self.clone() }
    }
}

/// Accepting side of the hub, owned by the background task.
pub struct ChannelListener {
    rx: mpsc::UnboundedReceiver<IncomingChannel>,
}

impl ChannelListener {
    /// Next incoming channel, or `None` once deregistered.
    pub async fn accept(&mut self) -> Option<IncomingChannel> {
        self.rx.recv().await
    }
}

/// Opening side of the hub, owned by the bridge task.
#[derive(Clone)]
pub struct Connector {
    hub: ChannelHub,
}

impl Connector {
    pub fn open(&self, name: &str) -> Result<ChannelEndpoint, ChannelError> {
        let guard = self.hub.listener.lock().expect("lock channel hub");
        let Some(listener) = guard.as_ref() else {
            return Err(ChannelError::OpenFailed(name.to_string()));
        };

        let (near_tx, far_rx) = mpsc::unbounded_channel();
        let (far_tx, near_rx) = mpsc::unbounded_channel();
        let near = ChannelEndpoint {
            tx: near_tx,
            rx: near_rx,
        };
        let far = ChannelEndpoint {
            tx: far_tx,
            rx: far_rx,
        };

        listener
            .send(IncomingChannel {
                name: name.to_string(),
                endpoint: far,
            })
            .map_err(|_| ChannelError::OpenFailed(name.to_string()))?;
        Ok(near)
    }
}
