use std::collections::VecDeque;
use std::time::Duration;

use panel_core::{
    update_connection, ConnectionEffect, ConnectionManager, ConnectionMsg, FrameEvent, Millis,
};
use panel_logging::{panel_debug, panel_info, panel_warn, BRIDGE};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::channel::{ChannelEndpoint, Connector};
use crate::frame::FramePort;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Name the channel is opened under.
    pub channel_name: String,
    /// Origin the embedded UI is served from; the fixed target for every
    /// outbound post and the required origin for every inbound one.
    pub frame_origin: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: "sidepanel".to_string(),
            frame_origin: "http://localhost:5176".to_string(),
        }
    }
}

/// External inputs to the bridge task, mirroring the document events the
/// real bridging page would see.
enum BridgeInput {
    FrameLoaded,
    VisibilityChanged { visible: bool },
    FramePosted { origin: String, event: FrameEvent },
    Unload,
}

pub struct BridgeHandle {
    input: mpsc::UnboundedSender<BridgeInput>,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    /// The embedded UI finished loading; triggers the initial connect.
    pub fn frame_loaded(&self) {
        let _ = self.input.send(BridgeInput::FrameLoaded);
    }

    pub fn visibility_changed(&self, visible: bool) {
        let _ = self.input.send(BridgeInput::VisibilityChanged { visible });
    }

    /// A message posted by the embedded UI, with its reported origin.
    pub fn frame_posted(&self, origin: &str, event: FrameEvent) {
        let _ = self.input.send(BridgeInput::FramePosted {
            origin: origin.to_string(),
            event,
        });
    }

    /// Document unload: cancels the retry timer, closes the channel and
    /// stops the task.
    pub fn unload(self) {
        let _ = self.input.send(BridgeInput::Unload);
    }

    pub async fn join(self) {
        let _ = self.input.send(BridgeInput::Unload);
        let _ = self.task.await;
    }
}

/// Spawns the bridging-document context: owns the connection manager, the
/// channel handle and the single retry timer, and relays state to the
/// embedded UI through the frame port.
pub fn spawn_bridge(connector: Connector, frame_port: FramePort, config: BridgeConfig) -> BridgeHandle {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        panel_info!(BRIDGE, "starting, frame origin {}", config.frame_origin);
        let start = Instant::now();
        let mut runtime = BridgeRuntime {
            manager: ConnectionManager::new(config.frame_origin.clone()),
            endpoint: None,
            retry: None,
            connector,
            frame_port,
            channel_name: config.channel_name,
        };
        let (retry_tx, mut retry_rx) = mpsc::unbounded_channel::<()>();

        loop {
            tokio::select! {
                input = input_rx.recv() => {
                    let msg = match input {
                        Some(BridgeInput::FrameLoaded) => ConnectionMsg::FrameLoaded,
                        Some(BridgeInput::VisibilityChanged { visible }) => {
                            ConnectionMsg::VisibilityChanged { visible }
                        }
                        Some(BridgeInput::FramePosted { origin, event }) => {
                            ConnectionMsg::FramePosted { origin, event }
                        }
                        Some(BridgeInput::Unload) | None => ConnectionMsg::Unload,
                    };
                    let unloading = msg == ConnectionMsg::Unload;
                    runtime.dispatch(msg, now_ms(start), &retry_tx);
                    if unloading {
                        break;
                    }
                }
                _ = retry_rx.recv() => {
                    runtime.dispatch(ConnectionMsg::RetryElapsed, now_ms(start), &retry_tx);
                }
                message = next_message(&mut runtime.endpoint) => match message {
                    Some(message) => {
                        runtime.dispatch(
                            ConnectionMsg::ChannelReceived(message), now_ms(start), &retry_tx);
                    }
                    None => {
                        panel_warn!(BRIDGE, "channel closed by remote");
                        runtime.endpoint = None;
                        runtime.dispatch(ConnectionMsg::ChannelClosed, now_ms(start), &retry_tx);
                    }
                },
            }
        }
        runtime.cancel_retry();
        panel_info!(BRIDGE, "stopping");
    });

    BridgeHandle {
        input: input_tx,
        task,
    }
}

fn now_ms(start: Instant) -> Millis {
    start.elapsed().as_millis() as Millis
}

async fn next_message(endpoint: &mut Option<ChannelEndpoint>) -> Option<panel_core::ChannelMessage> {
    match endpoint {
        Some(endpoint) => endpoint.recv().await,
        None => std::future::pending().await,
    }
}

struct BridgeRuntime {
    manager: ConnectionManager,
    endpoint: Option<ChannelEndpoint>,
    /// The one owned retry timer; always aborted before rescheduling.
    retry: Option<JoinHandle<()>>,
    connector: Connector,
    frame_port: FramePort,
    channel_name: String,
}

impl BridgeRuntime {
    fn dispatch(&mut self, msg: ConnectionMsg, now: Millis, retry_tx: &mpsc::UnboundedSender<()>) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let (manager, effects) = update_connection(self.manager.clone(), msg, now);
            self.manager = manager;

            for effect in effects {
                match effect {
                    ConnectionEffect::OpenChannel => match self.connector.open(&self.channel_name) {
                        Ok(endpoint) => {
                            panel_info!(BRIDGE, "channel '{}' open", self.channel_name);
                            self.endpoint = Some(endpoint);
                            queue.push_back(ConnectionMsg::ChannelOpened);
                        }
                        Err(err) => {
                            panel_warn!(BRIDGE, "channel open failed: {err}");
                            queue.push_back(ConnectionMsg::ChannelOpenFailed);
                        }
                    },
                    ConnectionEffect::CloseChannel => {
                        self.endpoint = None;
                    }
                    ConnectionEffect::CancelRetry => self.cancel_retry(),
                    ConnectionEffect::ScheduleRetry { delay_ms } => {
                        panel_debug!(BRIDGE, "retry in {delay_ms} ms");
                        self.cancel_retry();
                        let tx = retry_tx.clone();
                        self.retry = Some(tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                            let _ = tx.send(());
                        }));
                    }
                    ConnectionEffect::SendOnChannel(message) => {
                        if let Some(endpoint) = self.endpoint.as_ref() {
                            if let Err(err) = endpoint.send(&message) {
                                panel_warn!(BRIDGE, "send failed: {err}");
                                self.endpoint = None;
                                queue.push_back(ConnectionMsg::ChannelClosed);
                            }
                        }
                    }
                    ConnectionEffect::PostToFrame {
                        target_origin,
                        message,
                    } => {
                        self.frame_port.post(&target_origin, message);
                    }
                }
            }
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.retry.take() {
            timer.abort();
        }
    }
}
