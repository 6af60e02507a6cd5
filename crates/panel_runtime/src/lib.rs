//! Panel runtime: effect execution for the three execution contexts.
//!
//! The pure machines in `panel_core` decide; this crate does. Each context
//! becomes a tokio task owning its state exclusively, talking to the others
//! only through in-process message pipes: the channel hub stands in for the
//! extension runtime, the frame port for scoped cross-document posts, and
//! the tab directory for the browser's tab API.
mod background;
mod bridge;
mod channel;
mod directory;
mod frame;

pub use background::{spawn_background, BackgroundHandle};
pub use bridge::{spawn_bridge, BridgeConfig, BridgeHandle};
pub use channel::{ChannelEndpoint, ChannelError, ChannelHub, ChannelListener, Connector, IncomingChannel};
pub use directory::{DirectoryError, InMemoryTabDirectory, LoadStatus, TabDirectory, TabEvent};
pub use frame::{frame_pair, FramePort, FramePost, FrameStub};
