use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use panel_core::{Tab, TabId};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The spec's `TabLookupFailed`: the tab closed between the event and
    /// the lookup. Non-fatal; the triggering event is skipped.
    #[error("tab {0} not found")]
    TabNotFound(TabId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Tab lifecycle events, mirroring the browser's tab API surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Updated {
        id: TabId,
        status: LoadStatus,
        tab: Tab,
    },
    Activated {
        id: TabId,
    },
    Removed {
        id: TabId,
    },
}

/// The external Tab Directory capability consumed by the background task.
#[async_trait]
pub trait TabDirectory: Send + Sync {
    async fn query_active_tab(&self) -> Result<Option<Tab>, DirectoryError>;
    async fn get_tab(&self, id: TabId) -> Result<Tab, DirectoryError>;
    async fn get_all_tabs(&self) -> Result<Vec<Tab>, DirectoryError>;
}

#[derive(Default)]
struct DirectoryInner {
    tabs: BTreeMap<TabId, Tab>,
    active: Option<TabId>,
    next_id: TabId,
    subscribers: Vec<mpsc::UnboundedSender<TabEvent>>,
}

/// In-memory tab directory used by tests and the demo binary. Mutators
/// publish lifecycle events to every subscriber.
#[derive(Default)]
pub struct InMemoryTabDirectory {
    inner: Mutex<DirectoryInner>,
}

impl InMemoryTabDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TabEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Opens a tab, makes it active, and reports a completed load.
    pub fn open(&self, url: &str, title: &str) -> TabId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let tab = Tab {
            id,
            url: url.to_string(),
            title: title.to_string(),
        };
        inner.tabs.insert(id, tab.clone());
        inner.active = Some(id);
        publish(
            &mut inner,
            TabEvent::Updated {
                id,
                status: LoadStatus::Complete,
                tab,
            },
        );
        id
    }

    /// Navigates an existing tab and reports a completed load.
    pub fn navigate(&self, id: TabId, url: &str, title: &str) -> Result<(), DirectoryError> {
        let mut inner = self.lock();
        let tab = inner
            .tabs
            .get_mut(&id)
            .ok_or(DirectoryError::TabNotFound(id))?;
        tab.url = url.to_string();
        tab.title = title.to_string();
        let tab = tab.clone();
        publish(
            &mut inner,
            TabEvent::Updated {
                id,
                status: LoadStatus::Complete,
                tab,
            },
        );
        Ok(())
    }

    pub fn activate(&self, id: TabId) -> Result<(), DirectoryError> {
        let mut inner = self.lock();
        if !inner.tabs.contains_key(&id) {
            return Err(DirectoryError::TabNotFound(id));
        }
        inner.active = Some(id);
        publish(&mut inner, TabEvent::Activated { id });
        Ok(())
    }

    pub fn close(&self, id: TabId) -> Result<(), DirectoryError> {
        let mut inner = self.lock();
        inner
            .tabs
            .remove(&id)
            .ok_or(DirectoryError::TabNotFound(id))?;
        if inner.active == Some(id) {
            inner.active = inner.tabs.keys().next_back().copied();
        }
        publish(&mut inner, TabEvent::Removed { id });
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryInner> {
        self.inner.lock().expect("lock tab directory")
    }
}

fn publish(inner: &mut DirectoryInner, event: TabEvent) {
    inner
        .subscribers
        .retain(|tx| tx.send(event.clone()).is_ok());
}

#[async_trait]
impl TabDirectory for InMemoryTabDirectory {
    async fn query_active_tab(&self) -> Result<Option<Tab>, DirectoryError> {
        let inner = self.lock();
        Ok(inner.active.and_then(|id| inner.tabs.get(&id).cloned()))
    }

    async fn get_tab(&self, id: TabId) -> Result<Tab, DirectoryError> {
        self.lock()
            .tabs
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::TabNotFound(id))
    }

    async fn get_all_tabs(&self) -> Result<Vec<Tab>, DirectoryError> {
        Ok(self.lock().tabs.values().cloned().collect())
    }
}
