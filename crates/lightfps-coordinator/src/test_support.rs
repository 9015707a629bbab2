//! Host doubles shared by the unit tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use lightfps_protocols::{
    MessagingError, RuntimeMessage, ScriptInjector, SettingsChange, SettingsStore, StorageError,
    Tab, TabId, TabMessenger, TabQuery,
};

/// Serves a fixed tab list and records deliveries.
#[derive(Default)]
pub struct FakeTabs {
    pub tabs: Vec<Tab>,
    pub query_fails: bool,
    pub unreachable: HashSet<TabId>,
    pub sent: Mutex<Vec<(TabId, RuntimeMessage)>>,
    pub queries: Mutex<Vec<TabQuery>>,
}

impl FakeTabs {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self {
            tabs,
            ..Self::default()
        }
    }

    pub fn unreachable(mut self, tab: TabId) -> Self {
        self.unreachable.insert(tab);
        self
    }

    pub fn sent_to(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.sent.lock().iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl TabMessenger for FakeTabs {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, MessagingError> {
        self.queries.lock().push(query);
        if self.query_fails {
            return Err(MessagingError::QueryFailed("tabs permission missing".to_string()));
        }
        Ok(self
            .tabs
            .iter()
            .filter(|tab| query.matches(tab))
            .cloned()
            .collect())
    }

    async fn send_message(&self, tab: TabId, message: RuntimeMessage) -> Result<(), MessagingError> {
        if self.unreachable.contains(&tab) {
            return Err(MessagingError::NoReceiver(tab));
        }
        self.sent.lock().push((tab, message));
        Ok(())
    }
}

/// Records injections; optionally refuses them.
#[derive(Default)]
pub struct FakeInjector {
    pub fails: bool,
    pub injected: Mutex<Vec<TabId>>,
}

#[async_trait]
impl ScriptInjector for FakeInjector {
    async fn inject(&self, tab: TabId) -> Result<(), MessagingError> {
        if self.fails {
            return Err(MessagingError::InjectionFailed {
                tab,
                message: "cannot access contents of the page".to_string(),
            });
        }
        self.injected.lock().push(tab);
        Ok(())
    }
}

/// A store whose every call fails.
pub struct BrokenStore {
    sender: broadcast::Sender<SettingsChange>,
}

impl BrokenStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }
}

#[async_trait]
impl SettingsStore for BrokenStore {
    async fn get(&self, _keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        Err(StorageError::Unavailable("extension context invalidated".to_string()))
    }

    async fn set(&self, _items: Map<String, Value>) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("extension context invalidated".to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.sender.subscribe()
    }
}
