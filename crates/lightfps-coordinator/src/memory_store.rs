//! In-memory settings store implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use lightfps_protocols::{SettingsChange, SettingsStore, StorageArea, StorageError};

use crate::store::{CHANGE_FEED_CAPACITY, diff_items, pick};

/// In-memory settings store.
pub struct MemorySettingsStore {
    area: StorageArea,
    values: RwLock<Map<String, Value>>,
    quota_bytes: Option<usize>,
    sender: broadcast::Sender<SettingsChange>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::with_values(Map::new())
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            area: StorageArea::Sync,
            values: RwLock::new(values),
            quota_bytes: None,
            sender,
        }
    }

    /// Report changes as coming from `area`.
    pub fn in_area(mut self, area: StorageArea) -> Self {
        self.area = area;
        self
    }

    /// Reject writes that would grow the serialized store beyond `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Everything currently stored.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        Ok(pick(&self.values.read(), keys))
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StorageError> {
        let change = {
            let mut values = self.values.write();
            if let Some(max) = self.quota_bytes {
                let mut merged = values.clone();
                merged.extend(items.clone());
                let used = serde_json::to_vec(&merged)?.len();
                if used > max {
                    return Err(StorageError::QuotaExceeded { used, max });
                }
            }
            diff_items(self.area, &mut values, items)
        };

        if change.changes.is_empty() {
            return Ok(());
        }
        if self.sender.send(change).is_err() {
            debug!("Settings changed with no subscribers");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.sender.subscribe()
    }
}
