//! File-based settings store implementation.
//!
//! The whole store is one JSON object on disk. Writes are serialized
//! through a lock so concurrent `set` calls never lose each other's keys.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use lightfps_protocols::{SettingsChange, SettingsStore, StorageArea, StorageError};

use crate::store::{CHANGE_FEED_CAPACITY, diff_items, pick};

/// File-based settings store.
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    sender: broadcast::Sender<SettingsChange>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            sender,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Everything in the file; a missing file is an empty store.
    pub async fn load_all(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::StorageError(format!("{}: {e}", self.path.display())))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(values) => Ok(values),
            _ => Err(StorageError::SerializationError(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::StorageError(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StorageError::StorageError(format!("{}: {e}", self.path.display())))?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        Ok(pick(&self.load_all().await?, keys))
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load_all().await?;
        let change = diff_items(StorageArea::Sync, &mut values, items);
        if change.changes.is_empty() {
            return Ok(());
        }
        self.write_all(&values).await?;
        if self.sender.send(change).is_err() {
            debug!("Settings changed with no subscribers");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.sender.subscribe()
    }
}
