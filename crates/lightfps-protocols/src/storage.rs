//! Settings storage protocol.
//!
//! A flat key/value store (the extension's synced storage) with a change
//! feed. The engine reads one batched snapshot per run; the coordinator
//! listens to the feed.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::StorageError;

/// Which storage area a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Sync,
    Local,
    Managed,
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageArea::Sync => "sync",
            StorageArea::Local => "local",
            StorageArea::Managed => "managed",
            StorageArea::Session => "session",
        };
        f.write_str(name)
    }
}

/// Old and new value of one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// One batch of changed keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsChange {
    pub area: StorageArea,
    pub changes: BTreeMap<String, ValueChange>,
}

impl SettingsChange {
    pub fn new(area: StorageArea) -> Self {
        Self {
            area,
            changes: BTreeMap::new(),
        }
    }

    pub fn with_change(
        mut self,
        key: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        self.changes.insert(
            key.into(),
            ValueChange {
                old_value,
                new_value,
            },
        );
        self
    }

    /// Whether any of `keys` changed.
    pub fn touches(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.changes.contains_key(*key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }
}

/// Persisted settings with change notifications.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Batched read. Keys without a stored value are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError>;

    /// Write `items`, notifying subscribers of the keys whose value changed.
    async fn set(&self, items: Map<String, Value>) -> Result<(), StorageError>;

    /// Receive every change batch written after this call.
    fn subscribe(&self) -> broadcast::Receiver<SettingsChange>;
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
