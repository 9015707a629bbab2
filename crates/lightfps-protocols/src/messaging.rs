//! Tab messaging protocol.
//!
//! The background side enumerates tabs and pokes each page to re-run the
//! engine; the popup side injects the engine into the active tab.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

pub type TabId = u32;

/// A browser tab as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Absent for tabs that cannot receive messages (e.g. devtools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

impl Tab {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            url: url.into(),
            active: false,
        }
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

/// Which tabs to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabQuery {
    /// Only the active tab of the current window.
    #[serde(default)]
    pub active_only: bool,
}

impl TabQuery {
    pub fn all() -> Self {
        Self { active_only: false }
    }

    pub fn active() -> Self {
        Self { active_only: true }
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        !self.active_only || tab.active
    }
}

/// Message delivered to a page's content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    pub action: String,
}

impl RuntimeMessage {
    pub const APPLY_OPTIMIZATIONS: &'static str = "applyOptimizations";

    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    /// `{action: "applyOptimizations"}`.
    pub fn apply_optimizations() -> Self {
        Self::new(Self::APPLY_OPTIMIZATIONS)
    }

    pub fn is_apply_optimizations(&self) -> bool {
        self.action == Self::APPLY_OPTIMIZATIONS
    }
}

/// Enumerate tabs and deliver messages.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, MessagingError>;

    async fn send_message(&self, tab: TabId, message: RuntimeMessage)
        -> Result<(), MessagingError>;
}

/// Run the page engine in a tab.
#[async_trait]
pub trait ScriptInjector: Send + Sync {
    async fn inject(&self, tab: TabId) -> Result<(), MessagingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_message_wire_format() {
        let message = RuntimeMessage::apply_optimizations();
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "action": "applyOptimizations" })
        );
        assert!(message.is_apply_optimizations());
        assert!(!RuntimeMessage::new("ping").is_apply_optimizations());
    }

    #[test]
    fn test_tab_query() {
        let background = Tab::new(1, "https://example.com");
        let focused = Tab::new(2, "https://video.example").active();
        assert!(TabQuery::all().matches(&background));
        assert!(!TabQuery::active().matches(&background));
        assert!(TabQuery::active().matches(&focused));
    }

    #[test]
    fn test_tab_without_id_deserializes() {
        let tab: Tab = serde_json::from_value(json!({ "url": "devtools://x" })).unwrap();
        assert!(tab.id.is_none());
        assert!(!tab.active);
    }
}
