//! Popup controller.
//!
//! Everything the options popup does, minus the widgets: read the options,
//! write them back, flip the master switch and push a run into the active
//! tab. Failures end up as a [`PopupStatus`] for the user, never as an error
//! the caller has to handle.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info, warn};

use lightfps_config::Settings;
use lightfps_protocols::{ScriptInjector, SettingsStore, TabMessenger, TabQuery};

use crate::error::{CoordinatorError, CoordinatorResult};

const AUTO_OPTIMIZE: &str = "autoOptimize";

/// Statuses kept for [`PopupController::status_history`].
pub const STATUS_HISTORY: usize = 32;

/// URL prefixes of privileged pages the engine may not run in.
pub const RESTRICTED_PREFIXES: [&str; 4] =
    ["chrome://", "chrome-extension://", "moz-extension://", "about:"];

pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// User-visible status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupStatus {
    Applying,
    Applied,
    NoActiveTab,
    RestrictedPage,
    LoadFailed,
    SaveFailed,
    ToggleFailed,
    ApplyFailed,
}

impl PopupStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PopupStatus::Applying => "Applying optimizations...",
            PopupStatus::Applied => "Optimizations applied!",
            PopupStatus::NoActiveTab => "No active tab found.",
            PopupStatus::RestrictedPage => "Cannot optimize this page type.",
            PopupStatus::LoadFailed => "Failed to load options.",
            PopupStatus::SaveFailed => "Failed to save options.",
            PopupStatus::ToggleFailed => "Failed to toggle Auto Optimize.",
            PopupStatus::ApplyFailed => "Failed to apply optimizations.",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, PopupStatus::Applying | PopupStatus::Applied)
    }
}

impl fmt::Display for PopupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub struct PopupController {
    store: Arc<dyn SettingsStore>,
    tabs: Arc<dyn TabMessenger>,
    injector: Arc<dyn ScriptInjector>,
    statuses: Mutex<VecDeque<PopupStatus>>,
}

impl PopupController {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        tabs: Arc<dyn TabMessenger>,
        injector: Arc<dyn ScriptInjector>,
    ) -> Self {
        Self {
            store,
            tabs,
            injector,
            statuses: Mutex::new(VecDeque::with_capacity(STATUS_HISTORY)),
        }
    }

    /// The status line as the user last saw it.
    pub fn status(&self) -> Option<PopupStatus> {
        self.statuses.lock().back().copied()
    }

    /// The last [`STATUS_HISTORY`] statuses shown, oldest first.
    pub fn status_history(&self) -> Vec<PopupStatus> {
        self.statuses.lock().iter().copied().collect()
    }

    fn show(&self, status: PopupStatus) {
        let mut statuses = self.statuses.lock();
        if statuses.len() == STATUS_HISTORY {
            statuses.pop_front();
        }
        statuses.push_back(status);
    }

    /// Current options; missing keys read as off. A storage failure shows
    /// [`PopupStatus::LoadFailed`] and yields the defaults.
    pub async fn load(&self) -> Settings {
        match self.store.get(&Settings::KEYS).await {
            Ok(values) => Settings::from_values(&values),
            Err(e) => {
                error!("Error loading options: {}", e);
                self.show(PopupStatus::LoadFailed);
                Settings::default()
            }
        }
    }

    /// Write every option except the master switch, which only
    /// [`toggle_auto_optimize`](Self::toggle_auto_optimize) changes.
    pub async fn save(&self, settings: &Settings) -> bool {
        match self.write_options(settings).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving options: {}", e);
                self.show(PopupStatus::SaveFailed);
                false
            }
        }
    }

    async fn write_options(&self, settings: &Settings) -> CoordinatorResult<()> {
        let mut values = settings.to_values();
        values.remove(AUTO_OPTIMIZE);
        self.store.set(values).await?;
        Ok(())
    }

    /// Flip `autoOptimize` and return its new value.
    pub async fn toggle_auto_optimize(&self) -> Option<bool> {
        match self.flip_auto_optimize().await {
            Ok(enabled) => {
                info!("Auto Optimize: {}", if enabled { "ON" } else { "OFF" });
                Some(enabled)
            }
            Err(e) => {
                error!("Error toggling auto optimize: {}", e);
                self.show(PopupStatus::ToggleFailed);
                None
            }
        }
    }

    async fn flip_auto_optimize(&self) -> CoordinatorResult<bool> {
        let current = self.store.get(&[AUTO_OPTIMIZE]).await?;
        let enabled = !Settings::from_values(&current).auto_optimize;
        let mut items = serde_json::Map::new();
        items.insert(AUTO_OPTIMIZE.to_string(), Value::Bool(enabled));
        self.store.set(items).await?;
        Ok(enabled)
    }

    /// Save `settings`, then run the engine in the active tab.
    pub async fn apply(&self, settings: &Settings) -> PopupStatus {
        if !self.save(settings).await {
            return PopupStatus::SaveFailed;
        }
        self.show(PopupStatus::Applying);

        let status = match self.apply_to_active_tab().await {
            Ok(status) => status,
            Err(e) => {
                error!("Apply error: {}", e);
                PopupStatus::ApplyFailed
            }
        };
        self.show(status);
        status
    }

    async fn apply_to_active_tab(&self) -> Result<PopupStatus, CoordinatorError> {
        let tabs = self.tabs.query_tabs(TabQuery::active()).await?;
        let Some(tab) = tabs.into_iter().next() else {
            return Ok(PopupStatus::NoActiveTab);
        };
        if is_restricted_url(&tab.url) {
            warn!("Refusing to optimize {}", tab.url);
            return Ok(PopupStatus::RestrictedPage);
        }
        let Some(id) = tab.id else {
            return Ok(PopupStatus::NoActiveTab);
        };
        self.injector.inject(id).await?;
        info!("Optimizations applied to tab {}", id);
        Ok(PopupStatus::Applied)
    }
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod tests;
