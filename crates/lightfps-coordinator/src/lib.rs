//! # LightFPS Coordinator
//!
//! The glue around the page engine:
//!
//! - [`Coordinator`] - watches the settings store and asks every open tab
//!   to re-run the engine when a relevant key changes
//! - [`PopupController`] - load/save options, flip the master switch and
//!   apply to the active tab, reporting outcomes as [`PopupStatus`] messages
//! - [`MemorySettingsStore`] / [`FileSettingsStore`] - [`SettingsStore`]
//!   implementations with a broadcast change feed
//!
//! [`SettingsStore`]: lightfps_protocols::SettingsStore

mod coordinator;
mod error;
mod file_store;
mod memory_store;
mod popup;
mod store;

#[cfg(test)]
mod test_support;

pub use coordinator::{BroadcastReport, ChangeOutcome, Coordinator};
pub use error::{CoordinatorError, CoordinatorResult};
pub use file_store::FileSettingsStore;
pub use memory_store::MemorySettingsStore;
pub use popup::{PopupController, PopupStatus, RESTRICTED_PREFIXES, is_restricted_url};
pub use store::{CHANGE_FEED_CAPACITY, diff_items};
