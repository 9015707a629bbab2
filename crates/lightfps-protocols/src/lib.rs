//! # LightFPS Protocols
//!
//! Interfaces to the collaborators the page engine does not own.
//! Contains only definitions - implementations live in
//! `lightfps-coordinator`.
//!
//! ## Core Traits
//!
//! - [`SettingsStore`] - Key/value settings storage with change notifications
//! - [`TabMessenger`] - Enumerate tabs and deliver runtime messages to them
//! - [`ScriptInjector`] - Run the engine in a specific tab

pub mod error;
pub mod messaging;
pub mod storage;

pub use error::{MessagingError, StorageError};
pub use messaging::{RuntimeMessage, ScriptInjector, Tab, TabId, TabMessenger, TabQuery};
pub use storage::{SettingsChange, SettingsStore, StorageArea, ValueChange};
