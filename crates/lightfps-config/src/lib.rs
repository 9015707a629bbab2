//! # LightFPS Config
//!
//! Two kinds of configuration feed the page engine:
//!
//! - [`Settings`]: the user's option snapshot, read once per run from the
//!   settings store. Absent keys mean "off".
//! - [`EngineConfig`]: tuning the user never sees (selector lists, delays,
//!   equalizer table), loaded from TOML.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::{Settings, SoundPreset};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
