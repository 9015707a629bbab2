//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::EngineConfig;
use crate::settings::Settings;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load engine tuning from a TOML file.
    pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load engine tuning from a string.
    pub fn load_str(content: &str) -> Result<EngineConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: EngineConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load a settings snapshot from a JSON object of persisted keys.
    pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_settings_str(&content)
    }

    pub fn load_settings_str(content: &str) -> Result<Settings, ConfigError> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(values) => Ok(Settings::from_values(&values)),
            other => Err(ConfigError::InvalidFormat(format!(
                "settings must be a JSON object, got {other}"
            ))),
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// `<config dir>/lightfps`, falling back to `~/.lightfps`.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("lightfps"))
            .unwrap_or_else(|| PathBuf::from(Self::expand_path("~/.lightfps")))
    }
}
