//! The user's option snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Equalizer preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPreset {
    #[default]
    Flat,
    Bass,
    Treble,
    Vocal,
}

impl SoundPreset {
    pub const ALL: [SoundPreset; 4] = [
        SoundPreset::Flat,
        SoundPreset::Bass,
        SoundPreset::Treble,
        SoundPreset::Vocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundPreset::Flat => "flat",
            SoundPreset::Bass => "bass",
            SoundPreset::Treble => "treble",
            SoundPreset::Vocal => "vocal",
        }
    }

    /// Unknown names fall back to `flat`.
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for SoundPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoundPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "soundPreset".to_string(),
                message: format!("'{s}' is not one of flat, bass, treble, vocal"),
            })
    }
}

impl<'de> Deserialize<'de> for SoundPreset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(SoundPreset::from_name_lossy)
            .unwrap_or_default())
    }
}

/// One run's worth of user options, keyed as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub disable_video_autoplay: bool,
    pub disable_audio_autoplay: bool,
    pub force_quality: bool,
    pub fps_smoother: bool,
    pub lazy_load_media: bool,
    pub block_tracking: bool,
    pub enable_dark_mode: bool,
    pub reduce_memory: bool,
    pub disable_animations: bool,
    /// Master switch; nothing runs without it.
    pub auto_optimize: bool,
    pub enhance_sharpness: bool,
    pub reduce_motion: bool,
    pub font_smoothing: bool,
    pub disable_gif_autoplay: bool,
    #[serde(rename = "enableMinimalUI")]
    pub enable_minimal_ui: bool,
    pub better_sound: bool,
    pub sound_preset: SoundPreset,
}

impl Settings {
    /// Every persisted key, in the order the store is queried.
    pub const KEYS: [&'static str; 17] = [
        "disableVideoAutoplay",
        "disableAudioAutoplay",
        "forceQuality",
        "fpsSmoother",
        "lazyLoadMedia",
        "blockTracking",
        "enableDarkMode",
        "reduceMemory",
        "disableAnimations",
        "autoOptimize",
        "enhanceSharpness",
        "reduceMotion",
        "fontSmoothing",
        "disableGifAutoplay",
        "enableMinimalUI",
        "betterSound",
        "soundPreset",
    ];

    pub const SOUND_PRESET: &'static str = "soundPreset";

    pub fn is_known_key(key: &str) -> bool {
        Self::KEYS.contains(&key)
    }

    /// Build a snapshot from a batched store read.
    ///
    /// Boolean keys take the truthiness of whatever is stored, missing keys
    /// are off and an unrecognised preset is `flat`.
    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut settings = Settings::default();
        for key in Self::KEYS {
            let Some(value) = values.get(key) else {
                continue;
            };
            if key == Self::SOUND_PRESET {
                settings.sound_preset = value
                    .as_str()
                    .map(SoundPreset::from_name_lossy)
                    .unwrap_or_default();
            } else if let Some(flag) = settings.flag_mut(key) {
                *flag = truthy(value);
            }
        }
        settings
    }

    /// The snapshot as the store keeps it.
    pub fn to_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        for key in Self::KEYS {
            let value = match key {
                Self::SOUND_PRESET => Value::String(self.sound_preset.as_str().to_string()),
                _ => Value::Bool(self.flag(key).unwrap_or_default()),
            };
            values.insert(key.to_string(), value);
        }
        values
    }

    /// Read a boolean option by its persisted key.
    pub fn flag(&self, key: &str) -> Option<bool> {
        let value = match key {
            "disableVideoAutoplay" => self.disable_video_autoplay,
            "disableAudioAutoplay" => self.disable_audio_autoplay,
            "forceQuality" => self.force_quality,
            "fpsSmoother" => self.fps_smoother,
            "lazyLoadMedia" => self.lazy_load_media,
            "blockTracking" => self.block_tracking,
            "enableDarkMode" => self.enable_dark_mode,
            "reduceMemory" => self.reduce_memory,
            "disableAnimations" => self.disable_animations,
            "autoOptimize" => self.auto_optimize,
            "enhanceSharpness" => self.enhance_sharpness,
            "reduceMotion" => self.reduce_motion,
            "fontSmoothing" => self.font_smoothing,
            "disableGifAutoplay" => self.disable_gif_autoplay,
            "enableMinimalUI" => self.enable_minimal_ui,
            "betterSound" => self.better_sound,
            _ => return None,
        };
        Some(value)
    }

    fn flag_mut(&mut self, key: &str) -> Option<&mut bool> {
        let flag = match key {
            "disableVideoAutoplay" => &mut self.disable_video_autoplay,
            "disableAudioAutoplay" => &mut self.disable_audio_autoplay,
            "forceQuality" => &mut self.force_quality,
            "fpsSmoother" => &mut self.fps_smoother,
            "lazyLoadMedia" => &mut self.lazy_load_media,
            "blockTracking" => &mut self.block_tracking,
            "enableDarkMode" => &mut self.enable_dark_mode,
            "reduceMemory" => &mut self.reduce_memory,
            "disableAnimations" => &mut self.disable_animations,
            "autoOptimize" => &mut self.auto_optimize,
            "enhanceSharpness" => &mut self.enhance_sharpness,
            "reduceMotion" => &mut self.reduce_motion,
            "fontSmoothing" => &mut self.font_smoothing,
            "disableGifAutoplay" => &mut self.disable_gif_autoplay,
            "enableMinimalUI" => &mut self.enable_minimal_ui,
            "betterSound" => &mut self.better_sound,
            _ => return None,
        };
        Some(flag)
    }

    /// Set one option from text, as typed on a command line.
    pub fn set_key(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        if key == Self::SOUND_PRESET {
            self.sound_preset = raw.parse()?;
            return Ok(());
        }
        let flag = self
            .flag_mut(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *flag = parse_bool(key, raw)?;
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            message: format!("'{other}' is not a boolean"),
        }),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
