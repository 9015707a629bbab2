//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{EngineConfig, EqGains};

/// Largest gain, in dB, a preset may ask for.
const MAX_GAIN_DB: f64 = 40.0;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &EngineConfig) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_tracker(config, &mut result);
        Self::validate_media(config, &mut result);
        Self::validate_equalizer(config, &mut result);
        Self::validate_reduce_memory(config, &mut result);
        Self::validate_dark_mode(config, &mut result);

        Ok(result)
    }

    fn validate_tracker(config: &EngineConfig, result: &mut ValidationResult) {
        let tracker = &config.tracker;
        if tracker.debounce_ms == 0 {
            result.add_error(ValidationError::new(
                "tracker.debounce_ms",
                "debounce_ms must be greater than 0",
            ));
        } else if tracker.debounce_ms < 500 {
            result.add_warning(ValidationWarning::new(
                "tracker.debounce_ms",
                "debounce_ms below 500 rescans on nearly every mutation burst",
            ));
        }

        if tracker.rescan_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "tracker.rescan_interval_ms",
                "rescan_interval_ms must be greater than 0",
            ));
        }

        for (i, selector) in tracker.selectors.iter().enumerate() {
            if selector.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("tracker.selectors[{i}]"),
                    "selector cannot be empty",
                ));
            }
        }

        if tracker.cookie_patterns.is_empty() {
            result.add_warning(ValidationWarning::new(
                "tracker.cookie_patterns",
                "no cookie patterns, tracking cookies will not be cleared",
            ));
        }

        if let Some(domain) = &tracker.cookie_domain {
            if domain.trim_start_matches('.').is_empty() || domain.contains([';', '=', ' ']) {
                result.add_error(ValidationError::new(
                    "tracker.cookie_domain",
                    format!("'{domain}' is not a cookie domain"),
                ));
            }
        }
    }

    fn validate_media(config: &EngineConfig, result: &mut ValidationResult) {
        if config.media.frame_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "media.frame_interval_ms",
                "frame_interval_ms must be greater than 0",
            ));
        }

        if config.media.quality_label.is_empty() {
            result.add_warning(ValidationWarning::new(
                "media.quality_label",
                "empty quality label, site players will be asked for ''",
            ));
        }
    }

    fn validate_equalizer(config: &EngineConfig, result: &mut ValidationResult) {
        let eq = &config.equalizer;
        for (name, frequency) in [
            ("low_frequency", eq.low_frequency),
            ("mid_frequency", eq.mid_frequency),
            ("high_frequency", eq.high_frequency),
        ] {
            if !frequency.is_finite() || frequency <= 0.0 {
                result.add_error(ValidationError::new(
                    format!("equalizer.{name}"),
                    "frequency must be a positive number of Hz",
                ));
            }
        }

        if eq.low_frequency >= eq.mid_frequency || eq.mid_frequency >= eq.high_frequency {
            result.add_warning(ValidationWarning::new(
                "equalizer",
                "bands are expected in low < mid < high order",
            ));
        }

        if !eq.mid_q.is_finite() || eq.mid_q <= 0.0 {
            result.add_error(ValidationError::new(
                "equalizer.mid_q",
                "mid_q must be positive",
            ));
        }

        for (name, gains) in [
            ("flat", &eq.flat),
            ("bass", &eq.bass),
            ("treble", &eq.treble),
            ("vocal", &eq.vocal),
        ] {
            Self::validate_gains(name, gains, result);
        }
    }

    fn validate_gains(preset: &str, gains: &EqGains, result: &mut ValidationResult) {
        for (band, gain) in ["low", "mid", "high"].into_iter().zip(gains.values()) {
            if !gain.is_finite() || gain.abs() > MAX_GAIN_DB {
                result.add_error(ValidationError::new(
                    format!("equalizer.{preset}.{band}"),
                    format!("gain must be within ±{MAX_GAIN_DB} dB"),
                ));
            }
        }
    }

    fn validate_reduce_memory(config: &EngineConfig, result: &mut ValidationResult) {
        if let Err(e) = regex::RegexBuilder::new(&config.reduce_memory.iframe_pattern)
            .case_insensitive(true)
            .build()
        {
            result.add_error(ValidationError::new(
                "reduce_memory.iframe_pattern",
                format!("invalid pattern: {e}"),
            ));
        }
    }

    fn validate_dark_mode(config: &EngineConfig, result: &mut ValidationResult) {
        let dark = &config.dark_mode;
        if !(0.0..=255.0).contains(&dark.threshold) {
            result.add_error(ValidationError::new(
                "dark_mode.threshold",
                "threshold must be between 0 and 255",
            ));
        }

        for (name, value) in [
            ("background", &dark.background),
            ("text", &dark.text),
            ("border", &dark.border),
        ] {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("dark_mode.{name}"),
                    "colour cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
