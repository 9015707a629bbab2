//! Engine tuning schema.

use serde::{Deserialize, Serialize};

use crate::settings::SoundPreset;

/// Root engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub equalizer: EqualizerConfig,

    #[serde(default)]
    pub reduce_memory: ReduceMemoryConfig,

    #[serde(default)]
    pub dark_mode: DarkModeConfig,

    #[serde(default)]
    pub minimal_ui: MinimalUiConfig,
}

/// How matched tracker elements are dealt with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStrategy {
    /// Hide now, remove after the grace delay; rescans are debounced.
    #[default]
    Deferred,
    /// Remove on sight; every mutation rescans and an interval backs it up.
    Immediate,
}

/// Tracker and ad suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub strategy: TrackerStrategy,

    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,

    #[serde(default = "default_tracker_selectors")]
    pub selectors: Vec<String>,

    /// Cookie names containing any of these (case-insensitive) are cleared.
    #[serde(default = "default_cookie_patterns")]
    pub cookie_patterns: Vec<String>,

    #[serde(default)]
    pub clear_extended_cookies: bool,

    /// Exact names cleared when `clear_extended_cookies` is on.
    #[serde(default = "default_extended_cookie_names")]
    pub extended_cookie_names: Vec<String>,

    /// Also expire cookies scoped to this domain.
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Dotted global paths nulled out in immediate mode.
    #[serde(default = "default_ad_globals")]
    pub ad_globals: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            strategy: TrackerStrategy::default(),
            grace_ms: default_grace_ms(),
            debounce_ms: default_debounce_ms(),
            rescan_interval_ms: default_rescan_interval_ms(),
            selectors: default_tracker_selectors(),
            cookie_patterns: default_cookie_patterns(),
            clear_extended_cookies: false,
            extended_cookie_names: default_extended_cookie_names(),
            cookie_domain: None,
            ad_globals: default_ad_globals(),
        }
    }
}

fn default_grace_ms() -> u64 {
    5000
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_rescan_interval_ms() -> u64 {
    5000
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_tracker_selectors() -> Vec<String> {
    strings(&[
        ".ads",
        ".advertisement",
        "iframe[src*=\"ads\"]",
        "script[src*=\"ads\"]",
        "script[src*=\"tracking\"]",
        "script[src*=\"analytics\"]",
        "img[src*=\"ads\"]",
        ".popup",
        ".sponsored",
        ".ytp-ce-element",
    ])
}

fn default_cookie_patterns() -> Vec<String> {
    strings(&["_ga", "_gid", "_fbp", "_gcl", "_gat"])
}

fn default_extended_cookie_names() -> Vec<String> {
    strings(&["IDE", "DSID", "ANID"])
}

fn default_ad_globals() -> Vec<String> {
    strings(&[
        "ytInitialPlayerResponse.adPlacements",
        "ytInitialPlayerResponse.playerAds",
        "google_ad_client",
    ])
}

/// Media controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Minimum time between playback-rate re-assertions.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Label passed to a site player's quality API.
    #[serde(default = "default_quality_label")]
    pub quality_label: String,

    /// Value written to an element's own quality hint.
    #[serde(default = "default_quality_hint")]
    pub quality_hint: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            quality_label: default_quality_label(),
            quality_hint: default_quality_hint(),
        }
    }
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_quality_label() -> String {
    "hd1080".to_string()
}

fn default_quality_hint() -> String {
    "high".to_string()
}

/// Gains in dB for the three bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqGains {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl EqGains {
    pub const fn new(low: f64, mid: f64, high: f64) -> Self {
        Self { low, mid, high }
    }

    pub fn values(&self) -> [f64; 3] {
        [self.low, self.mid, self.high]
    }
}

/// Three-band equalizer: band placement and the preset table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualizerConfig {
    #[serde(default = "default_low_frequency")]
    pub low_frequency: f64,

    #[serde(default = "default_mid_frequency")]
    pub mid_frequency: f64,

    #[serde(default = "default_mid_q")]
    pub mid_q: f64,

    #[serde(default = "default_high_frequency")]
    pub high_frequency: f64,

    #[serde(default = "default_flat")]
    pub flat: EqGains,

    #[serde(default = "default_bass")]
    pub bass: EqGains,

    #[serde(default = "default_treble")]
    pub treble: EqGains,

    #[serde(default = "default_vocal")]
    pub vocal: EqGains,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            low_frequency: default_low_frequency(),
            mid_frequency: default_mid_frequency(),
            mid_q: default_mid_q(),
            high_frequency: default_high_frequency(),
            flat: default_flat(),
            bass: default_bass(),
            treble: default_treble(),
            vocal: default_vocal(),
        }
    }
}

impl EqualizerConfig {
    pub fn gains(&self, preset: SoundPreset) -> EqGains {
        match preset {
            SoundPreset::Flat => self.flat,
            SoundPreset::Bass => self.bass,
            SoundPreset::Treble => self.treble,
            SoundPreset::Vocal => self.vocal,
        }
    }
}

fn default_low_frequency() -> f64 {
    200.0
}

fn default_mid_frequency() -> f64 {
    1000.0
}

fn default_mid_q() -> f64 {
    1.0
}

fn default_high_frequency() -> f64 {
    3000.0
}

fn default_flat() -> EqGains {
    EqGains::new(0.0, 0.0, 0.0)
}

fn default_bass() -> EqGains {
    EqGains::new(8.0, 0.0, -2.0)
}

fn default_treble() -> EqGains {
    EqGains::new(-2.0, 0.0, 8.0)
}

fn default_vocal() -> EqGains {
    EqGains::new(-3.0, 6.0, 3.0)
}

/// Reduce-memory: hidden regions and ad/embed iframes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceMemoryConfig {
    #[serde(default = "default_memory_selectors")]
    pub hide_selectors: Vec<String>,

    /// Case-insensitive regex over iframe sources.
    #[serde(default = "default_iframe_pattern")]
    pub iframe_pattern: String,

    #[serde(default = "default_iframe_removal_delay_ms")]
    pub iframe_removal_delay_ms: u64,
}

impl Default for ReduceMemoryConfig {
    fn default() -> Self {
        Self {
            hide_selectors: default_memory_selectors(),
            iframe_pattern: default_iframe_pattern(),
            iframe_removal_delay_ms: default_iframe_removal_delay_ms(),
        }
    }
}

fn default_memory_selectors() -> Vec<String> {
    strings(&[
        "#comments",
        "#sidebar",
        "#chat",
        ".popup",
        ".ytp-ce-element",
        "link[rel=\"preload\"]",
    ])
}

fn default_iframe_pattern() -> String {
    "ads|doubleclick|embed|widget".to_string()
}

fn default_iframe_removal_delay_ms() -> u64 {
    3000
}

/// Dark mode colours and the lightness cut-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DarkModeConfig {
    /// Luminance above which a colour counts as light.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_text")]
    pub text: String,

    #[serde(default = "default_border")]
    pub border: String,
}

impl Default for DarkModeConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            background: default_background(),
            text: default_text(),
            border: default_border(),
        }
    }
}

fn default_threshold() -> f64 {
    200.0
}

fn default_background() -> String {
    "#181818".to_string()
}

fn default_text() -> String {
    "#ccc".to_string()
}

fn default_border() -> String {
    "#444".to_string()
}

/// Minimal UI: regions hidden outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimalUiConfig {
    #[serde(default = "default_minimal_selectors")]
    pub selectors: Vec<String>,
}

impl Default for MinimalUiConfig {
    fn default() -> Self {
        Self {
            selectors: default_minimal_selectors(),
        }
    }
}

fn default_minimal_selectors() -> Vec<String> {
    strings(&[
        "header",
        "footer",
        "#sidebar",
        ".sidebar",
        ".comments",
        ".ads",
        ".advertisement",
        ".popup",
        ".newsletter-signup",
    ])
}
