//! Playback state of `<video>` and `<audio>` elements.
//!
//! Attribute-reflected properties (`autoplay`, `controls`, `preload`,
//! `disablepictureinpicture`, `loading`) live on the element's attributes;
//! this struct holds the runtime-only state.

use serde::{Deserialize, Serialize};

/// Runtime playback state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaState {
    pub paused: bool,
    pub ended: bool,
    pub playback_rate: f64,
    /// Vendor quality hint; `None` when the element does not expose one.
    pub quality: Option<String>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            ended: false,
            playback_rate: 1.0,
            quality: None,
        }
    }
}

impl MediaState {
    /// Playing means neither paused nor ended.
    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended
    }
}
