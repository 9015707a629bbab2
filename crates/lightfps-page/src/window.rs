//! The browsing context: document plus host capabilities.

use serde_json::{Map, Value};
use tracing::debug;

use crate::audio::AudioHost;
use crate::cookie::CookieJar;
use crate::document::Document;
use crate::error::PageResult;
use crate::event::{EventKind, EventTarget, PageEvent};
use crate::resource::{MemoryResources, ResourceLoader};

/// A site-specific player exposing a quality override.
pub trait PlayerQualityApi {
    fn set_playback_quality(&mut self, quality: &str) -> PageResult<()>;
}

/// A window owning its document.
pub struct Window {
    document: Document,
    hidden: bool,
    cookies: CookieJar,
    globals: Map<String, Value>,
    player: Option<Box<dyn PlayerQualityApi>>,
    resources: Box<dyn ResourceLoader>,
    audio: AudioHost,
}

impl Window {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            hidden: false,
            cookies: CookieJar::new(),
            globals: Map::new(),
            player: None,
            resources: Box::new(MemoryResources::new()),
            audio: AudioHost::new(),
        }
    }

    pub fn with_resources(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.resources = Box::new(loader);
        self
    }

    pub fn with_player(mut self, player: impl PlayerQualityApi + 'static) -> Self {
        self.player = Some(Box::new(player));
        self
    }

    pub fn with_audio(mut self, audio: AudioHost) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_globals(mut self, globals: Map<String, Value>) -> Self {
        self.globals = globals;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// `document.visibilityState`.
    pub fn visibility_state(&self) -> &'static str {
        if self.hidden { "hidden" } else { "visible" }
    }

    /// Change visibility; queues `visibilitychange` on the document when it
    /// actually changes.
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        debug!(state = self.visibility_state(), "visibility changed");
        self.document.push_event(PageEvent::new(
            EventTarget::Document,
            EventKind::VisibilityChange,
        ));
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn audio(&self) -> &AudioHost {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioHost {
        &mut self.audio
    }

    pub fn resources(&self) -> &dyn ResourceLoader {
        self.resources.as_ref()
    }

    /// The site player, when the page exposes one.
    pub fn player_mut(&mut self) -> Option<&mut Box<dyn PlayerQualityApi>> {
        self.player.as_mut()
    }

    pub fn globals(&self) -> &Map<String, Value> {
        &self.globals
    }

    /// Look up a dotted path such as `ytplayer.config.args`.
    pub fn global(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.globals.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Set a dotted path, creating intermediate objects.
    pub fn set_global(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut current = &mut self.globals;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value);
    }

    /// Overwrite an existing global with `null`. Returns whether it existed.
    pub fn null_global(&mut self, path: &str) -> bool {
        if self.global(path).is_none() {
            return false;
        }
        self.set_global(path, Value::Null);
        true
    }
}
