//! Media controller: playback policy for `<video>` and `<audio>`.
//!
//! Per element it settles `preload`, `controls` and picture-in-picture,
//! suppresses autoplay, pins the playback rate while playing and requests
//! the configured quality. A single document-level visibility listener
//! pauses playing videos when the page is hidden and resumes exactly those
//! videos when it is shown again.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use lightfps_config::{MediaConfig, Settings};
use lightfps_page::{Document, EventKind, EventTarget, MediaState, NodeId, PageError, PageResult};
use lightfps_runloop::{FrameLoop, ListenerId, RunLoop};
use tracing::{debug, info};

use crate::markers::ElementTable;
use crate::report::{Step, StepReport};
use crate::transforms::elements;

/// Rate re-assertion for one playing video.
struct FrameSync {
    frame_loop: FrameLoop<RunLoop>,
    on_play: ListenerId,
}

#[derive(Default)]
struct ControllerState {
    settings: Settings,
    frame_sync: ElementTable<FrameSync>,
    visibility_listener: Option<ListenerId>,
    paused_while_hidden: ElementTable<()>,
}

struct Inner {
    config: MediaConfig,
    state: RefCell<ControllerState>,
}

/// Shared handle; clones drive the same state.
#[derive(Clone)]
pub struct MediaController {
    inner: Rc<Inner>,
}

impl MediaController {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                state: RefCell::new(ControllerState::default()),
            }),
        }
    }

    /// Apply the playback policy of `settings` to every media element.
    pub fn apply(&self, rl: &mut RunLoop, settings: &Settings) -> StepReport {
        {
            let mut state = self.inner.state.borrow_mut();
            state.settings = settings.clone();
            state.frame_sync.sweep(rl.document());
            state.paused_while_hidden.sweep(rl.document());
        }
        if !settings.fps_smoother {
            self.stop_frame_sync(rl);
        }

        let mut report = StepReport::default();
        for id in elements(rl.document(), "video") {
            let outcome = self.optimize_video(rl, id, settings);
            report.record(Step::Media, id, outcome);
        }
        for id in elements(rl.document(), "audio") {
            let outcome = optimize_audio(rl.document_mut(), id, settings);
            report.record(Step::Media, id, outcome);
        }
        report
    }

    /// Install the visibility listener unless it is already in place.
    pub fn install_visibility_listener(&self, rl: &mut RunLoop) -> PageResult<bool> {
        if let Some(existing) = self.inner.state.borrow().visibility_listener {
            if rl.has_listener(existing) {
                return Ok(false);
            }
        }
        let weak = Rc::downgrade(&self.inner);
        let id = rl
            .add_event_listener(EventTarget::Document, EventKind::VisibilityChange, move |rl, _| {
                if let Some(inner) = weak.upgrade() {
                    on_visibility_change(&inner, rl);
                }
            })
            .map_err(|e| PageError::InvalidState(e.to_string()))?;
        self.inner.state.borrow_mut().visibility_listener = Some(id);
        info!("visibility listener installed");
        Ok(true)
    }

    pub fn has_visibility_listener(&self) -> bool {
        self.inner.state.borrow().visibility_listener.is_some()
    }

    /// Number of videos with rate re-assertion attached.
    pub fn frame_sync_count(&self) -> usize {
        self.inner.state.borrow().frame_sync.len()
    }

    pub fn is_frame_syncing(&self, id: NodeId) -> bool {
        self.inner
            .state
            .borrow()
            .frame_sync
            .get(id)
            .is_some_and(|sync| sync.frame_loop.is_running())
    }

    /// Stop every frame loop and drop their play listeners.
    pub fn stop_frame_sync(&self, rl: &mut RunLoop) {
        let syncs = self.inner.state.borrow_mut().frame_sync.drain();
        if syncs.is_empty() {
            return;
        }
        debug!(count = syncs.len(), "frame sync stopped");
        for (_, sync) in syncs {
            sync.frame_loop.stop(rl);
            rl.remove_event_listener(sync.on_play);
        }
    }

    /// Drop everything this controller registered on the page.
    pub fn teardown(&self, rl: &mut RunLoop) {
        self.stop_frame_sync(rl);
        let listener = {
            let mut state = self.inner.state.borrow_mut();
            state.paused_while_hidden.drain();
            state.visibility_listener.take()
        };
        if let Some(id) = listener {
            rl.remove_event_listener(id);
        }
    }

    fn optimize_video(&self, rl: &mut RunLoop, id: NodeId, settings: &Settings) -> PageResult<bool> {
        let doc = rl.document_mut();
        let mut changed = settle_preload(doc, id)?;
        changed |= set_flag_attr(doc, id, "controls")?;
        changed |= set_flag_attr(doc, id, "disablepictureinpicture")?;
        if settings.disable_video_autoplay {
            changed |= suppress_autoplay(doc, id)?;
        }
        if settings.fps_smoother {
            changed |= self.ensure_frame_sync(rl, id)?;
        }
        if settings.force_quality {
            changed |= self.force_quality(rl, id)?;
        }
        Ok(changed)
    }

    fn ensure_frame_sync(&self, rl: &mut RunLoop, id: NodeId) -> PageResult<bool> {
        rl.document_mut().media_mut(id)?.playback_rate = 1.0;

        let existing = self
            .inner
            .state
            .borrow()
            .frame_sync
            .get(id)
            .map(|sync| sync.frame_loop.clone());
        let (frame_loop, created) = match existing {
            Some(frame_loop) => (frame_loop, false),
            None => {
                let frame_loop = self.frame_loop_for(id);
                let on_play = frame_loop.clone();
                let listener = rl
                    .add_event_listener(EventTarget::Element(id), EventKind::Play, move |rl, _| {
                        on_play.start(rl);
                    })
                    .map_err(|_| PageError::NodeGone(id))?;
                self.inner.state.borrow_mut().frame_sync.insert(
                    id,
                    FrameSync {
                        frame_loop: frame_loop.clone(),
                        on_play: listener,
                    },
                );
                (frame_loop, true)
            }
        };
        if is_playing(rl.document(), id) {
            frame_loop.start(rl);
        }
        Ok(created)
    }

    fn frame_loop_for(&self, id: NodeId) -> FrameLoop<RunLoop> {
        FrameLoop::new(
            Duration::from_millis(self.inner.config.frame_interval_ms),
            move |rl: &RunLoop| is_playing(rl.document(), id),
            move |rl: &mut RunLoop| {
                if let Ok(media) = rl.document_mut().media_mut(id) {
                    media.playback_rate = 1.0;
                }
            },
        )
    }

    fn force_quality(&self, rl: &mut RunLoop, id: NodeId) -> PageResult<bool> {
        let config = &self.inner.config;
        if let Some(player) = rl.window_mut().player_mut() {
            if let Err(e) = player.set_playback_quality(&config.quality_label) {
                debug!(error = %e, "site player refused quality change");
            }
        }
        let media = rl.document_mut().media_mut(id)?;
        match &media.quality {
            Some(current) if *current != config.quality_hint => {
                media.quality = Some(config.quality_hint.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn optimize_audio(doc: &mut Document, id: NodeId, settings: &Settings) -> PageResult<bool> {
    if settings.disable_audio_autoplay {
        suppress_autoplay(doc, id)
    } else {
        Ok(false)
    }
}

fn is_playing(doc: &Document, id: NodeId) -> bool {
    doc.media(id).is_some_and(MediaState::is_playing)
}

/// Anything but an explicit `metadata` or `auto` becomes `none`.
fn settle_preload(doc: &mut Document, id: NodeId) -> PageResult<bool> {
    let preload = doc.attr(id, "preload").map(str::to_ascii_lowercase);
    match preload.as_deref() {
        Some("metadata" | "auto" | "none") => Ok(false),
        _ => {
            doc.set_attr(id, "preload", "none")?;
            Ok(true)
        }
    }
}

fn set_flag_attr(doc: &mut Document, id: NodeId, name: &str) -> PageResult<bool> {
    if doc.has_attr(id, name) {
        return Ok(false);
    }
    doc.set_attr(id, name, "")?;
    Ok(true)
}

/// Clear `autoplay` and stop playback it already started.
fn suppress_autoplay(doc: &mut Document, id: NodeId) -> PageResult<bool> {
    if !doc.remove_attr(id, "autoplay")? {
        return Ok(false);
    }
    if is_playing(doc, id) {
        doc.pause(id)?;
    }
    Ok(true)
}

fn on_visibility_change(inner: &Inner, rl: &mut RunLoop) {
    if rl.window().is_hidden() {
        let mut paused = 0;
        for id in elements(rl.document(), "video") {
            if !is_playing(rl.document(), id) {
                continue;
            }
            match rl.document_mut().pause(id) {
                Ok(()) => {
                    inner.state.borrow_mut().paused_while_hidden.insert(id, ());
                    paused += 1;
                }
                Err(e) => debug!(video = ?id, error = %e, "pause on hide failed"),
            }
        }
        debug!(paused, "page hidden");
        return;
    }

    let (resume, autoplay_blocked) = {
        let mut state = inner.state.borrow_mut();
        (
            state.paused_while_hidden.drain(),
            state.settings.disable_video_autoplay,
        )
    };
    if autoplay_blocked {
        debug!(count = resume.len(), "page shown; autoplay disabled, videos stay paused");
        return;
    }
    for (id, ()) in resume {
        if !rl.document().is_connected(id) {
            continue;
        }
        if let Err(e) = rl.document_mut().play(id) {
            debug!(video = ?id, error = %e, "resume on show failed");
        }
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
