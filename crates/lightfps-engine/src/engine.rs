//! The orchestrator and page entry point.

use std::cell::RefCell;
use std::rc::Rc;

use lightfps_config::{EngineConfig, Settings};
use lightfps_page::{EventKind, EventTarget, ReadyState};
use lightfps_protocols::RuntimeMessage;
use lightfps_runloop::{ListenerId, RunLoop};
use tracing::{debug, info, warn};

use crate::audio::AudioGraphManager;
use crate::error::EngineResult;
use crate::markers::ElementTable;
use crate::media::MediaController;
use crate::report::{RunReport, Step};
use crate::tracker::TrackerSuppressor;
use crate::transforms::minimal_ui::MinimalUi;
use crate::transforms::reduce_memory::ReduceMemory;
use crate::transforms::{dark_mode, gif_freeze, lazy_load, sharpen, styles};

/// Where a run gets its options from.
pub trait SnapshotSource {
    fn snapshot(&self) -> EngineResult<Settings>;
}

impl SnapshotSource for Settings {
    fn snapshot(&self) -> EngineResult<Settings> {
        Ok(self.clone())
    }
}

/// Settings that can change between runs on the same page.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Rc<RefCell<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Rc::new(RefCell::new(settings)))
    }

    pub fn get(&self) -> Settings {
        self.0.borrow().clone()
    }

    pub fn set(&self, settings: Settings) {
        *self.0.borrow_mut() = settings;
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.0.borrow_mut());
    }
}

impl SnapshotSource for SharedSettings {
    fn snapshot(&self) -> EngineResult<Settings> {
        Ok(self.get())
    }
}

/// What [`Engine::trigger`] did.
#[derive(Debug, Clone)]
pub enum Trigger {
    Ran(RunReport),
    /// The document is still loading; the run happens on `DOMContentLoaded`.
    Deferred,
}

#[derive(Default)]
struct EngineState {
    runs: u64,
    sharpened: ElementTable<()>,
    pending: Option<Settings>,
    load_listener: Option<ListenerId>,
}

struct Inner {
    source: Box<dyn SnapshotSource>,
    config: EngineConfig,
    media: MediaController,
    tracker: TrackerSuppressor,
    audio: AudioGraphManager,
    reduce_memory: ReduceMemory,
    minimal_ui: MinimalUi,
    state: RefCell<EngineState>,
}

/// One page's engine. Clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<Inner>,
}

impl Engine {
    pub fn new(config: EngineConfig, source: impl SnapshotSource + 'static) -> EngineResult<Self> {
        let reduce_memory = ReduceMemory::new(&config.reduce_memory)?;
        let minimal_ui = MinimalUi::new(&config.minimal_ui);
        Ok(Self {
            inner: Rc::new(Inner {
                source: Box::new(source),
                media: MediaController::new(config.media.clone()),
                tracker: TrackerSuppressor::new(config.tracker.clone()),
                audio: AudioGraphManager::new(config.equalizer.clone()),
                reduce_memory,
                minimal_ui,
                config,
                state: RefCell::new(EngineState::default()),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn media(&self) -> &MediaController {
        &self.inner.media
    }

    pub fn tracker(&self) -> &TrackerSuppressor {
        &self.inner.tracker
    }

    pub fn audio(&self) -> &AudioGraphManager {
        &self.inner.audio
    }

    /// Completed runs on this page.
    pub fn runs(&self) -> u64 {
        self.inner.state.borrow().runs
    }

    /// Read a snapshot and run now, or once the document finishes loading.
    pub fn trigger(&self, rl: &mut RunLoop) -> EngineResult<Trigger> {
        let settings = self.inner.source.snapshot()?;
        if rl.document().ready_state() == ReadyState::Loading {
            self.defer(rl, settings)?;
            return Ok(Trigger::Deferred);
        }
        Ok(Trigger::Ran(self.run_with(rl, &settings)))
    }

    /// Runtime message handler. Only `applyOptimizations` does anything.
    pub fn handle_message(
        &self,
        rl: &mut RunLoop,
        message: &RuntimeMessage,
    ) -> EngineResult<Option<Trigger>> {
        if !message.is_apply_optimizations() {
            debug!(action = %message.action, "message ignored");
            return Ok(None);
        }
        self.trigger(rl).map(Some)
    }

    fn defer(&self, rl: &mut RunLoop, settings: Settings) -> EngineResult<()> {
        let installed = {
            let mut state = self.inner.state.borrow_mut();
            state.pending = Some(settings);
            state.load_listener.is_some_and(|id| rl.has_listener(id))
        };
        if installed {
            debug!("run already waiting for DOMContentLoaded");
            return Ok(());
        }

        let weak = Rc::downgrade(&self.inner);
        let id = rl.add_event_listener(
            EventTarget::Document,
            EventKind::DomContentLoaded,
            move |rl, _| {
                let Some(inner) = weak.upgrade() else { return };
                let (listener, pending) = {
                    let mut state = inner.state.borrow_mut();
                    (state.load_listener.take(), state.pending.take())
                };
                if let Some(listener) = listener {
                    rl.remove_event_listener(listener);
                }
                if let Some(settings) = pending {
                    Engine { inner }.run_with(rl, &settings);
                }
            },
        )?;
        self.inner.state.borrow_mut().load_listener = Some(id);
        debug!("run deferred until DOMContentLoaded");
        Ok(())
    }

    /// One orchestration run with an explicit snapshot.
    pub fn run_with(&self, rl: &mut RunLoop, settings: &Settings) -> RunReport {
        let run = {
            let mut state = self.inner.state.borrow_mut();
            state.runs += 1;
            state.runs
        };
        let mut report = RunReport {
            run,
            enabled: settings.auto_optimize,
            ..RunReport::default()
        };
        if !settings.auto_optimize {
            info!(run, "auto optimize is off; nothing applied");
            return report;
        }

        let inner = &self.inner;
        for step in Step::ORDER {
            if !enabled(step, settings) {
                if self.revert(rl, step) {
                    report.reverted.push(step);
                }
                continue;
            }
            let outcome = match step {
                Step::Media => {
                    if let Err(e) = inner.media.install_visibility_listener(rl) {
                        warn!(error = %e, "visibility listener not installed");
                    }
                    inner.media.apply(rl, settings)
                }
                Step::LazyLoad => lazy_load::apply(rl.document_mut()),
                Step::Tracker => inner.tracker.apply(rl),
                Step::DarkMode => dark_mode::apply(rl.document_mut(), &inner.config.dark_mode),
                Step::ReduceMemory => inner.reduce_memory.apply(rl),
                Step::DisableAnimations => {
                    styles::apply(rl.document_mut(), step, styles::DISABLE_ANIMATIONS)
                }
                Step::Sharpen => {
                    let mut state = inner.state.borrow_mut();
                    sharpen::enable(rl.document_mut(), &mut state.sharpened)
                }
                Step::ReduceMotion => styles::apply(rl.document_mut(), step, styles::REDUCE_MOTION),
                Step::FontSmoothing => {
                    styles::apply(rl.document_mut(), step, styles::FONT_SMOOTHING)
                }
                Step::GifFreeze => gif_freeze::apply(rl.window_mut()),
                Step::MinimalUi => inner.minimal_ui.apply(rl.document_mut()),
                Step::Audio => inner.audio.apply(rl, settings.sound_preset),
            };
            report.push(step, outcome);
        }

        let total = report.total();
        info!(
            run,
            steps = report.steps.len(),
            applied = total.applied,
            failed = total.failed,
            "optimizations applied"
        );
        report
    }

    /// Undo a switched-off step that left state behind.
    fn revert(&self, rl: &mut RunLoop, step: Step) -> bool {
        let inner = &self.inner;
        match step {
            Step::Sharpen => {
                let mut state = inner.state.borrow_mut();
                let present = rl.document().get_element_by_id(sharpen::FILTER_ASSET_ID).is_some();
                if state.sharpened.is_empty() && !present {
                    return false;
                }
                sharpen::disable(rl.document_mut(), &mut state.sharpened);
                true
            }
            Step::Tracker if inner.tracker.is_active() => {
                inner.tracker.stop(rl);
                true
            }
            Step::Audio if inner.audio.is_active() => {
                inner.audio.disable(rl);
                true
            }
            _ => false,
        }
    }

    /// Drop every listener, observer and timer the engine owns and close the
    /// audio context. Safe to call more than once.
    pub fn teardown(&self, rl: &mut RunLoop) {
        let listener = {
            let mut state = self.inner.state.borrow_mut();
            state.pending = None;
            state.load_listener.take()
        };
        if let Some(id) = listener {
            rl.remove_event_listener(id);
        }
        self.inner.media.teardown(rl);
        self.inner.tracker.stop(rl);
        self.inner.reduce_memory.cancel(rl);
        self.inner.audio.disable(rl);
        debug!("engine torn down");
    }
}

/// Whether `settings` switches `step` on.
pub fn enabled(step: Step, settings: &Settings) -> bool {
    match step {
        Step::Media => true,
        Step::LazyLoad => settings.lazy_load_media,
        Step::Tracker => settings.block_tracking,
        Step::DarkMode => settings.enable_dark_mode,
        Step::ReduceMemory => settings.reduce_memory,
        Step::DisableAnimations => settings.disable_animations,
        Step::Sharpen => settings.enhance_sharpness,
        Step::ReduceMotion => settings.reduce_motion,
        Step::FontSmoothing => settings.font_smoothing,
        Step::GifFreeze => settings.disable_gif_autoplay,
        Step::MinimalUi => settings.enable_minimal_ui,
        Step::Audio => settings.better_sound,
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
