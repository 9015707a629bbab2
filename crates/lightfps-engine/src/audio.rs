//! Audio graph manager: a three-band equalizer in front of every media
//! element.
//!
//! All graphs share one lazily created context. Each media element gets
//!
//! ```text
//! source ──► lowshelf ──► peaking ──► highshelf ──► destination
//! ```
//!
//! An element's source can only ever be captured once, so a preset change
//! tears the filters down and rewires the same source. Disabling closes the
//! context; captured elements cannot be rewired afterwards and are counted
//! as failures if better sound is switched back on.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lightfps_config::{EqualizerConfig, SoundPreset};
use lightfps_page::{
    AudioContextId, AudioHost, AudioNodeId, BiquadKind, ContextState, EventKind, EventTarget,
    NodeId, PageError, PageResult,
};
use lightfps_runloop::{ListenerId, ObserveOptions, ObserverId, RunLoop};
use tracing::{debug, info, warn};

use crate::markers::ElementTable;
use crate::report::{Step, StepReport};
use crate::transforms::{body_parent, elements};

/// One element's wiring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioGraph {
    pub preset: SoundPreset,
    pub source: AudioNodeId,
    /// Low shelf, peaking, high shelf.
    pub filters: [AudioNodeId; 3],
}

#[derive(Default)]
struct AudioState {
    context: Option<AudioContextId>,
    preset: SoundPreset,
    graphs: ElementTable<AudioGraph>,
    resume_listeners: ElementTable<ListenerId>,
    observer: Option<ObserverId>,
}

struct Inner {
    config: EqualizerConfig,
    state: RefCell<AudioState>,
}

#[derive(Clone)]
pub struct AudioGraphManager {
    inner: Rc<Inner>,
}

impl AudioGraphManager {
    pub fn new(config: EqualizerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                state: RefCell::new(AudioState::default()),
            }),
        }
    }

    pub fn context(&self) -> Option<AudioContextId> {
        self.inner.state.borrow().context
    }

    pub fn graph(&self, element: NodeId) -> Option<AudioGraph> {
        self.inner.state.borrow().graphs.get(element).copied()
    }

    pub fn graph_count(&self) -> usize {
        self.inner.state.borrow().graphs.len()
    }

    pub fn is_active(&self) -> bool {
        let state = self.inner.state.borrow();
        state.context.is_some() || state.observer.is_some() || !state.graphs.is_empty()
    }

    /// Equalize every media element with `preset` and watch for new ones.
    pub fn apply(&self, rl: &mut RunLoop, preset: SoundPreset) -> StepReport {
        let mut report = StepReport::default();
        if !rl.window().audio().is_supported() {
            warn!("audio processing unavailable; better sound skipped");
            report.failed += 1;
            return report;
        }
        let ctx = match self.ensure_context(rl.window_mut().audio_mut()) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "audio context unavailable");
                report.failed += 1;
                return report;
            }
        };
        self.inner.state.borrow_mut().preset = preset;
        self.inner.sweep(rl);

        for id in elements(rl.document(), "video, audio") {
            let outcome = Inner::attach(&self.inner, rl, ctx, id);
            report.record(Step::Audio, id, outcome);
        }
        self.install_observer(rl);
        report
    }

    /// Tear every graph down and close the shared context. Safe to repeat.
    pub fn disable(&self, rl: &mut RunLoop) -> usize {
        let (graphs, listeners, observer, context) = {
            let mut state = self.inner.state.borrow_mut();
            (
                state.graphs.drain(),
                state.resume_listeners.drain(),
                state.observer.take(),
                state.context.take(),
            )
        };
        if let Some(id) = observer {
            rl.disconnect(id);
        }
        for (_, listener) in listeners {
            rl.remove_event_listener(listener);
        }
        let audio = rl.window_mut().audio_mut();
        for (_, graph) in &graphs {
            teardown(audio, graph);
        }
        if let Some(ctx) = context {
            if audio.context_state(ctx) != Some(ContextState::Closed) {
                if let Err(e) = audio.close(ctx) {
                    debug!(error = %e, "audio context close failed");
                }
            }
        }
        if !graphs.is_empty() {
            info!(count = graphs.len(), "audio graphs torn down");
        }
        graphs.len()
    }

    fn ensure_context(&self, audio: &mut AudioHost) -> PageResult<AudioContextId> {
        let mut state = self.inner.state.borrow_mut();
        if let Some(ctx) = state.context {
            if audio.context_state(ctx) != Some(ContextState::Closed) {
                return Ok(ctx);
            }
        }
        let ctx = audio.create_context()?;
        debug!(context = ?ctx, "audio context created");
        state.context = Some(ctx);
        Ok(ctx)
    }

    fn install_observer(&self, rl: &mut RunLoop) {
        if let Some(previous) = self.inner.state.borrow_mut().observer.take() {
            rl.disconnect(previous);
        }
        let root = body_parent(rl.document());
        let weak = Rc::downgrade(&self.inner);
        match rl.observe(root, ObserveOptions::subtree(), move |rl, records| {
            let Some(inner) = weak.upgrade() else { return };
            if records.iter().any(|record| !record.removed.is_empty()) {
                inner.sweep(rl);
            }
            let Some(ctx) = inner.state.borrow().context else { return };
            for record in records {
                for added in &record.added {
                    attach_subtree(&inner, rl, ctx, *added);
                }
            }
        }) {
            Ok(id) => self.inner.state.borrow_mut().observer = Some(id),
            Err(e) => warn!(error = %e, "audio observer not installed"),
        }
    }
}

fn attach_subtree(inner: &Rc<Inner>, rl: &mut RunLoop, ctx: AudioContextId, node: NodeId) {
    let doc = rl.document();
    let mut candidates = vec![node];
    candidates.extend(doc.descendants(node));
    candidates.retain(|id| doc.element(*id).is_some_and(|el| el.is_media()));
    for id in candidates {
        if let Err(e) = Inner::attach(inner, rl, ctx, id) {
            debug!(element = ?id, error = %e, "late media not equalized");
        }
    }
}

impl Inner {
    /// Build (or rebuild) the graph for one element.
    fn attach(this: &Rc<Inner>, rl: &mut RunLoop, ctx: AudioContextId, id: NodeId) -> PageResult<bool> {
        let (preset, old) = {
            let mut state = this.state.borrow_mut();
            let preset = state.preset;
            if state.graphs.get(id).is_some_and(|graph| graph.preset == preset) {
                drop(state);
                this.ensure_resume_listener(rl, id)?;
                return Ok(false);
            }
            (preset, state.graphs.remove(id))
        };

        let audio = rl.window_mut().audio_mut();
        let source = match old {
            Some(old) => {
                teardown(audio, &old);
                old.source
            }
            None => match audio.source_for(id) {
                Some(existing) => existing,
                None => audio.create_media_element_source(ctx, id)?,
            },
        };
        let filters = this.wire(audio, ctx, source, preset)?;
        this.state.borrow_mut().graphs.insert(
            id,
            AudioGraph {
                preset,
                source,
                filters,
            },
        );
        debug!(element = ?id, %preset, "audio graph built");

        this.ensure_resume_listener(rl, id)?;
        if rl.document().media(id).is_some_and(|m| m.is_playing()) {
            resume_context(this, rl);
        }
        Ok(true)
    }

    fn wire(
        &self,
        audio: &mut AudioHost,
        ctx: AudioContextId,
        source: AudioNodeId,
        preset: SoundPreset,
    ) -> PageResult<[AudioNodeId; 3]> {
        let config = &self.config;
        let gains = config.gains(preset);
        let filters = [
            audio.create_biquad(ctx, BiquadKind::LowShelf, config.low_frequency, 1.0, gains.low)?,
            audio.create_biquad(ctx, BiquadKind::Peaking, config.mid_frequency, config.mid_q, gains.mid)?,
            audio.create_biquad(ctx, BiquadKind::HighShelf, config.high_frequency, 1.0, gains.high)?,
        ];
        let destination = audio.destination(ctx)?;
        let chain = [source, filters[0], filters[1], filters[2], destination];
        for pair in chain.windows(2) {
            if let Err(e) = audio.connect(pair[0], pair[1]) {
                let _ = audio.disconnect(source);
                for filter in filters {
                    audio.release(filter);
                }
                return Err(e);
            }
        }
        Ok(filters)
    }

    /// Resume the shared context when the element starts playing.
    fn ensure_resume_listener(self: &Rc<Self>, rl: &mut RunLoop, id: NodeId) -> PageResult<()> {
        if self.state.borrow().resume_listeners.contains(id) {
            return Ok(());
        }
        let weak: Weak<Inner> = Rc::downgrade(self);
        let listener = rl
            .add_event_listener(EventTarget::Element(id), EventKind::Play, move |rl, _| {
                if let Some(inner) = weak.upgrade() {
                    resume_context(&inner, rl);
                }
            })
            .map_err(|_| PageError::NodeGone(id))?;
        self.state.borrow_mut().resume_listeners.insert(id, listener);
        Ok(())
    }

    /// Drop graphs of elements that left the page.
    fn sweep(&self, rl: &mut RunLoop) {
        let (gone, listeners) = {
            let mut state = self.state.borrow_mut();
            (
                state.graphs.sweep(rl.document()),
                state.resume_listeners.sweep(rl.document()),
            )
        };
        for (_, listener) in listeners {
            rl.remove_event_listener(listener);
        }
        let departed: Vec<NodeId> = rl
            .window()
            .audio()
            .bound_elements()
            .into_iter()
            .filter(|id| !rl.document().is_alive(*id))
            .collect();
        let audio = rl.window_mut().audio_mut();
        for (_, graph) in &gone {
            teardown(audio, graph);
        }
        for id in departed {
            audio.forget_element(id);
        }
        if !gone.is_empty() {
            debug!(count = gone.len(), "audio graphs of removed elements released");
        }
    }
}

fn resume_context(inner: &Inner, rl: &mut RunLoop) {
    let Some(ctx) = inner.state.borrow().context else { return };
    let audio = rl.window_mut().audio_mut();
    if audio.context_state(ctx) == Some(ContextState::Suspended) {
        match audio.resume(ctx) {
            Ok(()) => debug!(context = ?ctx, "audio context resumed"),
            Err(e) => debug!(error = %e, "audio context resume failed"),
        }
    }
}

fn teardown(audio: &mut AudioHost, graph: &AudioGraph) {
    let _ = audio.disconnect(graph.source);
    for filter in graph.filters {
        audio.release(filter);
    }
}

#[cfg(test)]
#[path = "audio_tests.rs"]
mod tests;
