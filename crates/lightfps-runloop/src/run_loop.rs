//! The page event loop.

use std::rc::Rc;
use std::time::Duration;

use lightfps_page::{Document, EventKind, EventTarget, MutationRecord, NodeId, PageEvent, Window};
use tracing::{debug, trace};

use crate::config::RunLoopConfig;
use crate::error::{RunLoopError, RunLoopResult};
use crate::listener::{EventCallback, ListenerId, ListenerRegistry};
use crate::metrics::{MetricsSnapshot, RunLoopMetrics};
use crate::observer::{MutationCallback, ObserveOptions, ObserverId, ObserverRegistry};
use crate::timer::{FrameId, FrameQueue, IntervalCallback, TimerId, TimerQueue, TimerTask};

/// A single-threaded event loop over one [`Window`] with a virtual clock.
///
/// Time only moves in [`advance`](Self::advance). Each step (a timer, a
/// frame callback) is followed by a drain of pending mutation records and
/// events, so callbacks always observe a settled page.
pub struct RunLoop {
    window: Window,
    config: RunLoopConfig,
    now_ms: u64,
    next_id: u64,
    timers: TimerQueue,
    frames: FrameQueue,
    listeners: ListenerRegistry,
    observers: ObserverRegistry,
    metrics: RunLoopMetrics,
}

impl RunLoop {
    pub fn new(window: Window) -> Self {
        Self::with_config(window, RunLoopConfig::default())
    }

    pub fn with_config(window: Window, config: RunLoopConfig) -> Self {
        Self {
            window,
            config,
            now_ms: 0,
            next_id: 0,
            timers: TimerQueue::default(),
            frames: FrameQueue::default(),
            listeners: ListenerRegistry::default(),
            observers: ObserverRegistry::default(),
            metrics: RunLoopMetrics::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ---- accessors ---------------------------------------------------------

    pub fn config(&self) -> &RunLoopConfig {
        &self.config
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn document(&self) -> &Document {
        self.window.document()
    }

    pub fn document_mut(&mut self) -> &mut Document {
        self.window.document_mut()
    }

    /// Consume the loop and hand back the page.
    pub fn into_window(self) -> Window {
        self.window
    }

    /// Virtual milliseconds since the loop was created.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }

    pub fn metrics(&self) -> &RunLoopMetrics {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.now_ms)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn has_timer(&self, id: TimerId) -> bool {
        self.timers.contains(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listener_count_for(&self, target: EventTarget, kind: EventKind) -> usize {
        self.listeners.count_for(target, kind)
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_observing(&self, id: ObserverId) -> bool {
        self.observers.contains(id)
    }

    // ---- timers and frames -------------------------------------------------

    /// Run `callback` once after `delay`.
    pub fn set_timeout(
        &mut self,
        delay: Duration,
        callback: impl FnOnce(&mut RunLoop) + 'static,
    ) -> TimerId {
        let id = TimerId(self.next_id());
        let due = self.now_ms + delay.as_millis() as u64;
        self.timers.insert(id, due, TimerTask::Once(Box::new(callback)));
        id
    }

    /// Run `callback` every `interval` (at least 1 ms) until cleared.
    pub fn set_interval(
        &mut self,
        interval: Duration,
        callback: impl Fn(&mut RunLoop) + 'static,
    ) -> TimerId {
        let id = TimerId(self.next_id());
        let interval_ms = (interval.as_millis() as u64).max(1);
        let callback: IntervalCallback = Rc::new(callback);
        self.timers.insert(
            id,
            self.now_ms + interval_ms,
            TimerTask::Repeating {
                interval_ms,
                callback,
            },
        );
        id
    }

    /// Cancel a timeout or interval. Returns whether it was pending.
    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(id)
    }

    /// Run `callback` on the next paint frame.
    pub fn request_frame(&mut self, callback: impl FnOnce(&mut RunLoop) + 'static) -> FrameId {
        let id = FrameId(self.next_id());
        let interval = self.config.frame_interval().as_millis() as u64;
        self.frames.push(id, Box::new(callback), self.now_ms, interval);
        id
    }

    pub fn cancel_frame(&mut self, id: FrameId) -> bool {
        self.frames.cancel(id)
    }

    // ---- listeners and observers -------------------------------------------

    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        callback: impl Fn(&mut RunLoop, &PageEvent) + 'static,
    ) -> RunLoopResult<ListenerId> {
        self.add_shared_listener(target, kind, Rc::new(callback))
    }

    /// Register an already shared callback.
    pub fn add_shared_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        callback: EventCallback,
    ) -> RunLoopResult<ListenerId> {
        if let EventTarget::Element(node) = target {
            if !self.document().is_alive(node) {
                return Err(RunLoopError::DeadTarget(node));
            }
        }
        let id = ListenerId(self.next_id());
        self.listeners.add(id, target, kind, callback);
        trace!(listener = ?id, ?target, ?kind, "listener added");
        Ok(id)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Observe child-list mutations under `root`.
    pub fn observe(
        &mut self,
        root: NodeId,
        options: ObserveOptions,
        callback: impl Fn(&mut RunLoop, &[MutationRecord]) + 'static,
    ) -> RunLoopResult<ObserverId> {
        if !self.document().is_alive(root) {
            return Err(RunLoopError::DeadTarget(root));
        }
        let id = ObserverId(self.next_id());
        let callback: MutationCallback = Rc::new(callback);
        self.observers.add(id, root, options, callback);
        debug!(observer = ?id, ?root, subtree = options.subtree, "observer connected");
        Ok(id)
    }

    /// Stop an observer. Pending records it has not yet seen are dropped for it.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    // ---- driving -----------------------------------------------------------

    /// Queue an event as if the page raised it.
    pub fn dispatch_event(&mut self, event: PageEvent) {
        self.document_mut().push_event(event);
    }

    /// Deliver everything pending and fire timers already due, without
    /// moving time.
    pub fn run_until_idle(&mut self) -> RunLoopResult<()> {
        self.drain()?;
        while let Some((id, due, task)) = self.timers.pop_due(self.now_ms) {
            self.fire_timer(id, due, task);
            self.drain()?;
        }
        Ok(())
    }

    /// Move virtual time forward by `duration`, running timers and frames in
    /// time order. Timers win ties with frames.
    pub fn advance(&mut self, duration: Duration) -> RunLoopResult<()> {
        let target = self.now_ms + duration.as_millis() as u64;
        self.run_until_idle()?;

        loop {
            let next_timer = self.timers.next_due();
            let next_frame = self.frames.next_at();
            let next = match (next_timer, next_frame) {
                (Some(t), Some(f)) => t.min(f),
                (Some(t), None) => t,
                (None, Some(f)) => f,
                (None, None) => break,
            };
            if next > target {
                break;
            }
            self.now_ms = self.now_ms.max(next);

            if next_timer == Some(next) {
                if let Some((id, due, task)) = self.timers.pop_due(self.now_ms) {
                    self.fire_timer(id, due, task);
                    self.drain()?;
                }
            } else {
                self.run_frame()?;
            }
        }

        self.now_ms = target;
        self.drain()
    }

    pub fn advance_ms(&mut self, ms: u64) -> RunLoopResult<()> {
        self.advance(Duration::from_millis(ms))
    }

    fn fire_timer(&mut self, id: TimerId, due: u64, task: TimerTask) {
        self.metrics.record_timer_fired();
        match task {
            TimerTask::Once(callback) => callback(self),
            TimerTask::Repeating {
                interval_ms,
                callback,
            } => {
                // Re-armed before the call so the callback can clear itself.
                self.timers.insert(
                    id,
                    due + interval_ms,
                    TimerTask::Repeating {
                        interval_ms,
                        callback: callback.clone(),
                    },
                );
                callback(self);
            }
        }
    }

    fn run_frame(&mut self) -> RunLoopResult<()> {
        self.metrics.record_frame();
        for (_, callback) in self.frames.take() {
            callback(self);
            self.drain()?;
        }
        Ok(())
    }

    /// Deliver mutation records first, then events one at a time, until
    /// both queues are empty.
    fn drain(&mut self) -> RunLoopResult<()> {
        let mut deliveries = 0usize;
        loop {
            deliveries += 1;
            if deliveries > self.config.microtask_limit {
                return Err(RunLoopError::MicrotaskLimit(self.config.microtask_limit));
            }

            let records = self.document_mut().take_mutations();
            if !records.is_empty() {
                self.deliver_mutations(records);
                continue;
            }
            match self.document_mut().pop_event() {
                Some(event) => self.dispatch(event),
                None => return Ok(()),
            }
        }
    }

    fn deliver_mutations(&mut self, records: Vec<MutationRecord>) {
        self.metrics.record_mutation_batch();

        if records.iter().any(|record| !record.removed.is_empty()) {
            let swept = self.listeners.sweep(self.window.document());
            if swept > 0 {
                self.metrics.record_listeners_swept(swept as u64);
                debug!(swept, "dropped listeners on removed elements");
            }
            self.observers.sweep(self.window.document());
        }

        for (id, callback, scoped) in self.observers.route(self.window.document(), &records) {
            if !self.observers.contains(id) {
                continue;
            }
            self.metrics.record_observer_callback();
            callback(self, &scoped);
        }
    }

    fn dispatch(&mut self, event: PageEvent) {
        self.metrics.record_event_dispatched();
        if let EventTarget::Element(node) = event.target {
            if !self.document().is_alive(node) {
                return;
            }
        }
        for (id, callback) in self.listeners.matching(&event) {
            if !self.listeners.contains(id) {
                continue;
            }
            self.metrics.record_listener_call();
            callback(self, &event);
        }
    }
}

#[cfg(test)]
#[path = "run_loop_tests.rs"]
mod tests;
