//! RunLoop metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// RunLoop metrics.
#[derive(Debug, Default)]
pub struct RunLoopMetrics {
    /// Timer callbacks fired.
    pub timers_fired: AtomicU64,

    /// Paint frames run.
    pub frames_run: AtomicU64,

    /// Events taken off the page queue.
    pub events_dispatched: AtomicU64,

    /// Listener invocations.
    pub listener_calls: AtomicU64,

    /// Mutation record batches taken off the page.
    pub mutation_batches: AtomicU64,

    /// Observer callback invocations.
    pub observer_callbacks: AtomicU64,

    /// Listeners dropped because their element was removed.
    pub listeners_swept: AtomicU64,
}

impl RunLoopMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_timer_fired(&self) {
        self.timers_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_listener_call(&self) {
        self.listener_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mutation_batch(&self) {
        self.mutation_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_observer_callback(&self) {
        self.observer_callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_listeners_swept(&self, count: u64) {
        self.listeners_swept.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of the counters at virtual time `now_ms`.
    pub fn snapshot(&self, now_ms: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            now_ms,
            timers_fired: self.timers_fired.load(Ordering::Relaxed),
            frames_run: self.frames_run.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            listener_calls: self.listener_calls.load(Ordering::Relaxed),
            mutation_batches: self.mutation_batches.load(Ordering::Relaxed),
            observer_callbacks: self.observer_callbacks.load(Ordering::Relaxed),
            listeners_swept: self.listeners_swept.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in virtual time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub now_ms: u64,
    pub timers_fired: u64,
    pub frames_run: u64,
    pub events_dispatched: u64,
    pub listener_calls: u64,
    pub mutation_batches: u64,
    pub observer_callbacks: u64,
    pub listeners_swept: u64,
}

impl MetricsSnapshot {
    /// Paint frames per virtual second.
    pub fn frames_per_second(&self) -> f64 {
        if self.now_ms == 0 {
            return 0.0;
        }
        self.frames_run as f64 * 1000.0 / self.now_ms as f64
    }

    /// Average listener invocations per dispatched event.
    pub fn listeners_per_event(&self) -> f64 {
        if self.events_dispatched == 0 {
            return 0.0;
        }
        self.listener_calls as f64 / self.events_dispatched as f64
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
