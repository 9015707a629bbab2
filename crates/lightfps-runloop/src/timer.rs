//! Timer and paint-frame queues.
//!
//! Timers are ordered by `(due, sequence)`, so timers due at the same
//! virtual millisecond fire in scheduling order.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::RunLoop;

/// One-shot timer or frame callback.
pub type TimerCallback = Box<dyn FnOnce(&mut RunLoop)>;

/// Repeating timer callback.
pub type IntervalCallback = Rc<dyn Fn(&mut RunLoop)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) u64);

pub(crate) enum TimerTask {
    Once(TimerCallback),
    Repeating {
        interval_ms: u64,
        callback: IntervalCallback,
    },
}

#[derive(Default)]
pub(crate) struct TimerQueue {
    order: BTreeMap<(u64, u64), TimerId>,
    tasks: HashMap<TimerId, ((u64, u64), TimerTask)>,
    seq: u64,
}

impl TimerQueue {
    pub(crate) fn insert(&mut self, id: TimerId, due_ms: u64, task: TimerTask) {
        self.seq += 1;
        let key = (due_ms, self.seq);
        self.order.insert(key, id);
        self.tasks.insert(id, (key, task));
    }

    pub(crate) fn remove(&mut self, id: TimerId) -> bool {
        match self.tasks.remove(&id) {
            Some((key, _)) => {
                self.order.remove(&key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: TimerId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub(crate) fn next_due(&self) -> Option<u64> {
        self.order.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest timer due at or before `now_ms`.
    pub(crate) fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, u64, TimerTask)> {
        let (&key, &id) = self.order.iter().next()?;
        if key.0 > now_ms {
            return None;
        }
        self.order.remove(&key);
        let (_, task) = self.tasks.remove(&id)?;
        Some((id, key.0, task))
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}

#[derive(Default)]
pub(crate) struct FrameQueue {
    pending: Vec<(FrameId, TimerCallback)>,
    next_at: Option<u64>,
}

impl FrameQueue {
    pub(crate) fn push(&mut self, id: FrameId, callback: TimerCallback, now_ms: u64, interval_ms: u64) {
        if self.pending.is_empty() {
            self.next_at = Some((now_ms / interval_ms + 1) * interval_ms);
        }
        self.pending.push((id, callback));
    }

    pub(crate) fn cancel(&mut self, id: FrameId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != id);
        if self.pending.is_empty() {
            self.next_at = None;
        }
        before != self.pending.len()
    }

    pub(crate) fn next_at(&self) -> Option<u64> {
        self.next_at
    }

    /// Take every callback registered for the upcoming frame.
    pub(crate) fn take(&mut self) -> Vec<(FrameId, TimerCallback)> {
        self.next_at = None;
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
