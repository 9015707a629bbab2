//! Scheduling combinators: [`Debounce`] and [`FrameLoop`].
//!
//! Both are generic over [`Scheduler`] so they can run against the page
//! [`RunLoop`] or any other clock that hands itself to callbacks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::RunLoop;
use crate::timer::{FrameId, TimerId};

/// Handle to something a [`Scheduler`] will run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskHandle {
    Timer(TimerId),
    Frame(FrameId),
}

/// A clock that runs deferred callbacks with mutable access to itself.
pub trait Scheduler: Sized + 'static {
    fn now_ms(&self) -> u64;

    fn schedule_after(&mut self, delay: Duration, task: Box<dyn FnOnce(&mut Self)>) -> TaskHandle;

    fn schedule_frame(&mut self, task: Box<dyn FnOnce(&mut Self)>) -> TaskHandle;

    /// Cancel a pending task. Cancelling a task that already ran is a no-op.
    fn cancel(&mut self, handle: TaskHandle);
}

impl Scheduler for RunLoop {
    fn now_ms(&self) -> u64 {
        RunLoop::now_ms(self)
    }

    fn schedule_after(&mut self, delay: Duration, task: Box<dyn FnOnce(&mut Self)>) -> TaskHandle {
        TaskHandle::Timer(self.set_timeout(delay, task))
    }

    fn schedule_frame(&mut self, task: Box<dyn FnOnce(&mut Self)>) -> TaskHandle {
        TaskHandle::Frame(self.request_frame(task))
    }

    fn cancel(&mut self, handle: TaskHandle) {
        match handle {
            TaskHandle::Timer(id) => {
                self.clear_timer(id);
            }
            TaskHandle::Frame(id) => {
                self.cancel_frame(id);
            }
        }
    }
}

/// Trailing-edge debounce: the action runs once `delay` has passed since the
/// most recent trigger.
pub struct Debounce<S: Scheduler> {
    delay: Duration,
    action: Rc<dyn Fn(&mut S)>,
    pending: Rc<Cell<Option<TaskHandle>>>,
}

impl<S: Scheduler> Clone for Debounce<S> {
    fn clone(&self) -> Self {
        Self {
            delay: self.delay,
            action: self.action.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<S: Scheduler> Debounce<S> {
    pub fn new(delay: Duration, action: impl Fn(&mut S) + 'static) -> Self {
        Self {
            delay,
            action: Rc::new(action),
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the quiet period.
    pub fn trigger(&self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        let pending = self.pending.clone();
        let action = self.action.clone();
        let handle = scheduler.schedule_after(
            self.delay,
            Box::new(move |s: &mut S| {
                pending.set(None);
                action(s);
            }),
        );
        self.pending.set(Some(handle));
    }

    /// Drop a pending run, if any.
    pub fn cancel(&self, scheduler: &mut S) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

#[derive(Default)]
struct FrameLoopState {
    handle: Option<TaskHandle>,
    last_run_ms: Option<u64>,
    running: bool,
    runs: u64,
}

/// A paint-frame driven loop.
///
/// Every frame it checks `condition`; when it fails the loop stops itself.
/// Otherwise `action` runs if at least `min_interval` has passed since its
/// last run, and the next frame is requested. Starting a running loop is a
/// no-op, so there is never more than one frame in flight.
pub struct FrameLoop<S: Scheduler> {
    min_interval: Duration,
    condition: Rc<dyn Fn(&S) -> bool>,
    action: Rc<dyn Fn(&mut S)>,
    state: Rc<RefCell<FrameLoopState>>,
}

impl<S: Scheduler> Clone for FrameLoop<S> {
    fn clone(&self) -> Self {
        Self {
            min_interval: self.min_interval,
            condition: self.condition.clone(),
            action: self.action.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: Scheduler> FrameLoop<S> {
    pub fn new(
        min_interval: Duration,
        condition: impl Fn(&S) -> bool + 'static,
        action: impl Fn(&mut S) + 'static,
    ) -> Self {
        Self {
            min_interval,
            condition: Rc::new(condition),
            action: Rc::new(action),
            state: Rc::new(RefCell::new(FrameLoopState::default())),
        }
    }

    /// Arm the loop. Returns `false` if it was already running.
    pub fn start(&self, scheduler: &mut S) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.running {
                return false;
            }
            state.running = true;
        }
        self.schedule_tick(scheduler);
        true
    }

    pub fn stop(&self, scheduler: &mut S) {
        let handle = {
            let mut state = self.state.borrow_mut();
            state.running = false;
            state.handle.take()
        };
        if let Some(handle) = handle {
            scheduler.cancel(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// How many times the action has run.
    pub fn runs(&self) -> u64 {
        self.state.borrow().runs
    }

    fn schedule_tick(&self, scheduler: &mut S) {
        let this = self.clone();
        let handle = scheduler.schedule_frame(Box::new(move |s: &mut S| this.tick(s)));
        self.state.borrow_mut().handle = Some(handle);
    }

    fn tick(&self, scheduler: &mut S) {
        {
            let mut state = self.state.borrow_mut();
            state.handle = None;
            if !state.running {
                return;
            }
        }
        if !(self.condition)(scheduler) {
            self.state.borrow_mut().running = false;
            return;
        }

        let now = scheduler.now_ms();
        let due = match self.state.borrow().last_run_ms {
            Some(last) => now.saturating_sub(last) >= self.min_interval.as_millis() as u64,
            None => true,
        };
        if due {
            {
                let mut state = self.state.borrow_mut();
                state.last_run_ms = Some(now);
                state.runs += 1;
            }
            (self.action)(scheduler);
        }

        if self.is_running() && self.state.borrow().handle.is_none() {
            self.schedule_tick(scheduler);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
