//! # LightFPS RunLoop
//!
//! A single-threaded, virtual-clock event loop that drives a
//! [`lightfps_page::Window`] the way a browser tab drives a content script.
//!
//! ## Phases of one step
//!
//! ```text
//!  advance(d) ──► next due item (timer wins ties) ──► run it
//!                        ▲                               │
//!                        │                               ▼
//!                        └──── drain: mutation records, then events
//! ```
//!
//! Nothing is dispatched synchronously from inside page operations; a
//! callback that mutates the page sees its own effects delivered only after
//! it returns.
//!
//! ## Key Components
//!
//! - [`RunLoop`]: timers, paint frames, listeners, mutation observers
//! - [`Scheduler`]: the clock abstraction used by the combinators
//! - [`Debounce`]: trailing-edge debounce
//! - [`FrameLoop`]: frame-driven loop with a minimum interval
//! - [`RunLoopMetrics`]: counters for what the loop did
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use lightfps_page::{Document, Window};
//! use lightfps_runloop::{Debounce, RunLoop};
//!
//! let mut rl = RunLoop::new(Window::new(Document::new()));
//! let debounce = Debounce::new(Duration::from_millis(2000), |rl: &mut RunLoop| {
//!     assert_eq!(rl.now_ms(), 2000);
//! });
//! debounce.trigger(&mut rl);
//! rl.advance(Duration::from_secs(3)).unwrap();
//! ```

pub mod config;
pub mod error;
mod listener;
pub mod metrics;
mod observer;
mod run_loop;
pub mod scheduler;
mod timer;

pub use config::RunLoopConfig;
pub use error::{RunLoopError, RunLoopResult};
pub use listener::{EventCallback, ListenerId};
pub use metrics::{MetricsSnapshot, RunLoopMetrics};
pub use observer::{MutationCallback, ObserveOptions, ObserverId};
pub use run_loop::RunLoop;
pub use scheduler::{Debounce, FrameLoop, Scheduler, TaskHandle};
pub use timer::{FrameId, IntervalCallback, TimerCallback, TimerId};
