//! # LightFPS Engine
//!
//! The page-mutation engine. Given a settings snapshot it applies a fixed
//! sequence of idempotent transforms to a live page and keeps them valid
//! as new elements stream in.
//!
//! ## Run order
//!
//! ```text
//! media ─► lazy load ─► trackers ─► dark mode ─► reduce memory
//!   ─► disable animations ─► sharpen ─► reduce motion ─► font smoothing
//!   ─► gif freeze ─► minimal ui ─► audio
//! ```
//!
//! After setup each subsystem reacts on its own: observers, debounced
//! rescans, paint-frame loops and media listeners run interleaved with page
//! events on the [`lightfps_runloop::RunLoop`].
//!
//! ## Key Components
//!
//! - [`Engine`]: entry point, orchestration and reverse paths
//! - [`MediaController`]: autoplay, quality, frame sync, pause-on-hidden
//! - [`TrackerSuppressor`]: ad/tracker removal and cookie clearing
//! - [`AudioGraphManager`]: per-element three-band equalizer
//! - [`transforms`]: the stateless DOM transforms
//! - [`ElementTable`]: per-element instrumentation markers
//!
//! ## Example
//!
//! ```rust
//! use lightfps_config::{EngineConfig, Settings};
//! use lightfps_engine::{Engine, Step, Trigger};
//! use lightfps_page::{Window, html::parse_html};
//! use lightfps_runloop::RunLoop;
//!
//! let mut doc = parse_html(r#"<img src="cat.png">"#);
//! doc.finish_loading();
//! let mut rl = RunLoop::new(Window::new(doc));
//!
//! let settings = Settings { auto_optimize: true, lazy_load_media: true, ..Settings::default() };
//! let engine = Engine::new(EngineConfig::default(), settings).unwrap();
//! let Trigger::Ran(report) = engine.trigger(&mut rl).unwrap() else { unreachable!() };
//! assert_eq!(report.step(Step::LazyLoad).unwrap().applied, 1);
//! ```

pub mod audio;
pub mod engine;
pub mod error;
pub mod markers;
pub mod media;
pub mod report;
pub mod tracker;
pub mod transforms;

pub use audio::{AudioGraph, AudioGraphManager};
pub use engine::{Engine, SharedSettings, SnapshotSource, Trigger, enabled};
pub use error::{EngineError, EngineResult};
pub use markers::ElementTable;
pub use media::MediaController;
pub use report::{RunReport, Step, StepOutcome, StepReport};
pub use tracker::TrackerSuppressor;
