//! # LightFPS Page
//!
//! The host page the LightFPS engine operates on.
//!
//! A page is a [`Window`] owning a [`Document`] plus the host capabilities a
//! content script reaches through globals: visibility, cookies, an optional
//! site player API, audio contexts, canvases and a resource loader.
//!
//! ## Node identity
//!
//! Nodes live in a generational arena. Removing a node frees its whole
//! subtree and bumps the slot generation, so a stale [`NodeId`] is detectably
//! dead (`Document::is_alive`). Callers that attach state to elements key it
//! by `NodeId` and drop entries once the node is gone.
//!
//! ## Events and mutations
//!
//! Nothing here dispatches synchronously. Media transitions, visibility
//! changes and document readiness queue [`PageEvent`]s; tree edits queue
//! [`MutationRecord`]s. An event loop drains both.

pub mod audio;
pub mod canvas;
pub mod cookie;
mod document;
mod error;
pub mod event;
pub mod html;
pub mod media;
mod node;
pub mod resource;
pub mod selector;
pub mod style;
mod window;

pub use audio::{AudioContextId, AudioHost, AudioNodeId, BiquadKind, BiquadParams, ContextState};
pub use canvas::{Canvas, LoadedImage};
pub use cookie::CookieJar;
pub use document::{Document, ReadyState};
pub use error::{PageError, PageResult};
pub use event::{EventKind, EventTarget, MutationRecord, PageEvent};
pub use media::MediaState;
pub use node::{Element, NodeId, NodeKind};
pub use resource::{DirResources, MemoryResources, Resource, ResourceLoader};
pub use selector::{SelectorList, Specificity};
pub use style::{Color, ComputedStyle, Stylesheet};
pub use window::{PlayerQualityApi, Window};
