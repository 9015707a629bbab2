//! Queued page events and mutation records.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Event types the engine listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Play,
    Pause,
    Ended,
    VisibilityChange,
    DomContentLoaded,
}

/// Where an event is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTarget {
    Window,
    Document,
    Element(NodeId),
}

/// A queued event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    pub target: EventTarget,
    pub kind: EventKind,
}

impl PageEvent {
    pub fn new(target: EventTarget, kind: EventKind) -> Self {
        Self { target, kind }
    }
}

/// A child-list mutation under `target`.
///
/// Removed nodes are already freed when the record is delivered; their ids
/// only identify what went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    pub fn added(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: vec![node],
            removed: Vec::new(),
        }
    }

    pub fn removed(target: NodeId, node: NodeId) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: vec![node],
        }
    }
}
