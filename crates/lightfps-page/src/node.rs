//! Node identity and node payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::media::MediaState;

/// Generational handle to a node in a [`Document`](crate::Document).
///
/// A handle stays valid only while its slot generation matches; once the
/// node is removed the handle is dead even if the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Build a handle from raw parts.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// What a node holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element: lowercase tag, ordered attributes, and media state for
/// `<video>`/`<audio>`.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    media: Option<MediaState>,
}

impl Element {
    pub(crate) fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let media = matches!(tag.as_str(), "video" | "audio").then(MediaState::default);
        Self {
            tag,
            attrs: Vec::new(),
            media,
        }
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether this is a `<video>` or `<audio>` element.
    pub fn is_media(&self) -> bool {
        self.media.is_some()
    }

    /// Attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in source order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn media(&self) -> Option<&MediaState> {
        self.media.as_ref()
    }

    pub(crate) fn media_mut(&mut self) -> Option<&mut MediaState> {
        self.media.as_mut()
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub(crate) fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        before != self.attrs.len()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}
