//! Generational-arena document tree.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{PageError, PageResult};
use crate::event::{EventKind, EventTarget, MutationRecord, PageEvent};
use crate::media::MediaState;
use crate::node::{Element, Node, NodeId, NodeKind};
use crate::selector::SelectorList;
use crate::style::{self, ComputedStyle, Stylesheet};

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A document tree plus its pending event and mutation queues.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    ready_state: ReadyState,
    mutations: Vec<MutationRecord>,
    events: VecDeque<PageEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document in the `Loading` state.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            ready_state: ReadyState::Loading,
            mutations: Vec::new(),
            events: VecDeque::new(),
        };
        doc.root = doc.alloc(Node::new(NodeKind::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Number of live nodes, the document node included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    // ---- tree construction -------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(NodeKind::Element(Element::new(tag))))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node::new(NodeKind::Text(text.to_string())))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(Node::new(NodeKind::Comment(text.to_string())))
    }

    /// Append `child` to `parent`, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> PageResult<()> {
        let parent_kind = &self.node(parent).ok_or(PageError::NodeGone(parent))?.kind;
        if !matches!(parent_kind, NodeKind::Document | NodeKind::Element(_)) {
            return Err(PageError::Hierarchy(format!(
                "{parent:?} cannot have children"
            )));
        }
        let child_node = self.node(child).ok_or(PageError::NodeGone(child))?;
        if matches!(child_node.kind, NodeKind::Document) {
            return Err(PageError::Hierarchy("cannot insert a document".to_string()));
        }
        if self.contains(child, parent) {
            return Err(PageError::Hierarchy(format!(
                "{child:?} is an ancestor of {parent:?}"
            )));
        }

        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        self.mutations.push(MutationRecord::added(parent, child));
        Ok(())
    }

    /// Unlink `id` from its parent without freeing it.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        self.mutations.push(MutationRecord::removed(parent, id));
    }

    /// Remove a node and free its subtree. Returns `false` for dead handles
    /// and for the document node.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.is_alive(id) {
            return false;
        }
        self.detach(id);
        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));
        for dead in &subtree {
            let slot = &mut self.slots[dead.index() as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(dead.index());
        }
        trace!(node = ?id, freed = subtree.len(), "removed subtree");
        true
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    // ---- tree access -------------------------------------------------------

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Alive and reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.contains(self.root, id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> PageResult<&mut Element> {
        match self.node_mut(id) {
            Some(Node {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(PageError::NotAnElement(id)),
            None => Err(PageError::NodeGone(id)),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c) == Some(tag))
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|c| self.element(*c).is_some())
    }

    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, "body")
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeKind::Text(t)) = self.kind(id) {
            text.push_str(t);
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(node) {
                text.push_str(t);
            }
        }
        text
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> PageResult<()> {
        if !self.is_alive(id) {
            return Err(PageError::NodeGone(id));
        }
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        let text = self.create_text(text);
        self.append_child(id, text)
    }

    // ---- attributes and inline style ---------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> PageResult<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> PageResult<bool> {
        Ok(self.element_mut(id)?.remove_attr(name))
    }

    /// Inline style value for `prop`.
    pub fn style(&self, id: NodeId, prop: &str) -> Option<String> {
        let prop = prop.to_ascii_lowercase();
        style::parse_declarations(self.attr(id, "style")?)
            .into_iter()
            .rev()
            .find(|(name, _)| *name == prop)
            .map(|(_, value)| value)
    }

    /// Set one inline style property, keeping the others.
    pub fn set_style(&mut self, id: NodeId, prop: &str, value: &str) -> PageResult<()> {
        let el = self.element_mut(id)?;
        let prop = prop.to_ascii_lowercase();
        let mut decls = style::parse_declarations(el.attr("style").unwrap_or(""));
        match decls.iter_mut().find(|(name, _)| *name == prop) {
            Some((_, existing)) => *existing = value.to_string(),
            None => decls.push((prop, value.to_string())),
        }
        el.set_attr("style", &style::serialize_declarations(&decls));
        Ok(())
    }

    /// Remove one inline style property; drops the attribute once empty.
    pub fn remove_style(&mut self, id: NodeId, prop: &str) -> PageResult<()> {
        let el = self.element_mut(id)?;
        let Some(current) = el.attr("style") else {
            return Ok(());
        };
        let prop = prop.to_ascii_lowercase();
        let decls: Vec<_> = style::parse_declarations(current)
            .into_iter()
            .filter(|(name, _)| *name != prop)
            .collect();
        if decls.is_empty() {
            el.remove_attr("style");
        } else {
            el.set_attr("style", &style::serialize_declarations(&decls));
        }
        Ok(())
    }

    // ---- queries -----------------------------------------------------------

    /// Connected element with the given `id` attribute.
    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(value))
    }

    /// Elements under the document matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> PageResult<Vec<NodeId>> {
        self.query_selector_all_in(self.root, selector)
    }

    /// Elements under `scope` matching `selector`, in document order.
    pub fn query_selector_all_in(&self, scope: NodeId, selector: &str) -> PageResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self.select(scope, &list))
    }

    /// Elements under `scope` matching a pre-parsed list.
    pub fn select(&self, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect()
    }

    pub fn query_selector(&self, selector: &str) -> PageResult<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    pub fn matches(&self, id: NodeId, selector: &str) -> PageResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, id))
    }

    // ---- computed style ----------------------------------------------------

    /// Parse the current `<style>` blocks. Reuse it across many lookups.
    pub fn stylesheet(&self) -> Stylesheet {
        Stylesheet::from_document(self)
    }

    pub fn computed_style(&self, id: NodeId) -> PageResult<ComputedStyle> {
        self.stylesheet().computed(self, id)
    }

    // ---- media -------------------------------------------------------------

    pub fn media(&self, id: NodeId) -> Option<&MediaState> {
        self.element(id)?.media()
    }

    pub fn media_mut(&mut self, id: NodeId) -> PageResult<&mut MediaState> {
        self.element_mut(id)?
            .media_mut()
            .ok_or(PageError::NotMedia(id))
    }

    /// Start playback. Queues `play` when the element was not playing.
    pub fn play(&mut self, id: NodeId) -> PageResult<()> {
        let media = self.media_mut(id)?;
        if media.is_playing() {
            return Ok(());
        }
        media.paused = false;
        media.ended = false;
        self.push_event(PageEvent::new(EventTarget::Element(id), EventKind::Play));
        Ok(())
    }

    /// Pause playback. Queues `pause` when the element was not paused.
    pub fn pause(&mut self, id: NodeId) -> PageResult<()> {
        let media = self.media_mut(id)?;
        if media.paused {
            return Ok(());
        }
        media.paused = true;
        self.push_event(PageEvent::new(EventTarget::Element(id), EventKind::Pause));
        Ok(())
    }

    /// Playback reached the end: queues `pause` (if playing) then `ended`.
    pub fn finish_playback(&mut self, id: NodeId) -> PageResult<()> {
        let media = self.media_mut(id)?;
        let was_playing = !media.paused;
        media.paused = true;
        media.ended = true;
        if was_playing {
            self.push_event(PageEvent::new(EventTarget::Element(id), EventKind::Pause));
        }
        self.push_event(PageEvent::new(EventTarget::Element(id), EventKind::Ended));
        Ok(())
    }

    /// Parsing finished: autoplay media starts and `DOMContentLoaded` is
    /// queued. No-op once the document has left `Loading`.
    pub fn finish_loading(&mut self) {
        if self.ready_state != ReadyState::Loading {
            return;
        }
        self.ready_state = ReadyState::Interactive;
        let autoplay: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .filter(|node| self.media(*node).is_some() && self.has_attr(*node, "autoplay"))
            .collect();
        for node in autoplay {
            // Media elements were checked above.
            let _ = self.play(node);
        }
        self.push_event(PageEvent::new(
            EventTarget::Document,
            EventKind::DomContentLoaded,
        ));
    }

    /// Mark the document fully loaded.
    pub fn set_complete(&mut self) {
        self.finish_loading();
        self.ready_state = ReadyState::Complete;
    }

    // ---- queues ------------------------------------------------------------

    pub fn push_event(&mut self, event: PageEvent) {
        self.events.push_back(event);
    }

    pub fn pop_event(&mut self) -> Option<PageEvent> {
        self.events.pop_front()
    }

    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    /// Whether events or mutation records are waiting to be delivered.
    pub fn has_pending(&self) -> bool {
        !self.events.is_empty() || !self.mutations.is_empty()
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
