//! Per-element side tables.
//!
//! Instrumentation state ("has a frame-sync listener", "has an audio graph",
//! "was sharpened") is kept here instead of on the element. Keys are
//! generational [`NodeId`]s, so an entry can never be confused with a later
//! element reusing the same slot; [`ElementTable::sweep`] drops entries whose
//! element has left the document.

use std::collections::HashMap;

use lightfps_page::{Document, NodeId};

#[derive(Debug, Clone)]
pub struct ElementTable<T> {
    entries: HashMap<NodeId, T>,
}

impl<T> Default for ElementTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ElementTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn insert(&mut self, id: NodeId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.entries.keys().copied().collect()
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<(NodeId, T)> {
        self.entries.drain().collect()
    }

    /// Drop entries for elements that are no longer in the document and
    /// return them.
    pub fn sweep(&mut self, doc: &Document) -> Vec<(NodeId, T)> {
        let dead: Vec<NodeId> = self
            .entries
            .keys()
            .filter(|id| !doc.is_connected(**id))
            .copied()
            .collect();
        dead.into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|value| (id, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightfps_page::html::parse_html;

    #[test]
    fn test_sweep_drops_removed_elements() {
        let mut doc = parse_html("<video id=a></video><video id=b></video>");
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();

        let mut table = ElementTable::new();
        table.insert(a, "graph-a");
        table.insert(b, "graph-b");

        doc.remove(a);
        let swept = table.sweep(&doc);
        assert_eq!(swept, vec![(a, "graph-a")]);
        assert!(!table.contains(a));
        assert!(table.contains(b));
    }

    #[test]
    fn test_stale_id_does_not_match_new_element() {
        let mut doc = parse_html("<img id=a>");
        let a = doc.get_element_by_id("a").unwrap();
        let mut table = ElementTable::new();
        table.insert(a, ());

        doc.remove(a);
        let body = doc.body().unwrap();
        let fresh = doc.create_element("img");
        doc.append_child(body, fresh).unwrap();
        assert!(!table.contains(fresh));
    }

    #[test]
    fn test_detached_element_is_swept() {
        let mut doc = parse_html("<p></p>");
        let loose = doc.create_element("video");
        let mut table = ElementTable::new();
        table.insert(loose, 1);
        assert_eq!(table.sweep(&doc).len(), 1);
        assert!(table.is_empty());
    }
}
