//! Event listener registry.

use std::collections::BTreeMap;
use std::rc::Rc;

use lightfps_page::{Document, EventKind, EventTarget, PageEvent};

use crate::RunLoop;

/// Event listener callback.
pub type EventCallback = Rc<dyn Fn(&mut RunLoop, &PageEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

struct ListenerEntry {
    target: EventTarget,
    kind: EventKind,
    callback: EventCallback,
}

/// Listeners in registration order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: BTreeMap<ListenerId, ListenerEntry>,
}

impl ListenerRegistry {
    pub(crate) fn add(
        &mut self,
        id: ListenerId,
        target: EventTarget,
        kind: EventKind,
        callback: EventCallback,
    ) {
        self.entries.insert(
            id,
            ListenerEntry {
                target,
                kind,
                callback,
            },
        );
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Listeners for `event`, snapshotted before dispatch.
    pub(crate) fn matching(&self, event: &PageEvent) -> Vec<(ListenerId, EventCallback)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.target == event.target && entry.kind == event.kind)
            .map(|(id, entry)| (*id, entry.callback.clone()))
            .collect()
    }

    pub(crate) fn count_for(&self, target: EventTarget, kind: EventKind) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .count()
    }

    /// Drop listeners whose element target is no longer alive.
    pub(crate) fn sweep(&mut self, doc: &Document) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.target {
            EventTarget::Element(node) => doc.is_alive(node),
            EventTarget::Window | EventTarget::Document => true,
        });
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
