//! Mutation observer registry.
//!
//! Observers watch child-list changes under a root node. Records are taken
//! from the document in one batch and each observer receives the subset
//! whose target lies in its scope.

use std::collections::BTreeMap;
use std::rc::Rc;

use lightfps_page::{Document, MutationRecord, NodeId};
use serde::{Deserialize, Serialize};

use crate::RunLoop;

/// Mutation observer callback.
pub type MutationCallback = Rc<dyn Fn(&mut RunLoop, &[MutationRecord])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

/// What an observer watches. Child-list changes are always observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// Include changes anywhere below the root, not just its own children.
    pub subtree: bool,
}

impl ObserveOptions {
    pub fn subtree() -> Self {
        Self { subtree: true }
    }
}

struct ObserverEntry {
    root: NodeId,
    options: ObserveOptions,
    callback: MutationCallback,
}

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    entries: BTreeMap<ObserverId, ObserverEntry>,
}

impl ObserverRegistry {
    pub(crate) fn add(
        &mut self,
        id: ObserverId,
        root: NodeId,
        options: ObserveOptions,
        callback: MutationCallback,
    ) {
        self.entries.insert(
            id,
            ObserverEntry {
                root,
                options,
                callback,
            },
        );
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: ObserverId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drop observers whose root node is gone.
    pub(crate) fn sweep(&mut self, doc: &Document) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| doc.is_alive(entry.root));
        before - self.entries.len()
    }

    /// Per-observer record subsets for one batch.
    pub(crate) fn route(
        &self,
        doc: &Document,
        records: &[MutationRecord],
    ) -> Vec<(ObserverId, MutationCallback, Vec<MutationRecord>)> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| {
                let scoped: Vec<MutationRecord> = records
                    .iter()
                    .filter(|record| {
                        record.target == entry.root
                            || (entry.options.subtree && doc.contains(entry.root, record.target))
                    })
                    .cloned()
                    .collect();
                (!scoped.is_empty()).then(|| (*id, entry.callback.clone(), scoped))
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
