//! Web-Audio-style host: contexts, media sources, biquad filters, wiring.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PageError, PageResult};
use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AudioContextId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AudioNodeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiquadKind {
    LowShelf,
    Peaking,
    HighShelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadParams {
    pub kind: BiquadKind,
    pub frequency: f64,
    pub q: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum AudioNodeKind {
    Destination,
    MediaSource(NodeId),
    Biquad(BiquadParams),
}

#[derive(Debug, Clone)]
struct AudioNode {
    context: AudioContextId,
    kind: AudioNodeKind,
    outputs: BTreeSet<AudioNodeId>,
}

#[derive(Debug, Clone)]
struct AudioContext {
    state: ContextState,
    destination: AudioNodeId,
}

/// The page's audio capability.
#[derive(Debug, Clone)]
pub struct AudioHost {
    supported: bool,
    autoplay_allowed: bool,
    next_id: u32,
    contexts: HashMap<AudioContextId, AudioContext>,
    nodes: HashMap<AudioNodeId, AudioNode>,
    bound_elements: HashMap<NodeId, AudioNodeId>,
}

impl Default for AudioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost {
    /// A supporting host whose contexts start suspended.
    pub fn new() -> Self {
        Self {
            supported: true,
            autoplay_allowed: false,
            next_id: 0,
            contexts: HashMap::new(),
            nodes: HashMap::new(),
            bound_elements: HashMap::new(),
        }
    }

    /// A host without audio processing.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Let new contexts start running.
    pub fn with_autoplay_allowed(mut self, allowed: bool) -> Self {
        self.autoplay_allowed = allowed;
        self
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn create_context(&mut self) -> PageResult<AudioContextId> {
        if !self.supported {
            return Err(PageError::AudioUnsupported);
        }
        let id = AudioContextId(self.next());
        let destination = AudioNodeId(self.next());
        self.nodes.insert(
            destination,
            AudioNode {
                context: id,
                kind: AudioNodeKind::Destination,
                outputs: BTreeSet::new(),
            },
        );
        let state = if self.autoplay_allowed {
            ContextState::Running
        } else {
            ContextState::Suspended
        };
        self.contexts.insert(id, AudioContext { state, destination });
        debug!(context = ?id, ?state, "audio context created");
        Ok(id)
    }

    fn context(&self, id: AudioContextId) -> PageResult<&AudioContext> {
        self.contexts
            .get(&id)
            .ok_or_else(|| PageError::InvalidState(format!("unknown audio context {id:?}")))
    }

    fn open_context(&self, id: AudioContextId) -> PageResult<&AudioContext> {
        let ctx = self.context(id)?;
        if ctx.state == ContextState::Closed {
            return Err(PageError::InvalidState(format!("audio context {id:?} is closed")));
        }
        Ok(ctx)
    }

    pub fn context_state(&self, id: AudioContextId) -> Option<ContextState> {
        self.contexts.get(&id).map(|ctx| ctx.state)
    }

    pub fn destination(&self, id: AudioContextId) -> PageResult<AudioNodeId> {
        Ok(self.context(id)?.destination)
    }

    /// Resume a suspended context.
    pub fn resume(&mut self, id: AudioContextId) -> PageResult<()> {
        self.open_context(id)?;
        if let Some(ctx) = self.contexts.get_mut(&id) {
            ctx.state = ContextState::Running;
        }
        Ok(())
    }

    /// Close a context. Its nodes stop processing but element bindings stay:
    /// an element captured by a closed context cannot be captured again.
    pub fn close(&mut self, id: AudioContextId) -> PageResult<()> {
        self.open_context(id)?;
        if let Some(ctx) = self.contexts.get_mut(&id) {
            ctx.state = ContextState::Closed;
        }
        for node in self.nodes.values_mut().filter(|n| n.context == id) {
            node.outputs.clear();
        }
        debug!(context = ?id, "audio context closed");
        Ok(())
    }

    /// Capture an element's output. An element can be captured once per page.
    pub fn create_media_element_source(
        &mut self,
        ctx: AudioContextId,
        element: NodeId,
    ) -> PageResult<AudioNodeId> {
        self.open_context(ctx)?;
        if self.bound_elements.contains_key(&element) {
            return Err(PageError::InvalidState(format!(
                "{element:?} is already connected to a media element source"
            )));
        }
        let id = AudioNodeId(self.next());
        self.nodes.insert(
            id,
            AudioNode {
                context: ctx,
                kind: AudioNodeKind::MediaSource(element),
                outputs: BTreeSet::new(),
            },
        );
        self.bound_elements.insert(element, id);
        Ok(id)
    }

    /// The source node that captured `element`, if any.
    pub fn source_for(&self, element: NodeId) -> Option<AudioNodeId> {
        self.bound_elements.get(&element).copied()
    }

    /// Elements currently captured by a media source.
    pub fn bound_elements(&self) -> Vec<NodeId> {
        self.bound_elements.keys().copied().collect()
    }

    /// Drop the source node of an element that no longer exists. Returns
    /// whether the element was bound.
    pub fn forget_element(&mut self, element: NodeId) -> bool {
        let Some(source) = self.bound_elements.remove(&element) else {
            return false;
        };
        self.nodes.remove(&source);
        for node in self.nodes.values_mut() {
            node.outputs.remove(&source);
        }
        true
    }

    pub fn create_biquad(
        &mut self,
        ctx: AudioContextId,
        kind: BiquadKind,
        frequency: f64,
        q: f64,
        gain: f64,
    ) -> PageResult<AudioNodeId> {
        self.open_context(ctx)?;
        let id = AudioNodeId(self.next());
        self.nodes.insert(
            id,
            AudioNode {
                context: ctx,
                kind: AudioNodeKind::Biquad(BiquadParams {
                    kind,
                    frequency,
                    q,
                    gain,
                }),
                outputs: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    pub fn biquad(&self, id: AudioNodeId) -> Option<BiquadParams> {
        match self.nodes.get(&id)?.kind {
            AudioNodeKind::Biquad(params) => Some(params),
            _ => None,
        }
    }

    pub fn connect(&mut self, from: AudioNodeId, to: AudioNodeId) -> PageResult<()> {
        let from_ctx = self.node(from)?.context;
        let to_ctx = self.node(to)?.context;
        if from_ctx != to_ctx {
            return Err(PageError::InvalidState(
                "cannot connect nodes from different contexts".to_string(),
            ));
        }
        self.open_context(from_ctx)?;
        if let Some(node) = self.nodes.get_mut(&from) {
            node.outputs.insert(to);
        }
        Ok(())
    }

    /// Drop every outgoing connection of `node`.
    pub fn disconnect(&mut self, node: AudioNodeId) -> PageResult<()> {
        self.nodes
            .get_mut(&node)
            .ok_or_else(|| PageError::InvalidState(format!("unknown audio node {node:?}")))?
            .outputs
            .clear();
        Ok(())
    }

    /// Forget a filter node, dropping connections into it.
    pub fn release(&mut self, node: AudioNodeId) {
        if matches!(
            self.nodes.get(&node).map(|n| &n.kind),
            Some(AudioNodeKind::Biquad(_))
        ) {
            self.nodes.remove(&node);
            for other in self.nodes.values_mut() {
                other.outputs.remove(&node);
            }
        }
    }

    pub fn is_connected(&self, from: AudioNodeId, to: AudioNodeId) -> bool {
        self.nodes
            .get(&from)
            .is_some_and(|node| node.outputs.contains(&to))
    }

    pub fn outputs(&self, node: AudioNodeId) -> Vec<AudioNodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.outputs.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Follow first outputs from `start` and return the chain, `start` included.
    pub fn chain_from(&self, start: AudioNodeId) -> Vec<AudioNodeId> {
        let mut chain = vec![start];
        let mut cursor = start;
        while let Some(next) = self.outputs(cursor).into_iter().next() {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            cursor = next;
        }
        chain
    }

    fn node(&self, id: AudioNodeId) -> PageResult<&AudioNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| PageError::InvalidState(format!("unknown audio node {id:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(i: u32) -> NodeId {
        NodeId::new(i, 0)
    }

    #[test]
    fn test_unsupported_host() {
        let mut host = AudioHost::unsupported();
        assert!(matches!(
            host.create_context(),
            Err(PageError::AudioUnsupported)
        ));
    }

    #[test]
    fn test_context_lifecycle() {
        let mut host = AudioHost::new();
        let ctx = host.create_context().unwrap();
        assert_eq!(host.context_state(ctx), Some(ContextState::Suspended));
        host.resume(ctx).unwrap();
        assert_eq!(host.context_state(ctx), Some(ContextState::Running));
        host.close(ctx).unwrap();
        assert_eq!(host.context_state(ctx), Some(ContextState::Closed));
        assert!(host.close(ctx).is_err());
        assert!(host.resume(ctx).is_err());
    }

    #[test]
    fn test_autoplay_allowed_starts_running() {
        let mut host = AudioHost::new().with_autoplay_allowed(true);
        let ctx = host.create_context().unwrap();
        assert_eq!(host.context_state(ctx), Some(ContextState::Running));
    }

    #[test]
    fn test_media_source_binds_once() {
        let mut host = AudioHost::new();
        let ctx = host.create_context().unwrap();
        let source = host.create_media_element_source(ctx, element(1)).unwrap();
        assert_eq!(host.source_for(element(1)), Some(source));

        let again = host.create_media_element_source(ctx, element(1));
        assert!(matches!(again, Err(PageError::InvalidState(_))));

        host.close(ctx).unwrap();
        let fresh = host.create_context().unwrap();
        assert!(host.create_media_element_source(fresh, element(1)).is_err());
        assert!(host.create_media_element_source(fresh, element(2)).is_ok());
    }

    #[test]
    fn test_forget_element_drops_source() {
        let mut host = AudioHost::new();
        let ctx = host.create_context().unwrap();
        let src = host.create_media_element_source(ctx, element(1)).unwrap();
        let dest = host.destination(ctx).unwrap();
        host.connect(src, dest).unwrap();

        assert!(host.forget_element(element(1)));
        assert!(!host.forget_element(element(1)));
        assert_eq!(host.source_for(element(1)), None);
        assert!(host.bound_elements().is_empty());
        assert!(host.outputs(src).is_empty());
        assert!(host.connect(src, dest).is_err());
    }

    #[test]
    fn test_chain_wiring() {
        let mut host = AudioHost::new();
        let ctx = host.create_context().unwrap();
        let src = host.create_media_element_source(ctx, element(1)).unwrap();
        let low = host
            .create_biquad(ctx, BiquadKind::LowShelf, 200.0, 1.0, 8.0)
            .unwrap();
        let dest = host.destination(ctx).unwrap();
        host.connect(src, low).unwrap();
        host.connect(low, dest).unwrap();
        assert_eq!(host.chain_from(src), vec![src, low, dest]);
        assert_eq!(host.biquad(low).map(|p| p.gain), Some(8.0));

        host.disconnect(src).unwrap();
        assert!(!host.is_connected(src, low));
        host.release(low);
        assert!(host.biquad(low).is_none());
    }

    #[test]
    fn test_cross_context_connect_fails() {
        let mut host = AudioHost::new();
        let a = host.create_context().unwrap();
        let b = host.create_context().unwrap();
        let filter = host
            .create_biquad(a, BiquadKind::Peaking, 1000.0, 1.0, 0.0)
            .unwrap();
        let dest = host.destination(b).unwrap();
        assert!(host.connect(filter, dest).is_err());
    }
}
