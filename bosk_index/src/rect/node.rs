// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage for rectangle-tree nodes.

use bosk_geom::Envelope;
use smallvec::SmallVec;

/// Index of a node in the arena.
///
/// Parent links are arena indices rather than owning references, so the tree
/// needs no reference counting and no interior mutability to walk upward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stored geometry together with its cached envelope.
///
/// The envelope is computed once at insertion; lookups never re-ask the
/// geometry for it.
#[derive(Debug)]
pub(crate) struct Entry<G> {
    pub(crate) geometry: G,
    pub(crate) envelope: Envelope,
}

#[derive(Debug)]
pub(crate) enum NodeKind<G> {
    /// Holds the indexed geometries.
    Leaf(SmallVec<[Entry<G>; 8]>),
    /// Holds child nodes.
    Internal(SmallVec<[NodeId; 8]>),
}

#[derive(Debug)]
pub(crate) struct Node<G> {
    pub(crate) parent: Option<NodeId>,
    /// Union of the children's envelopes; kept current by every mutation.
    pub(crate) envelope: Envelope,
    pub(crate) kind: NodeKind<G>,
}

impl<G> Node<G> {
    pub(crate) fn new_leaf(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            envelope: Envelope::empty(2),
            kind: NodeKind::Leaf(SmallVec::new()),
        }
    }

    pub(crate) fn new_internal(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            envelope: Envelope::empty(2),
            kind: NodeKind::Internal(SmallVec::new()),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub(crate) fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Internal(children) => children.len(),
        }
    }
}

/// Slab of nodes with a free list.
///
/// Freed slots are recycled before the vector grows, so long-lived trees
/// with churn do not leak arena capacity.
#[derive(Debug)]
pub(crate) struct Arena<G> {
    nodes: Vec<Option<Node<G>>>,
    free: Vec<u32>,
}

impl<G> Arena<G> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<G>) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            let slot = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
            debug_assert!(slot != u32::MAX, "arena exhausted");
            self.nodes.push(Some(node));
            NodeId(slot)
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Node<G> {
        let node = self.nodes[id.index()]
            .take()
            .unwrap_or_else(|| unreachable!("double free of arena node"));
        self.free.push(id.0);
        node
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node<G> {
        self.nodes[id.index()]
            .as_ref()
            .unwrap_or_else(|| unreachable!("stale arena node id"))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<G> {
        self.nodes[id.index()]
            .as_mut()
            .unwrap_or_else(|| unreachable!("stale arena node id"))
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }
}
