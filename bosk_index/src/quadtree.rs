// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A region quad-tree over a fixed bounding envelope.

use bosk_geom::{Envelope, SpatialObject};
use log::warn;

use crate::error::IndexError;

/// Entries per node before it subdivides.
pub const DEFAULT_NODE_CAPACITY: usize = 8;

/// Deepest subdivision level; beyond it nodes grow without splitting, which
/// keeps coincident geometries from subdividing forever.
const MAX_DEPTH: usize = 16;

#[derive(Debug)]
struct QuadItem<G> {
    geometry: G,
    envelope: Envelope,
}

#[derive(Debug)]
struct QuadNode<G> {
    bounds: Envelope,
    /// Geometries contained in `bounds` but straddling child boundaries,
    /// plus everything while the node is an undivided leaf.
    items: Vec<QuadItem<G>>,
    children: Option<Box<[QuadNode<G>; 4]>>,
}

/// A quad-tree partitioning a fixed 2D region.
///
/// The region is set at construction and never grows. Geometries that do
/// not fit inside it are still accepted and tracked in a flat overflow list,
/// so insertion is total; they participate in every query. Subdivision
/// splits a node into four equal quadrants once it exceeds its capacity.
#[derive(Debug)]
pub struct QuadTree<G> {
    root: QuadNode<G>,
    outside: Vec<QuadItem<G>>,
    capacity: usize,
    len: usize,
}

impl<G> QuadTree<G> {
    /// Create a tree over `bounds` with [`DEFAULT_NODE_CAPACITY`].
    ///
    /// # Errors
    ///
    /// [`IndexError::NonFiniteEnvelope`] when `bounds` is empty or has
    /// non-finite bounds.
    pub fn new(bounds: &Envelope) -> Result<Self, IndexError> {
        Self::with_capacity(bounds, DEFAULT_NODE_CAPACITY)
    }

    /// Create a tree with an explicit per-node capacity.
    ///
    /// # Errors
    ///
    /// As [`Self::new`], plus [`IndexError::InvalidCapacity`] when
    /// `capacity` is zero.
    pub fn with_capacity(bounds: &Envelope, capacity: usize) -> Result<Self, IndexError> {
        if !bounds.is_finite() || bounds.is_empty() {
            return Err(IndexError::NonFiniteEnvelope);
        }
        if capacity == 0 {
            return Err(IndexError::InvalidCapacity {
                min: capacity,
                max: capacity,
            });
        }
        Ok(Self {
            root: QuadNode {
                bounds: *bounds,
                items: Vec::new(),
                children: None,
            },
            outside: Vec::new(),
            capacity,
            len: 0,
        })
    }

    /// Number of stored geometries, including those outside the bounds.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no geometries are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The fixed region set at construction.
    pub fn bounds(&self) -> &Envelope {
        &self.root.bounds
    }

    /// Number of occupied levels: `0` when nothing is stored inside the
    /// bounds, `1` while the root is an undivided leaf with content.
    pub fn height(&self) -> usize {
        fn depth<G>(node: &QuadNode<G>) -> usize {
            let below = node
                .children
                .as_ref()
                .map_or(0, |cs| cs.iter().map(depth).max().unwrap_or(0));
            if below > 0 {
                1 + below
            } else if node.items.is_empty() {
                0
            } else {
                1
            }
        }
        depth(&self.root)
    }

    /// Drop every stored geometry; the bounds and capacity stay.
    pub fn clear(&mut self) {
        self.root.items.clear();
        self.root.children = None;
        self.outside.clear();
        self.len = 0;
    }

    /// Geometries whose envelope intersects `query`, yielded lazily.
    /// Overflow-list geometries are included when they intersect.
    pub fn search(&self, query: &Envelope) -> QuadSearch<'_, G> {
        QuadSearch::new(self, *query)
    }

    /// All stored geometries.
    pub fn iter(&self) -> QuadSearch<'_, G> {
        QuadSearch::new(self, Envelope::infinite(3))
    }
}

impl<G: SpatialObject> QuadTree<G> {
    /// Insert a geometry. Geometries outside the bounds go to the overflow
    /// list rather than being rejected.
    ///
    /// # Errors
    ///
    /// [`IndexError::NonFiniteEnvelope`] when the geometry's envelope has
    /// NaN or infinite bounds.
    pub fn insert(&mut self, geometry: G) -> Result<(), IndexError> {
        let envelope = geometry.envelope();
        if !envelope.is_finite() {
            warn!("rejecting geometry with non-finite envelope {envelope:?}");
            return Err(IndexError::NonFiniteEnvelope);
        }
        let item = QuadItem { geometry, envelope };
        if self.root.bounds.contains_envelope(&item.envelope) {
            self.root.insert(item, self.capacity, 1);
        } else {
            self.outside.push(item);
        }
        self.len += 1;
        Ok(())
    }

    /// Insert every geometry of an iterator.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected geometry; earlier items stay inserted.
    pub fn insert_all<I>(&mut self, geometries: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = G>,
    {
        for g in geometries {
            self.insert(g)?;
        }
        Ok(())
    }

    /// Whether an equal geometry is stored.
    pub fn contains(&self, geometry: &G) -> bool
    where
        G: PartialEq,
    {
        self.search(&geometry.envelope()).any(|g| g == geometry)
    }

    /// Remove one geometry equal to `geometry`; `false` when absent.
    pub fn remove(&mut self, geometry: &G) -> bool
    where
        G: PartialEq,
    {
        let env = geometry.envelope();
        if let Some(pos) = self.outside.iter().position(|it| it.geometry == *geometry) {
            self.outside.swap_remove(pos);
            self.len -= 1;
            return true;
        }
        if self.root.remove(geometry, &env) {
            self.len -= 1;
            return true;
        }
        false
    }

    /// Remove every geometry whose envelope equals `envelope`, returning
    /// the removed geometries; empty when none matched.
    pub fn remove_envelope(&mut self, envelope: &Envelope) -> Vec<G> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.outside.len() {
            if self.outside[i].envelope == *envelope {
                removed.push(self.outside.swap_remove(i).geometry);
            } else {
                i += 1;
            }
        }
        self.root.drain_envelope(envelope, &mut removed);
        self.len -= removed.len();
        removed
    }
}

impl<G> QuadNode<G> {
    fn insert(&mut self, item: QuadItem<G>, capacity: usize, depth: usize) {
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bounds.contains_envelope(&item.envelope) {
                    return child.insert(item, capacity, depth + 1);
                }
            }
            // Straddles a quadrant boundary; lives at this level.
            self.items.push(item);
            return;
        }
        self.items.push(item);
        if self.items.len() > capacity && depth < MAX_DEPTH {
            self.subdivide(capacity, depth);
        }
    }

    fn subdivide(&mut self, capacity: usize, depth: usize) {
        let b = &self.bounds;
        let cx = 0.5 * (b.min(0) + b.max(0));
        let cy = 0.5 * (b.min(1) + b.max(1));
        let quadrant = |x0: f64, y0: f64, x1: f64, y1: f64| {
            let bounds = if b.dims() == 3 {
                Envelope::new_3d(x0, y0, b.min(2), x1, y1, b.max(2))
            } else {
                Envelope::new_2d(x0, y0, x1, y1)
            };
            QuadNode {
                bounds,
                items: Vec::new(),
                children: None,
            }
        };
        self.children = Some(Box::new([
            quadrant(b.min(0), b.min(1), cx, cy),
            quadrant(cx, b.min(1), b.max(0), cy),
            quadrant(b.min(0), cy, cx, b.max(1)),
            quadrant(cx, cy, b.max(0), b.max(1)),
        ]));
        let items = core::mem::take(&mut self.items);
        for item in items {
            self.insert(item, capacity, depth);
        }
    }

    fn remove(&mut self, geometry: &G, env: &Envelope) -> bool
    where
        G: PartialEq,
    {
        if !self.bounds.intersects(env) {
            return false;
        }
        if let Some(pos) = self.items.iter().position(|it| it.geometry == *geometry) {
            self.items.remove(pos);
            return true;
        }
        match &mut self.children {
            Some(children) => children.iter_mut().any(|c| c.remove(geometry, env)),
            None => false,
        }
    }

    fn drain_envelope(&mut self, envelope: &Envelope, out: &mut Vec<G>) {
        if !self.bounds.intersects(envelope) {
            return;
        }
        let mut i = 0;
        while i < self.items.len() {
            if self.items[i].envelope == *envelope {
                out.push(self.items.swap_remove(i).geometry);
            } else {
                i += 1;
            }
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                child.drain_envelope(envelope, out);
            }
        }
    }
}

/// Lazy intersection query over a [`QuadTree`]. Restartable via
/// [`Self::restart`].
#[derive(Debug)]
pub struct QuadSearch<'a, G> {
    tree: &'a QuadTree<G>,
    query: Envelope,
    stack: Vec<&'a QuadNode<G>>,
    current: core::slice::Iter<'a, QuadItem<G>>,
}

impl<'a, G> QuadSearch<'a, G> {
    fn new(tree: &'a QuadTree<G>, query: Envelope) -> Self {
        let mut search = Self {
            tree,
            query,
            stack: Vec::new(),
            current: [].iter(),
        };
        search.restart();
        search
    }

    /// Rewind to the start of the traversal.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.push(&self.tree.root);
        self.current = self.tree.outside.iter();
    }
}

impl<'a, G> Iterator for QuadSearch<'a, G> {
    type Item = &'a G;

    fn next(&mut self) -> Option<&'a G> {
        loop {
            for item in &mut self.current {
                if item.envelope.intersects(&self.query) {
                    return Some(&item.geometry);
                }
            }
            let node = self.stack.pop()?;
            if let Some(children) = &node.children {
                for child in children.iter() {
                    if child.bounds.intersects(&self.query) {
                        self.stack.push(child);
                    }
                }
            }
            self.current = node.items.iter();
        }
    }
}
