// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy iterators over the M-tree.

use std::collections::BinaryHeap;

use bosk_geom::DistanceMetric;

use crate::tree::{LeafEntry, MNode};

/// A heap entry: either an unexpanded subtree keyed by its distance lower
/// bound, or a data item keyed by its exact distance.
struct Candidate<'a, T> {
    key: f64,
    payload: Payload<'a, T>,
}

enum Payload<'a, T> {
    Node {
        node: &'a MNode<T>,
        /// Distance from the query to the pivot governing `node`, when
        /// known; feeds the triangle-inequality prefilter.
        query_pd: Option<f64>,
    },
    Item(&'a T),
}

impl<T> PartialEq for Candidate<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Candidate<'_, T> {}

impl<T> PartialOrd for Candidate<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<'_, T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        // Reversed so the max-heap pops the smallest key first.
        other.key.total_cmp(&self.key)
    }
}

/// Best-first search over an [`MTree`](crate::MTree), yielding items and
/// their distances in ascending distance order.
///
/// Subtrees are expanded only as the iteration reaches their distance
/// lower bound, so taking a few results from a large tree touches few
/// nodes. [`within`](Self::within) and [`limit`](Self::limit) compose.
pub struct MSearch<'a, T, M> {
    metric: &'a M,
    target: &'a T,
    root: Option<&'a MNode<T>>,
    radius: Option<f64>,
    limit: Option<usize>,
    yielded: usize,
    heap: BinaryHeap<Candidate<'a, T>>,
}

impl<'a, T, M> MSearch<'a, T, M>
where
    M: DistanceMetric<T>,
{
    pub(crate) fn new(metric: &'a M, root: Option<&'a MNode<T>>, target: &'a T) -> Self {
        let mut search = Self {
            metric,
            target,
            root,
            radius: None,
            limit: None,
            yielded: 0,
            heap: BinaryHeap::new(),
        };
        search.restart();
        search
    }

    /// Keep only items within `radius` of the target.
    #[must_use]
    pub fn within(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Stop after `limit` items.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rewind to the beginning, keeping the bounds.
    pub fn restart(&mut self) {
        self.yielded = 0;
        self.heap.clear();
        if let Some(root) = self.root {
            self.heap.push(Candidate {
                key: 0.0,
                payload: Payload::Node {
                    node: root,
                    query_pd: None,
                },
            });
        }
    }
}

impl<'a, T, M> Iterator for MSearch<'a, T, M>
where
    M: DistanceMetric<T>,
{
    type Item = (&'a T, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(limit) = self.limit
            && self.yielded >= limit
        {
            return None;
        }
        while let Some(Candidate { key, payload }) = self.heap.pop() {
            if let Some(radius) = self.radius
                && key > radius
            {
                // Keys only grow from here; the search is exhausted.
                return None;
            }
            match payload {
                Payload::Item(item) => {
                    self.yielded += 1;
                    return Some((item, key));
                }
                Payload::Node { node, query_pd } => match node {
                    MNode::Leaf(entries) => {
                        for entry in entries {
                            if let (Some(qpd), Some(radius)) = (query_pd, self.radius)
                                && (qpd - entry.parent_distance).abs() > radius
                            {
                                continue;
                            }
                            let d = self.metric.distance(self.target, &entry.item);
                            if self.radius.is_none_or(|radius| d <= radius) {
                                self.heap.push(Candidate {
                                    key: d,
                                    payload: Payload::Item(&entry.item),
                                });
                            }
                        }
                    }
                    MNode::Internal(entries) => {
                        for entry in entries {
                            if let (Some(qpd), Some(radius)) = (query_pd, self.radius)
                                && (qpd - entry.parent_distance).abs() > entry.radius + radius
                            {
                                continue;
                            }
                            let d = self.metric.distance(self.target, &entry.pivot);
                            let bound = (d - entry.radius).max(0.0);
                            if self.radius.is_none_or(|radius| bound <= radius) {
                                self.heap.push(Candidate {
                                    key: bound,
                                    payload: Payload::Node {
                                        node: &entry.child,
                                        query_pd: Some(d),
                                    },
                                });
                            }
                        }
                    }
                },
            }
        }
        None
    }
}

/// Depth-first traversal of every stored item.
pub struct MIter<'a, T> {
    stack: Vec<&'a MNode<T>>,
    leaf: core::slice::Iter<'a, LeafEntry<T>>,
}

impl<'a, T> MIter<'a, T> {
    pub(crate) fn new(root: Option<&'a MNode<T>>) -> Self {
        Self {
            stack: root.into_iter().collect(),
            leaf: [].iter(),
        }
    }
}

impl<'a, T> Iterator for MIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.leaf.next() {
                return Some(&entry.item);
            }
            match self.stack.pop()? {
                MNode::Leaf(entries) => self.leaf = entries.iter(),
                MNode::Internal(entries) => {
                    self.stack.extend(entries.iter().map(|e| &*e.child));
                }
            }
        }
    }
}
