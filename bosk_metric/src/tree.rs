// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The M-tree proper: nodes, insertion, and removal.

use bosk_geom::DistanceMetric;
use log::debug;

use crate::error::MetricError;
use crate::policy::{PartitionPolicy, PromotePolicy};
use crate::search::{MIter, MSearch};

#[derive(Debug)]
pub(crate) struct LeafEntry<T> {
    pub(crate) item: T,
    /// Distance to the pivot governing this node; `0.0` under the root.
    pub(crate) parent_distance: f64,
}

#[derive(Debug)]
pub(crate) struct RoutingEntry<T> {
    pub(crate) pivot: T,
    pub(crate) parent_distance: f64,
    /// Covering radius: at least the distance from `pivot` to every data
    /// item below `child`. Never shrinks on removal.
    pub(crate) radius: f64,
    pub(crate) child: Box<MNode<T>>,
}

#[derive(Debug)]
pub(crate) enum MNode<T> {
    Leaf(Vec<LeafEntry<T>>),
    Internal(Vec<RoutingEntry<T>>),
}

impl<T> MNode<T> {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Leaf(entries) => entries.len(),
            Self::Internal(entries) => entries.len(),
        }
    }
}

/// What inserting into a subtree did to it.
enum NodeInsert<T> {
    /// The entry fit; radii along the path are already updated.
    Fit,
    /// The subtree split in two; the caller replaces its routing entry
    /// with this pair (fixing up their `parent_distance`).
    Split(RoutingEntry<T>, RoutingEntry<T>),
}

enum Donated<T> {
    Leaf(LeafEntry<T>),
    Routing(RoutingEntry<T>),
}

/// A metric-space index: balanced similarity search over any type with a
/// [`DistanceMetric`].
///
/// Internal nodes hold pivot items with covering radii; the triangle
/// inequality prunes subtrees during search and removal. Items are unique
/// (by `PartialEq`); equality is assumed to coincide with zero distance.
///
/// Splits are governed by a [`PromotePolicy`] (pick two pivots) and a
/// [`PartitionPolicy`] (divide the rest between them).
pub struct MTree<T, M> {
    root: Option<Box<MNode<T>>>,
    metric: M,
    min_children: usize,
    max_children: usize,
    promote: PromotePolicy,
    partition: PartitionPolicy,
    len: usize,
}

impl<T, M> MTree<T, M>
where
    T: Clone + PartialEq,
    M: DistanceMetric<T>,
{
    /// Create a tree with the default policies ([`PromotePolicy::MaxDistance`],
    /// [`PartitionPolicy::GeneralizedHyperplane`]).
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidCapacity`] unless `1 <= min_children <
    /// max_children`.
    pub fn new(min_children: usize, max_children: usize, metric: M) -> Result<Self, MetricError> {
        Self::with_policies(
            min_children,
            max_children,
            metric,
            PromotePolicy::default(),
            PartitionPolicy::default(),
        )
    }

    /// Create a tree with explicit split policies.
    ///
    /// # Errors
    ///
    /// [`MetricError::InvalidCapacity`] unless `1 <= min_children <
    /// max_children`.
    pub fn with_policies(
        min_children: usize,
        max_children: usize,
        metric: M,
        promote: PromotePolicy,
        partition: PartitionPolicy,
    ) -> Result<Self, MetricError> {
        if min_children < 1 || max_children <= min_children {
            return Err(MetricError::InvalidCapacity {
                min: min_children,
                max: max_children,
            });
        }
        Ok(Self {
            root: None,
            metric,
            min_children,
            max_children,
            promote,
            partition,
            len: 0,
        })
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no items are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels: `0` when empty, `1` for a lone root leaf.
    pub fn height(&self) -> usize {
        fn depth<T>(node: &MNode<T>) -> usize {
            match node {
                MNode::Leaf(_) => 1,
                MNode::Internal(entries) => {
                    1 + entries.first().map_or(0, |e| depth(&e.child))
                }
            }
        }
        self.root.as_deref().map_or(0, depth)
    }

    /// Drop every stored item.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert an item.
    ///
    /// # Errors
    ///
    /// [`MetricError::DuplicateItem`] when an equal item is present; the
    /// tree is unchanged.
    pub fn insert(&mut self, item: T) -> Result<(), MetricError> {
        if self.contains(&item) {
            return Err(MetricError::DuplicateItem);
        }
        match self.root.take() {
            None => {
                self.root = Some(Box::new(MNode::Leaf(vec![LeafEntry {
                    item,
                    parent_distance: 0.0,
                }])));
            }
            Some(mut root) => {
                match self.insert_at(&mut root, item, None) {
                    NodeInsert::Fit => self.root = Some(root),
                    NodeInsert::Split(first, second) => {
                        debug!("root split; tree grows a level");
                        self.root = Some(Box::new(MNode::Internal(vec![first, second])));
                    }
                }
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Insert every item of an iterator.
    ///
    /// # Errors
    ///
    /// Stops at the first duplicate; earlier items stay inserted.
    pub fn insert_all<I>(&mut self, items: I) -> Result<(), MetricError>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.insert(item)?;
        }
        Ok(())
    }

    /// Whether an equal item is stored.
    pub fn contains(&self, item: &T) -> bool {
        fn walk<T: PartialEq, M: DistanceMetric<T>>(
            metric: &M,
            node: &MNode<T>,
            item: &T,
        ) -> bool {
            match node {
                MNode::Leaf(entries) => entries.iter().any(|e| e.item == *item),
                MNode::Internal(entries) => entries.iter().any(|e| {
                    metric.distance(item, &e.pivot) <= e.radius && walk(metric, &e.child, item)
                }),
            }
        }
        self.root
            .as_deref()
            .is_some_and(|root| walk(&self.metric, root, item))
    }

    /// Remove an item; `false` when absent.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(mut root) = self.root.take() else {
            return false;
        };
        let removed = self.remove_at(&mut root, item, None);
        if removed {
            self.len -= 1;
        }
        // Root underflow: an empty root disappears; a single-entry internal
        // root is replaced by its child's node, shrinking the height.
        loop {
            match &mut *root {
                MNode::Leaf(entries) => {
                    if entries.is_empty() {
                        return removed;
                    }
                    break;
                }
                MNode::Internal(entries) => {
                    if entries.is_empty() {
                        return removed;
                    }
                    if entries.len() == 1 && let Some(only) = entries.pop() {
                        root = only.child;
                        continue;
                    }
                    break;
                }
            }
        }
        self.root = Some(root);
        removed
    }

    /// Items ascending by distance from `target`, yielded lazily.
    ///
    /// Bound the result with [`MSearch::within`] and [`MSearch::limit`];
    /// the bounds compose.
    pub fn search<'a>(&'a self, target: &'a T) -> MSearch<'a, T, M> {
        MSearch::new(&self.metric, self.root.as_deref(), target)
    }

    /// All stored items, in traversal order.
    pub fn iter(&self) -> MIter<'_, T> {
        MIter::new(self.root.as_deref())
    }

    fn insert_at(&self, node: &mut MNode<T>, item: T, node_pivot: Option<&T>) -> NodeInsert<T> {
        match node {
            MNode::Leaf(entries) => {
                let parent_distance =
                    node_pivot.map_or(0.0, |p| self.metric.distance(p, &item));
                entries.push(LeafEntry {
                    item,
                    parent_distance,
                });
                if entries.len() > self.max_children {
                    let drained = core::mem::take(entries);
                    let (first, second) = self.split_leaf(drained);
                    NodeInsert::Split(first, second)
                } else {
                    NodeInsert::Fit
                }
            }
            MNode::Internal(entries) => {
                // Prefer a child already covering the item, nearest pivot
                // first; otherwise the one needing the least radius growth.
                let mut covered: Option<(usize, f64)> = None;
                let mut growth: Option<(usize, f64, f64)> = None;
                for (i, e) in entries.iter().enumerate() {
                    let d = self.metric.distance(&e.pivot, &item);
                    if d <= e.radius {
                        if covered.is_none_or(|(_, best)| d < best) {
                            covered = Some((i, d));
                        }
                    } else if growth.is_none_or(|(_, best, _)| d - e.radius < best) {
                        growth = Some((i, d - e.radius, d));
                    }
                }
                let (idx, d) = match covered.or(growth.map(|(i, _, d)| (i, d))) {
                    Some(pick) => pick,
                    None => unreachable!("internal node with no children"),
                };
                let pivot = entries[idx].pivot.clone();
                entries[idx].radius = entries[idx].radius.max(d);
                match self.insert_at(&mut entries[idx].child, item, Some(&pivot)) {
                    NodeInsert::Fit => NodeInsert::Fit,
                    NodeInsert::Split(mut first, mut second) => {
                        first.parent_distance =
                            node_pivot.map_or(0.0, |p| self.metric.distance(p, &first.pivot));
                        second.parent_distance =
                            node_pivot.map_or(0.0, |p| self.metric.distance(p, &second.pivot));
                        entries.swap_remove(idx);
                        entries.push(first);
                        entries.push(second);
                        if entries.len() > self.max_children {
                            let drained = core::mem::take(entries);
                            let (a, b) = self.split_internal(drained);
                            NodeInsert::Split(a, b)
                        } else {
                            NodeInsert::Fit
                        }
                    }
                }
            }
        }
    }

    /// Promote two pivots by policy; `dist` is symmetric over entry indices.
    fn promote_pair(&self, n: usize, dist: impl Fn(usize, usize) -> f64) -> (usize, usize) {
        match self.promote {
            PromotePolicy::MaxDistance => {
                let (mut bi, mut bj, mut best) = (0, 1, f64::NEG_INFINITY);
                for i in 0..n {
                    for j in (i + 1)..n {
                        let d = dist(i, j);
                        if d > best {
                            best = d;
                            bi = i;
                            bj = j;
                        }
                    }
                }
                (bi, bj)
            }
        }
    }

    /// Assign every entry to a pivot by policy. `to_first[i]` says whether
    /// entry `i` joins the first pivot's group; the pivots themselves are
    /// pinned to their own groups.
    fn partition_assign(&self, d1: &[f64], d2: &[f64], p1: usize, p2: usize) -> Vec<bool> {
        let n = d1.len();
        let mut to_first = vec![false; n];
        match self.partition {
            PartitionPolicy::GeneralizedHyperplane => {
                for i in 0..n {
                    to_first[i] = d1[i] <= d2[i];
                }
                to_first[p1] = true;
                to_first[p2] = false;
                // Shift the cheapest entries to an undersized group.
                let floor = self.min_children;
                loop {
                    let count1 = to_first.iter().filter(|&&f| f).count();
                    if count1 >= floor && n - count1 >= floor {
                        break;
                    }
                    let starved_first = count1 < floor;
                    let pick = (0..n)
                        .filter(|&i| i != p1 && i != p2 && to_first[i] != starved_first)
                        .min_by(|&a, &b| {
                            let key = |i: usize| if starved_first { d1[i] } else { d2[i] };
                            key(a).total_cmp(&key(b))
                        });
                    match pick {
                        Some(i) => to_first[i] = starved_first,
                        None => break,
                    }
                }
            }
            PartitionPolicy::Balanced => {
                let mut unassigned: Vec<usize> =
                    (0..n).filter(|&i| i != p1 && i != p2).collect();
                to_first[p1] = true;
                let mut first_turn = true;
                while !unassigned.is_empty() {
                    let key = |i: usize| if first_turn { d1[i] } else { d2[i] };
                    let (pos, _) = match unassigned
                        .iter()
                        .enumerate()
                        .min_by(|&(_, &a), &(_, &b)| key(a).total_cmp(&key(b)))
                    {
                        Some((pos, &i)) => (pos, i),
                        None => unreachable!("checked non-empty above"),
                    };
                    let i = unassigned.swap_remove(pos);
                    to_first[i] = first_turn;
                    first_turn = !first_turn;
                }
            }
        }
        to_first
    }

    /// Split an overflowing leaf into two routing entries. Their
    /// `parent_distance` is left at zero for the caller to fix.
    fn split_leaf(&self, entries: Vec<LeafEntry<T>>) -> (RoutingEntry<T>, RoutingEntry<T>) {
        let (p1, p2) =
            self.promote_pair(entries.len(), |i, j| {
                self.metric.distance(&entries[i].item, &entries[j].item)
            });
        let pivot1 = entries[p1].item.clone();
        let pivot2 = entries[p2].item.clone();
        let d1: Vec<f64> = entries
            .iter()
            .map(|e| self.metric.distance(&pivot1, &e.item))
            .collect();
        let d2: Vec<f64> = entries
            .iter()
            .map(|e| self.metric.distance(&pivot2, &e.item))
            .collect();
        let to_first = self.partition_assign(&d1, &d2, p1, p2);
        let mut group1 = Vec::new();
        let mut group2 = Vec::new();
        let (mut r1, mut r2) = (0.0_f64, 0.0_f64);
        for (i, mut e) in entries.into_iter().enumerate() {
            if to_first[i] {
                e.parent_distance = d1[i];
                r1 = r1.max(d1[i]);
                group1.push(e);
            } else {
                e.parent_distance = d2[i];
                r2 = r2.max(d2[i]);
                group2.push(e);
            }
        }
        (
            RoutingEntry {
                pivot: pivot1,
                parent_distance: 0.0,
                radius: r1,
                child: Box::new(MNode::Leaf(group1)),
            },
            RoutingEntry {
                pivot: pivot2,
                parent_distance: 0.0,
                radius: r2,
                child: Box::new(MNode::Leaf(group2)),
            },
        )
    }

    /// Split an overflowing internal node. As [`Self::split_leaf`], with
    /// radii covering each member's own radius.
    fn split_internal(
        &self,
        entries: Vec<RoutingEntry<T>>,
    ) -> (RoutingEntry<T>, RoutingEntry<T>) {
        let (p1, p2) =
            self.promote_pair(entries.len(), |i, j| {
                self.metric.distance(&entries[i].pivot, &entries[j].pivot)
            });
        let pivot1 = entries[p1].pivot.clone();
        let pivot2 = entries[p2].pivot.clone();
        let d1: Vec<f64> = entries
            .iter()
            .map(|e| self.metric.distance(&pivot1, &e.pivot))
            .collect();
        let d2: Vec<f64> = entries
            .iter()
            .map(|e| self.metric.distance(&pivot2, &e.pivot))
            .collect();
        let to_first = self.partition_assign(&d1, &d2, p1, p2);
        let mut group1 = Vec::new();
        let mut group2 = Vec::new();
        let (mut r1, mut r2) = (0.0_f64, 0.0_f64);
        for (i, mut e) in entries.into_iter().enumerate() {
            if to_first[i] {
                e.parent_distance = d1[i];
                r1 = r1.max(d1[i] + e.radius);
                group1.push(e);
            } else {
                e.parent_distance = d2[i];
                r2 = r2.max(d2[i] + e.radius);
                group2.push(e);
            }
        }
        (
            RoutingEntry {
                pivot: pivot1,
                parent_distance: 0.0,
                radius: r1,
                child: Box::new(MNode::Internal(group1)),
            },
            RoutingEntry {
                pivot: pivot2,
                parent_distance: 0.0,
                radius: r2,
                child: Box::new(MNode::Internal(group2)),
            },
        )
    }

    /// `query_pd` is the distance from `item` to the pivot governing
    /// `node`, used for triangle-inequality prefiltering.
    fn remove_at(&self, node: &mut MNode<T>, item: &T, query_pd: Option<f64>) -> bool {
        match node {
            MNode::Leaf(entries) => {
                if let Some(pos) = entries.iter().position(|e| e.item == *item) {
                    entries.remove(pos);
                    true
                } else {
                    false
                }
            }
            MNode::Internal(entries) => {
                for i in 0..entries.len() {
                    if let Some(qpd) = query_pd
                        && (qpd - entries[i].parent_distance).abs() > entries[i].radius
                    {
                        // Triangle inequality: the subtree cannot hold the
                        // target, no metric call needed.
                        continue;
                    }
                    let d = self.metric.distance(item, &entries[i].pivot);
                    if d > entries[i].radius {
                        continue;
                    }
                    if self.remove_at(&mut entries[i].child, item, Some(d)) {
                        self.rebalance_child(entries, i);
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Fix an underflowing child: borrow a grandchild from the nearest
    /// sibling with surplus capacity, else merge into the nearest sibling.
    fn rebalance_child(&self, entries: &mut Vec<RoutingEntry<T>>, idx: usize) {
        if entries[idx].child.len() >= self.min_children || entries.len() < 2 {
            return;
        }
        let my_pivot = entries[idx].pivot.clone();
        let mut donor: Option<(usize, f64)> = None;
        let mut nearest: Option<(usize, f64)> = None;
        for (i, e) in entries.iter().enumerate() {
            if i == idx {
                continue;
            }
            let d = self.metric.distance(&my_pivot, &e.pivot);
            if nearest.is_none_or(|(_, best)| d < best) {
                nearest = Some((i, d));
            }
            if e.child.len() > self.min_children && donor.is_none_or(|(_, best)| d < best) {
                donor = Some((i, d));
            }
        }
        if let Some((from, _)) = donor {
            debug!("underflow repaired by donation");
            self.donate(entries, from, idx);
        } else if let Some((into, _)) = nearest {
            debug!("underflow repaired by merge");
            self.merge(entries, into, idx);
        }
    }

    /// Move the donor grandchild nearest to the receiver's pivot.
    fn donate(&self, entries: &mut [RoutingEntry<T>], from: usize, to: usize) {
        let recv_pivot = entries[to].pivot.clone();
        let moved = match &mut *entries[from].child {
            MNode::Leaf(items) => {
                let pos = match items.iter().enumerate().min_by(|(_, a), (_, b)| {
                    self.metric
                        .distance(&recv_pivot, &a.item)
                        .total_cmp(&self.metric.distance(&recv_pivot, &b.item))
                }) {
                    Some((pos, _)) => pos,
                    None => unreachable!("donor sibling has surplus entries"),
                };
                Donated::Leaf(items.swap_remove(pos))
            }
            MNode::Internal(items) => {
                let pos = match items.iter().enumerate().min_by(|(_, a), (_, b)| {
                    self.metric
                        .distance(&recv_pivot, &a.pivot)
                        .total_cmp(&self.metric.distance(&recv_pivot, &b.pivot))
                }) {
                    Some((pos, _)) => pos,
                    None => unreachable!("donor sibling has surplus entries"),
                };
                Donated::Routing(items.swap_remove(pos))
            }
        };
        let receiver = &mut entries[to];
        match moved {
            Donated::Leaf(mut e) => {
                let d = self.metric.distance(&recv_pivot, &e.item);
                e.parent_distance = d;
                receiver.radius = receiver.radius.max(d);
                if let MNode::Leaf(items) = &mut *receiver.child {
                    items.push(e);
                }
            }
            Donated::Routing(mut e) => {
                let d = self.metric.distance(&recv_pivot, &e.pivot);
                e.parent_distance = d;
                receiver.radius = receiver.radius.max(d + e.radius);
                if let MNode::Internal(items) = &mut *receiver.child {
                    items.push(e);
                }
            }
        }
    }

    /// Fold the child at `remove` into the child at `keep`. The merged node
    /// may exceed `max_children`; the next insert through it splits it.
    fn merge(&self, entries: &mut Vec<RoutingEntry<T>>, keep: usize, remove: usize) {
        let mut keep = keep;
        let removed = entries.swap_remove(remove);
        if keep == entries.len() {
            keep = remove;
        }
        let keep_pivot = entries[keep].pivot.clone();
        let mut radius = entries[keep].radius;
        match (*removed.child, &mut *entries[keep].child) {
            (MNode::Leaf(items), MNode::Leaf(dst)) => {
                for mut e in items {
                    let d = self.metric.distance(&keep_pivot, &e.item);
                    e.parent_distance = d;
                    radius = radius.max(d);
                    dst.push(e);
                }
            }
            (MNode::Internal(items), MNode::Internal(dst)) => {
                for mut e in items {
                    let d = self.metric.distance(&keep_pivot, &e.pivot);
                    e.parent_distance = d;
                    radius = radius.max(d + e.radius);
                    dst.push(e);
                }
            }
            _ => unreachable!("siblings at mixed levels"),
        }
        entries[keep].radius = radius;
    }

    #[cfg(test)]
    pub(crate) fn root_node(&self) -> Option<&MNode<T>> {
        self.root.as_deref()
    }
}

impl<T, M> core::fmt::Debug for MTree<T, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MTree")
            .field("len", &self.len)
            .field("min_children", &self.min_children)
            .field("max_children", &self.max_children)
            .field("promote", &self.promote)
            .field("partition", &self.partition)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosk_geom::{Coordinate, EuclideanDistance};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn scattered(n: usize) -> Vec<Coordinate> {
        let mut points: Vec<Coordinate> = (0..n)
            .map(|i| Coordinate::new((i * 37 % 211) as f64, (i * 53 % 197) as f64))
            .collect();
        points.shuffle(&mut StdRng::seed_from_u64(5));
        points
    }

    /// Every routing entry's radius covers all data items below it.
    fn check_radii(tree: &MTree<Coordinate, EuclideanDistance>) {
        fn items<'a>(node: &'a MNode<Coordinate>, out: &mut Vec<&'a Coordinate>) {
            match node {
                MNode::Leaf(entries) => out.extend(entries.iter().map(|e| &e.item)),
                MNode::Internal(entries) => {
                    for e in entries {
                        items(&e.child, out);
                    }
                }
            }
        }
        fn walk(metric: &EuclideanDistance, node: &MNode<Coordinate>) {
            if let MNode::Internal(entries) = node {
                for e in entries {
                    let mut below = Vec::new();
                    items(&e.child, &mut below);
                    for item in below {
                        assert!(
                            metric.distance(&e.pivot, item) <= e.radius + 1e-9,
                            "covering radius {} too small for {item:?}",
                            e.radius
                        );
                    }
                    walk(metric, &e.child);
                }
            }
        }
        if let Some(root) = tree.root_node() {
            walk(&EuclideanDistance, root);
        }
    }

    fn brute_force(points: &[Coordinate], target: &Coordinate) -> Vec<(Coordinate, f64)> {
        let mut all: Vec<(Coordinate, f64)> =
            points.iter().map(|p| (*p, p.distance(target))).collect();
        all.sort_by(|a, b| a.1.total_cmp(&b.1));
        all
    }

    #[test]
    fn construction_rejects_bad_capacities() {
        assert_eq!(
            MTree::<Coordinate, _>::new(0, 5, EuclideanDistance).unwrap_err(),
            MetricError::InvalidCapacity { min: 0, max: 5 }
        );
        assert_eq!(
            MTree::<Coordinate, _>::new(3, 3, EuclideanDistance).unwrap_err(),
            MetricError::InvalidCapacity { min: 3, max: 3 }
        );
        assert!(MTree::<Coordinate, _>::new(2, 8, EuclideanDistance).is_ok());
    }

    #[test]
    fn duplicates_are_rejected_without_mutation() {
        let mut tree = MTree::new(2, 4, EuclideanDistance).unwrap();
        tree.insert(Coordinate::new(1.0, 1.0)).unwrap();
        assert_eq!(
            tree.insert(Coordinate::new(1.0, 1.0)),
            Err(MetricError::DuplicateItem)
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn search_yields_ascending_distances() {
        let points = scattered(120);
        let mut tree = MTree::new(2, 6, EuclideanDistance).unwrap();
        tree.insert_all(points.clone()).unwrap();
        check_radii(&tree);
        let target = Coordinate::new(100.0, 100.0);
        let got: Vec<(Coordinate, f64)> =
            tree.search(&target).map(|(c, d)| (*c, d)).collect();
        assert_eq!(got.len(), points.len());
        for pair in got.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "distances out of order");
        }
        let expected = brute_force(&points, &target);
        let got_d: Vec<f64> = got.iter().map(|(_, d)| *d).collect();
        let expected_d: Vec<f64> = expected.iter().map(|(_, d)| *d).collect();
        assert_eq!(got_d, expected_d);
    }

    #[test]
    fn radius_and_limit_compose() {
        let points = scattered(100);
        let mut tree = MTree::new(2, 5, EuclideanDistance).unwrap();
        tree.insert_all(points.clone()).unwrap();
        let target = Coordinate::new(50.0, 50.0);
        let within = tree.search(&target).within(40.0).count();
        let limited = tree.search(&target).limit(10).count();
        assert_eq!(limited, 10);
        let both: Vec<(&Coordinate, f64)> =
            tree.search(&target).within(40.0).limit(10).collect();
        assert!(both.len() <= within.min(10));
        assert!(both.iter().all(|(_, d)| *d <= 40.0));
        let expected = brute_force(&points, &target);
        let expected_both: Vec<f64> = expected
            .iter()
            .map(|(_, d)| *d)
            .filter(|d| *d <= 40.0)
            .take(10)
            .collect();
        let got_both: Vec<f64> = both.iter().map(|(_, d)| *d).collect();
        assert_eq!(got_both, expected_both);
    }

    #[test]
    fn search_is_lazy_and_restartable() {
        let mut tree = MTree::new(2, 4, EuclideanDistance).unwrap();
        tree.insert_all(scattered(40)).unwrap();
        let target = Coordinate::new(0.0, 0.0);
        let mut it = tree.search(&target);
        let head = it.next().map(|(c, d)| (*c, d));
        assert!(head.is_some());
        it.restart();
        assert_eq!(it.next().map(|(c, d)| (*c, d)), head);
    }

    #[test]
    fn remove_round_trip_and_root_collapse() {
        let points = scattered(80);
        let mut tree = MTree::new(2, 4, EuclideanDistance).unwrap();
        tree.insert_all(points.clone()).unwrap();
        assert!(tree.height() > 1);
        assert!(!tree.remove(&Coordinate::new(-5.0, -5.0)));
        for (i, p) in points.iter().enumerate() {
            assert!(tree.remove(p), "{p:?} went missing");
            assert!(!tree.contains(p));
            check_radii(&tree);
            assert_eq!(tree.len(), points.len() - i - 1);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn balanced_partition_stays_correct() {
        let points = scattered(90);
        let mut tree = MTree::with_policies(
            2,
            5,
            EuclideanDistance,
            PromotePolicy::MaxDistance,
            PartitionPolicy::Balanced,
        )
        .unwrap();
        tree.insert_all(points.clone()).unwrap();
        check_radii(&tree);
        let target = Coordinate::new(30.0, 70.0);
        let got: Vec<f64> = tree.search(&target).map(|(_, d)| d).collect();
        let expected: Vec<f64> = brute_force(&points, &target)
            .iter()
            .map(|(_, d)| *d)
            .collect();
        assert_eq!(got, expected);
        for p in &points {
            assert!(tree.contains(p));
        }
    }

    #[test]
    fn closures_work_as_metrics() {
        let manhattan = |a: &Coordinate, b: &Coordinate| (a.x - b.x).abs() + (a.y - b.y).abs();
        let mut tree = MTree::new(2, 4, manhattan).unwrap();
        tree.insert_all([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(3.0, 0.0),
            Coordinate::new(0.0, 4.0),
            Coordinate::new(5.0, 5.0),
        ])
        .unwrap();
        let target = Coordinate::new(0.0, 0.0);
        let nearest: Vec<f64> = tree.search(&target).map(|(_, d)| d).collect();
        assert_eq!(nearest, vec![0.0, 3.0, 4.0, 10.0]);
    }

    #[test]
    fn iter_visits_every_item() {
        let points = scattered(64);
        let mut tree = MTree::new(2, 6, EuclideanDistance).unwrap();
        tree.insert_all(points.clone()).unwrap();
        assert_eq!(tree.iter().count(), points.len());
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.iter().count(), 0);
    }
}
