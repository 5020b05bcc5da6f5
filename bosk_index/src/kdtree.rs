// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A point k-d tree with region-pruned queries.

use bosk_geom::{Coordinate, Envelope};
use log::warn;

use crate::error::IndexError;

struct KdNode {
    coord: Coordinate,
    /// Envelope of every coordinate in this subtree; recomputed bottom-up
    /// after removals, grown in place during inserts.
    region: Envelope,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

/// A k-d tree over unique coordinates in 2 or 3 dimensions.
///
/// The splitting axis cycles with depth. At each node the left subtree holds
/// coordinates less than or equal to the node along its axis, the right
/// subtree those greater or equal; exact duplicates of a stored coordinate
/// are rejected. Each node caches the envelope of its subtree, which prunes
/// range and nearest-neighbor queries without touching the coordinates
/// below.
pub struct KdTree {
    root: Option<Box<KdNode>>,
    dims: usize,
    len: usize,
}

impl KdTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidDimension`] unless `dims` is 2 or 3.
    pub fn new(dims: usize) -> Result<Self, IndexError> {
        if dims != 2 && dims != 3 {
            return Err(IndexError::InvalidDimension(dims));
        }
        Ok(Self {
            root: None,
            dims,
            len: 0,
        })
    }

    /// Build a tree by inserting every coordinate of an iterator.
    ///
    /// # Errors
    ///
    /// As [`Self::new`] and [`Self::insert`]; stops at the first rejected
    /// coordinate.
    pub fn from_coordinates<I>(dims: usize, coords: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut tree = Self::new(dims)?;
        for c in coords {
            tree.insert(c)?;
        }
        Ok(tree)
    }

    /// Number of stored coordinates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no coordinates are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Dimensionality, 2 or 3.
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Number of levels: `0` when empty, `1` for a lone root.
    pub fn height(&self) -> usize {
        fn depth(node: Option<&KdNode>) -> usize {
            node.map_or(0, |n| {
                1 + depth(n.left.as_deref()).max(depth(n.right.as_deref()))
            })
        }
        depth(self.root.as_deref())
    }

    /// Drop every stored coordinate.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert a coordinate.
    ///
    /// # Errors
    ///
    /// [`IndexError::NonFiniteEnvelope`] for NaN or infinite components,
    /// [`IndexError::InvalidDimension`] for a 3D coordinate in a 2D tree,
    /// and [`IndexError::DuplicateCoordinate`] when already present. The
    /// tree is unchanged on every error.
    pub fn insert(&mut self, c: Coordinate) -> Result<(), IndexError> {
        if !c.is_finite() {
            warn!("rejecting non-finite coordinate {c:?}");
            return Err(IndexError::NonFiniteEnvelope);
        }
        if self.dims == 2 && c.z != 0.0 {
            return Err(IndexError::InvalidDimension(3));
        }
        if self.contains(&c) {
            return Err(IndexError::DuplicateCoordinate);
        }
        Self::insert_node(&mut self.root, c, 0, self.dims);
        self.len += 1;
        Ok(())
    }

    fn insert_node(slot: &mut Option<Box<KdNode>>, c: Coordinate, depth: usize, dims: usize) {
        match slot {
            None => {
                *slot = Some(Box::new(KdNode {
                    coord: c,
                    region: Envelope::point(&c),
                    left: None,
                    right: None,
                }));
            }
            Some(node) => {
                node.region = node.region.union(&Envelope::point(&c));
                let axis = depth % dims;
                if c.get(axis) <= node.coord.get(axis) {
                    Self::insert_node(&mut node.left, c, depth + 1, dims);
                } else {
                    Self::insert_node(&mut node.right, c, depth + 1, dims);
                }
            }
        }
    }

    /// Whether the exact coordinate is stored.
    pub fn contains(&self, c: &Coordinate) -> bool {
        Self::contains_node(self.root.as_deref(), c, 0, self.dims)
    }

    fn contains_node(node: Option<&KdNode>, c: &Coordinate, depth: usize, dims: usize) -> bool {
        let Some(node) = node else {
            return false;
        };
        if !node.region.contains_coordinate(c) {
            return false;
        }
        if node.coord == *c {
            return true;
        }
        let axis = depth % dims;
        let v = c.get(axis);
        let nv = node.coord.get(axis);
        if v < nv {
            Self::contains_node(node.left.as_deref(), c, depth + 1, dims)
        } else if v > nv {
            Self::contains_node(node.right.as_deref(), c, depth + 1, dims)
        } else {
            // Removal may leave equal axis values on either side.
            Self::contains_node(node.left.as_deref(), c, depth + 1, dims)
                || Self::contains_node(node.right.as_deref(), c, depth + 1, dims)
        }
    }

    /// Remove a coordinate; `false` when absent.
    pub fn remove(&mut self, c: &Coordinate) -> bool {
        if Self::remove_node(&mut self.root, c, 0, self.dims) {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    fn remove_node(slot: &mut Option<Box<KdNode>>, c: &Coordinate, depth: usize, dims: usize) -> bool {
        let Some(node) = slot else {
            return false;
        };
        if !node.region.contains_coordinate(c) {
            return false;
        }
        let axis = depth % dims;
        let removed = if node.coord == *c {
            if node.right.is_some() {
                // Pull up the axis-minimum of the right subtree, then chase
                // it out of that subtree.
                let replacement = match &node.right {
                    Some(right) => Self::find_extreme(right, axis, depth + 1, dims, true),
                    None => unreachable!("checked right above"),
                };
                node.coord = replacement;
                let gone = Self::remove_node(&mut node.right, &replacement, depth + 1, dims);
                debug_assert!(gone, "replacement coordinate vanished");
                true
            } else if node.left.is_some() {
                let replacement = match &node.left {
                    Some(left) => Self::find_extreme(left, axis, depth + 1, dims, false),
                    None => unreachable!("checked left above"),
                };
                node.coord = replacement;
                let gone = Self::remove_node(&mut node.left, &replacement, depth + 1, dims);
                debug_assert!(gone, "replacement coordinate vanished");
                true
            } else {
                *slot = None;
                return true;
            }
        } else {
            let v = c.get(axis);
            let nv = node.coord.get(axis);
            if v < nv {
                Self::remove_node(&mut node.left, c, depth + 1, dims)
            } else if v > nv {
                Self::remove_node(&mut node.right, c, depth + 1, dims)
            } else {
                Self::remove_node(&mut node.left, c, depth + 1, dims)
                    || Self::remove_node(&mut node.right, c, depth + 1, dims)
            }
        };
        if removed && let Some(node) = slot {
            let mut region = Envelope::point(&node.coord);
            if let Some(left) = &node.left {
                region = region.union(&left.region);
            }
            if let Some(right) = &node.right {
                region = region.union(&right.region);
            }
            node.region = region;
        }
        removed
    }

    /// Coordinate with the smallest (`minimum = true`) or largest value
    /// along `target_axis` in the subtree.
    fn find_extreme(
        node: &KdNode,
        target_axis: usize,
        depth: usize,
        dims: usize,
        minimum: bool,
    ) -> Coordinate {
        let axis = depth % dims;
        if axis == target_axis {
            // Only one side can improve along the splitting axis, but the
            // node itself stays a candidate.
            let side = if minimum { &node.left } else { &node.right };
            if let Some(child) = side {
                let cand = Self::find_extreme(child, target_axis, depth + 1, dims, minimum);
                return Self::pick(cand, node.coord, target_axis, minimum);
            }
            return node.coord;
        }
        let mut best = node.coord;
        for child in [&node.left, &node.right].into_iter().flatten() {
            let cand = Self::find_extreme(child, target_axis, depth + 1, dims, minimum);
            best = Self::pick(cand, best, target_axis, minimum);
        }
        best
    }

    fn pick(a: Coordinate, b: Coordinate, axis: usize, minimum: bool) -> Coordinate {
        let better = if minimum {
            a.get(axis) < b.get(axis)
        } else {
            a.get(axis) > b.get(axis)
        };
        if better { a } else { b }
    }

    /// Stored coordinates inside `query`, yielded lazily.
    pub fn search(&self, query: &Envelope) -> KdSearch<'_> {
        KdSearch::new(self.root.as_deref(), *query)
    }

    /// All stored coordinates, in traversal order.
    pub fn iter(&self) -> KdSearch<'_> {
        KdSearch::new(self.root.as_deref(), Envelope::infinite(3))
    }

    /// The stored coordinate closest to `target`; `None` when empty.
    ///
    /// Branch-and-bound: the near side of each split is visited first, and
    /// a subtree is skipped when its region cannot beat the best distance
    /// found so far. Ties keep the first candidate encountered.
    pub fn nearest_neighbour(&self, target: &Coordinate) -> Option<&Coordinate> {
        let root = self.root.as_deref()?;
        let mut best: Option<(&Coordinate, f64)> = None;
        Self::nearest(root, target, 0, self.dims, &mut best);
        best.map(|(c, _)| c)
    }

    fn nearest<'a>(
        node: &'a KdNode,
        target: &Coordinate,
        depth: usize,
        dims: usize,
        best: &mut Option<(&'a Coordinate, f64)>,
    ) {
        if let Some((_, radius)) = best
            && node.region.min_distance(target) >= *radius
        {
            return;
        }
        let d = node.coord.distance(target);
        if best.map_or(true, |(_, radius)| d < radius) {
            *best = Some((&node.coord, d));
        }
        let axis = depth % dims;
        let (near, far) = if target.get(axis) <= node.coord.get(axis) {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };
        if let Some(n) = near {
            Self::nearest(n, target, depth + 1, dims, best);
        }
        if let Some(f) = far {
            Self::nearest(f, target, depth + 1, dims, best);
        }
    }
}

impl core::fmt::Debug for KdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("dims", &self.dims)
            .field("len", &self.len)
            .field("height", &self.height())
            .finish()
    }
}

/// Lazy range query over a [`KdTree`]. Restartable via [`Self::restart`].
#[derive(Debug)]
pub struct KdSearch<'a> {
    root: Option<&'a KdNode>,
    query: Envelope,
    stack: Vec<&'a KdNode>,
}

impl core::fmt::Debug for KdNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdNode")
            .field("coord", &self.coord)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl<'a> KdSearch<'a> {
    fn new(root: Option<&'a KdNode>, query: Envelope) -> Self {
        let mut search = Self {
            root,
            query,
            stack: Vec::new(),
        };
        search.restart();
        search
    }

    /// Rewind to the start of the traversal.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.extend(self.root);
    }
}

impl<'a> Iterator for KdSearch<'a> {
    type Item = &'a Coordinate;

    fn next(&mut self) -> Option<&'a Coordinate> {
        while let Some(node) = self.stack.pop() {
            if !node.region.intersects(&self.query) {
                continue;
            }
            self.stack.extend(node.left.as_deref());
            self.stack.extend(node.right.as_deref());
            if self.query.contains_coordinate(&node.coord) {
                return Some(&node.coord);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Axis ordering and cached regions, checked over the whole tree.
    fn check_structure(tree: &KdTree) {
        fn walk(node: &KdNode, depth: usize, dims: usize) -> (Envelope, usize) {
            let axis = depth % dims;
            let mut region = Envelope::point(&node.coord);
            let mut count = 1;
            if let Some(left) = &node.left {
                assert!(
                    left.region.max(axis) <= node.coord.get(axis) + 1e-12,
                    "left subtree exceeds the split plane"
                );
                let (r, c) = walk(left, depth + 1, dims);
                region = region.union(&r);
                count += c;
            }
            if let Some(right) = &node.right {
                let (r, c) = walk(right, depth + 1, dims);
                region = region.union(&r);
                count += c;
            }
            assert_eq!(node.region, region, "cached region is stale");
            (region, count)
        }
        if let Some(root) = tree.root.as_deref() {
            let (_, count) = walk(root, 0, tree.dims);
            assert_eq!(count, tree.len, "node count disagrees with len");
        } else {
            assert_eq!(tree.len, 0, "empty tree with nonzero len");
        }
    }

    fn diagonal(n: usize) -> Vec<Coordinate> {
        (1..=n).map(|i| Coordinate::new(i as f64, i as f64)).collect()
    }

    #[test]
    fn construction_validates_dimensionality() {
        assert_eq!(KdTree::new(1).unwrap_err(), IndexError::InvalidDimension(1));
        assert_eq!(KdTree::new(4).unwrap_err(), IndexError::InvalidDimension(4));
        assert!(KdTree::new(2).is_ok());
        assert!(KdTree::new(3).is_ok());
    }

    #[test]
    fn nearest_neighbour_on_the_diagonal() {
        let tree = KdTree::from_coordinates(2, diagonal(100)).unwrap();
        assert_eq!(
            tree.nearest_neighbour(&Coordinate::new(50.6, 50.6)),
            Some(&Coordinate::new(51.0, 51.0))
        );
        assert_eq!(
            tree.nearest_neighbour(&Coordinate::new(50.4, 50.4)),
            Some(&Coordinate::new(50.0, 50.0))
        );
    }

    #[test]
    fn nearest_neighbour_handles_empty_and_exact() {
        let mut tree = KdTree::new(2).unwrap();
        assert_eq!(tree.nearest_neighbour(&Coordinate::new(0.0, 0.0)), None);
        tree.insert(Coordinate::new(3.0, 4.0)).unwrap();
        assert_eq!(
            tree.nearest_neighbour(&Coordinate::new(3.0, 4.0)),
            Some(&Coordinate::new(3.0, 4.0))
        );
    }

    #[test]
    fn duplicates_are_rejected_without_mutation() {
        let mut tree = KdTree::new(2).unwrap();
        tree.insert(Coordinate::new(1.0, 2.0)).unwrap();
        assert_eq!(
            tree.insert(Coordinate::new(1.0, 2.0)),
            Err(IndexError::DuplicateCoordinate)
        );
        assert_eq!(tree.len(), 1);
        check_structure(&tree);
    }

    #[test]
    fn mismatched_dimensionality_is_rejected() {
        let mut tree = KdTree::new(2).unwrap();
        assert_eq!(
            tree.insert(Coordinate::new_3d(1.0, 2.0, 3.0)),
            Err(IndexError::InvalidDimension(3))
        );
        assert_eq!(
            tree.insert(Coordinate::new(f64::NAN, 0.0)),
            Err(IndexError::NonFiniteEnvelope)
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn range_search_returns_exactly_the_contained_points() {
        let tree = KdTree::from_coordinates(2, diagonal(100)).unwrap();
        let mut hits: Vec<f64> = tree
            .search(&Envelope::new_2d(10.0, 10.0, 20.0, 20.0))
            .map(|c| c.x)
            .collect();
        hits.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (10..=20).map(|i| i as f64).collect();
        assert_eq!(hits, expected);
    }

    #[test]
    fn infinite_search_and_iter_return_everything() {
        let tree = KdTree::from_coordinates(2, diagonal(64)).unwrap();
        assert_eq!(tree.search(&Envelope::infinite(3)).count(), 64);
        assert_eq!(tree.iter().count(), 64);
        let mut it = tree.iter();
        let head = it.next().copied();
        it.restart();
        assert_eq!(it.next().copied(), head);
    }

    #[test]
    fn removal_round_trip_preserves_structure() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut points = diagonal(128);
        let mut tree = KdTree::from_coordinates(2, points.clone()).unwrap();
        while !points.is_empty() {
            let victim = points.swap_remove(rng.gen_range(0..points.len()));
            assert!(tree.remove(&victim), "{victim:?} went missing");
            assert!(!tree.contains(&victim));
            check_structure(&tree);
            for p in &points {
                assert!(tree.contains(p), "{p:?} lost after removing {victim:?}");
            }
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert!(!tree.remove(&Coordinate::new(1.0, 1.0)));
    }

    #[test]
    fn three_d_points_round_trip() {
        let points: Vec<Coordinate> = (0..50)
            .map(|i| Coordinate::new_3d(i as f64, (i * 3 % 50) as f64, (i * 7 % 50) as f64 + 1.0))
            .collect();
        let mut tree = KdTree::from_coordinates(3, points.clone()).unwrap();
        check_structure(&tree);
        assert_eq!(
            tree.search(&Envelope::new_3d(0.0, 0.0, 0.0, 50.0, 50.0, 51.0))
                .count(),
            50
        );
        assert_eq!(
            tree.nearest_neighbour(&Coordinate::new_3d(0.1, 0.1, 1.1)),
            Some(&points[0])
        );
        for p in &points {
            assert!(tree.remove(p));
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn height_grows_with_the_diagonal() {
        let mut tree = KdTree::new(2).unwrap();
        assert_eq!(tree.height(), 0);
        tree.insert(Coordinate::new(5.0, 5.0)).unwrap();
        assert_eq!(tree.height(), 1);
        tree.insert(Coordinate::new(2.0, 2.0)).unwrap();
        tree.insert(Coordinate::new(8.0, 8.0)).unwrap();
        assert_eq!(tree.height(), 2);
        tree.clear();
        assert_eq!(tree.height(), 0);
        assert!(tree.is_empty());
    }
}
