// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Balancing policies for the rectangle tree.
//!
//! The engine in [`tree`](super::tree) is generic over a [`SplitStrategy`];
//! the three policies here yield the classic R-tree, the R*-tree, and the
//! Hilbert R-tree without any of them owning tree structure.

use bosk_geom::{Coordinate, Envelope};

use crate::error::IndexError;
use crate::hilbert::HilbertEncoder;

/// Share of an overflowing node's entries that forced reinsertion evicts.
const REINSERT_SHARE_PERCENT: usize = 30;

/// How a rectangle tree places and rebalances entries.
///
/// Implementations see only envelopes, never the stored geometries, and hold
/// no tree state; the engine owns the structure and consults the strategy at
/// each decision point.
pub trait SplitStrategy {
    /// Index of the child to descend into when inserting `target`.
    ///
    /// `children` holds the envelope of each candidate; `leaf_level` is true
    /// when the candidates are leaves.
    fn choose_subtree(&self, children: &[Envelope], target: &Envelope, leaf_level: bool) -> usize;

    /// Partition an overflowing node's child envelopes into two groups.
    ///
    /// Returns the indices that move to the split-off sibling. Both groups
    /// keep at least `min_children` members whenever `envelopes` is large
    /// enough to allow it.
    fn split(&self, envelopes: &[Envelope], min_children: usize) -> Vec<usize>;

    /// Indices of entries to evict for forced reinsertion, or empty to
    /// split instead.
    ///
    /// `level_visited` is true when the overflowing node's level has already
    /// reinserted during the current top-level insertion; at most one
    /// reinsertion pass runs per level per insert.
    fn reinsert_pick(
        &self,
        node_envelope: &Envelope,
        envelopes: &[Envelope],
        min_children: usize,
        level_visited: bool,
    ) -> Vec<usize> {
        let _ = (node_envelope, envelopes, min_children, level_visited);
        Vec::new()
    }
}

/// Least-enlargement descent with ties broken by smaller volume.
fn least_enlargement(children: &[Envelope], target: &Envelope) -> usize {
    let mut best = 0;
    let mut best_growth = f64::INFINITY;
    let mut best_volume = f64::INFINITY;
    for (i, child) in children.iter().enumerate() {
        let growth = child.enlargement(target);
        let volume = child.volume();
        if growth < best_growth || (growth == best_growth && volume < best_volume) {
            best = i;
            best_growth = growth;
            best_volume = volume;
        }
    }
    best
}

/// Guttman's quadratic split and least-enlargement descent.
///
/// Seeds the two groups with the pair of envelopes whose combined bounding
/// box wastes the most space, then assigns the rest to whichever group grows
/// less, forcing assignments once a group needs every remaining entry to
/// reach the capacity floor.
#[derive(Copy, Clone, Debug, Default)]
pub struct QuadraticSplit;

impl SplitStrategy for QuadraticSplit {
    fn choose_subtree(&self, children: &[Envelope], target: &Envelope, _leaf_level: bool) -> usize {
        least_enlargement(children, target)
    }

    fn split(&self, envelopes: &[Envelope], min_children: usize) -> Vec<usize> {
        let n = envelopes.len();
        debug_assert!(n >= 2, "split needs at least two envelopes");
        let (mut seed1, mut seed2) = (0, 1);
        let mut worst = f64::NEG_INFINITY;
        for i in 0..n {
            for j in (i + 1)..n {
                let dead = envelopes[i].union(&envelopes[j]).volume()
                    - envelopes[i].volume()
                    - envelopes[j].volume();
                if dead > worst {
                    worst = dead;
                    seed1 = i;
                    seed2 = j;
                }
            }
        }
        let mut group1 = vec![seed1];
        let mut group2 = vec![seed2];
        let mut box1 = envelopes[seed1];
        let mut box2 = envelopes[seed2];
        let rest: Vec<usize> = (0..n).filter(|&i| i != seed1 && i != seed2).collect();
        for (assigned, &i) in rest.iter().enumerate() {
            let left = rest.len() - assigned;
            // Once a group needs every remaining entry to reach the floor,
            // it takes them all.
            let to_first = if group1.len() + left <= min_children {
                true
            } else if group2.len() + left <= min_children {
                false
            } else {
                let d1 = box1.enlargement(&envelopes[i]);
                let d2 = box2.enlargement(&envelopes[i]);
                d1 < d2
                    || (d1 == d2
                        && (box1.volume() < box2.volume()
                            || (box1.volume() == box2.volume() && group1.len() <= group2.len())))
            };
            if to_first {
                group1.push(i);
                box1 = box1.union(&envelopes[i]);
            } else {
                group2.push(i);
                box2 = box2.union(&envelopes[i]);
            }
        }
        group2
    }
}

/// R*-tree balancing: margin-driven split axis, overlap-minimal split
/// position, overlap-aware descent at the leaf level, and forced
/// reinsertion of the farthest entries before the first split on a level.
#[derive(Copy, Clone, Debug, Default)]
pub struct RStarSplit;

/// Union of `sorted[0..=i]` at `prefix[i]` and of `sorted[i..]` at
/// `suffix[i]`.
fn cumulative_unions(envelopes: &[Envelope], sorted: &[usize]) -> (Vec<Envelope>, Vec<Envelope>) {
    let n = sorted.len();
    let mut prefix = Vec::with_capacity(n);
    let mut acc = Envelope::empty(2);
    for &i in sorted {
        acc = acc.union(&envelopes[i]);
        prefix.push(acc);
    }
    let mut suffix = vec![Envelope::empty(2); n];
    let mut acc = Envelope::empty(2);
    for k in (0..n).rev() {
        acc = acc.union(&envelopes[sorted[k]]);
        suffix[k] = acc;
    }
    (prefix, suffix)
}

impl SplitStrategy for RStarSplit {
    fn choose_subtree(&self, children: &[Envelope], target: &Envelope, leaf_level: bool) -> usize {
        if !leaf_level {
            return least_enlargement(children, target);
        }
        // At the leaf level minimize the overlap the enlarged child would
        // gain against its siblings; the candidate sets are node-sized, so
        // the exact quadratic computation is affordable.
        let mut best = 0;
        let mut best_overlap = f64::INFINITY;
        let mut best_growth = f64::INFINITY;
        let mut best_volume = f64::INFINITY;
        for (i, child) in children.iter().enumerate() {
            let grown = child.union(target);
            let mut overlap_gain = 0.0;
            for (j, sibling) in children.iter().enumerate() {
                if j != i {
                    overlap_gain += grown.overlap(sibling) - child.overlap(sibling);
                }
            }
            let growth = child.enlargement(target);
            let volume = child.volume();
            if overlap_gain < best_overlap
                || (overlap_gain == best_overlap
                    && (growth < best_growth || (growth == best_growth && volume < best_volume)))
            {
                best = i;
                best_overlap = overlap_gain;
                best_growth = growth;
                best_volume = volume;
            }
        }
        best
    }

    fn split(&self, envelopes: &[Envelope], min_children: usize) -> Vec<usize> {
        let n = envelopes.len();
        debug_assert!(n >= 2, "split needs at least two envelopes");
        let dims = envelopes.iter().map(Envelope::dims).max().unwrap_or(2);
        let (lo, hi) = if 2 * min_children <= n {
            (min_children, n - min_children)
        } else {
            (n / 2, n / 2)
        };
        let mut best_margin = f64::INFINITY;
        let mut sorted: Vec<usize> = (0..n).collect();
        for axis in 0..dims {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| {
                envelopes[a]
                    .min(axis)
                    .total_cmp(&envelopes[b].min(axis))
                    .then(envelopes[a].max(axis).total_cmp(&envelopes[b].max(axis)))
            });
            let (prefix, suffix) = cumulative_unions(envelopes, &order);
            let margin: f64 = (lo..=hi)
                .map(|k| prefix[k - 1].margin() + suffix[k].margin())
                .sum();
            if margin < best_margin {
                best_margin = margin;
                sorted = order;
            }
        }
        let (prefix, suffix) = cumulative_unions(envelopes, &sorted);
        let mut best_k = lo;
        let mut best_overlap = f64::INFINITY;
        let mut best_volume = f64::INFINITY;
        for k in lo..=hi {
            let overlap = prefix[k - 1].overlap(&suffix[k]);
            let volume = prefix[k - 1].volume() + suffix[k].volume();
            if overlap < best_overlap || (overlap == best_overlap && volume < best_volume) {
                best_k = k;
                best_overlap = overlap;
                best_volume = volume;
            }
        }
        sorted[best_k..].to_vec()
    }

    fn reinsert_pick(
        &self,
        node_envelope: &Envelope,
        envelopes: &[Envelope],
        min_children: usize,
        level_visited: bool,
    ) -> Vec<usize> {
        if level_visited {
            return Vec::new();
        }
        let n = envelopes.len();
        let count = (n * REINSERT_SHARE_PERCENT / 100)
            .max(1)
            .min(n.saturating_sub(min_children));
        if count == 0 {
            return Vec::new();
        }
        let center = node_envelope.center();
        let mut by_distance: Vec<usize> = (0..n).collect();
        // Farthest first.
        by_distance.sort_by(|&a, &b| {
            envelopes[b]
                .center()
                .distance(&center)
                .total_cmp(&envelopes[a].center().distance(&center))
        });
        by_distance.truncate(count);
        by_distance
    }
}

/// Hilbert R-tree balancing: entries are placed and split by their position
/// along a Hilbert curve laid over a fixed world envelope.
#[derive(Copy, Clone, Debug)]
pub struct HilbertSplit {
    world: Envelope,
    encoder: HilbertEncoder,
}

impl HilbertSplit {
    /// Curve resolution used by [`Self::new`].
    pub const DEFAULT_ORDER: u32 = 16;

    /// Create a policy whose curve spans `world`.
    ///
    /// # Errors
    ///
    /// [`IndexError::NonFiniteEnvelope`] when `world` is empty or has
    /// non-finite bounds.
    pub fn new(world: &Envelope) -> Result<Self, IndexError> {
        Self::with_order(world, Self::DEFAULT_ORDER)
    }

    /// Create a policy with an explicit curve order.
    ///
    /// # Errors
    ///
    /// As [`Self::new`], plus [`IndexError::InvalidOrder`] for an order the
    /// curve index cannot hold.
    pub fn with_order(world: &Envelope, order: u32) -> Result<Self, IndexError> {
        if !world.is_finite() || world.is_empty() {
            return Err(IndexError::NonFiniteEnvelope);
        }
        let encoder = HilbertEncoder::new(world.dims(), order)?;
        Ok(Self {
            world: *world,
            encoder,
        })
    }

    /// Curve index of the envelope's center, clamped into the world grid.
    fn code(&self, e: &Envelope) -> u128 {
        let center = e.center();
        let top_cell = (self.encoder.cells_per_axis() - 1) as f64;
        let mut scaled = Coordinate::new(0.0, 0.0);
        for axis in 0..self.encoder.dims() {
            let extent = self.world.extent(axis);
            let t = if extent > 0.0 {
                ((center.get(axis) - self.world.min(axis)) / extent).clamp(0.0, 1.0)
            } else {
                0.0
            };
            *scaled.get_mut(axis) = t * top_cell;
        }
        // Clamped into the grid above, so encoding cannot fail.
        self.encoder.encode(&scaled).unwrap_or_default()
    }
}

impl SplitStrategy for HilbertSplit {
    fn choose_subtree(&self, children: &[Envelope], target: &Envelope, _leaf_level: bool) -> usize {
        let t = self.code(target);
        let mut best = 0;
        let mut best_gap = u128::MAX;
        for (i, child) in children.iter().enumerate() {
            let gap = self.code(child).abs_diff(t);
            if gap < best_gap {
                best = i;
                best_gap = gap;
            }
        }
        best
    }

    fn split(&self, envelopes: &[Envelope], min_children: usize) -> Vec<usize> {
        let n = envelopes.len();
        debug_assert!(n >= 2, "split needs at least two envelopes");
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.code(&envelopes[i]));
        let k = if 2 * min_children <= n {
            (n / 2).clamp(min_children, n - min_children)
        } else {
            n / 2
        };
        order[k..].to_vec()
    }
}
