// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pluggable metric-space distances.

use crate::coord::Coordinate;

/// A distance function over values of type `T`.
///
/// Implementations must satisfy the metric-space axioms: non-negativity,
/// `d(a, a) == 0`, symmetry, and the triangle inequality. The M-tree's
/// pruning is only correct when the triangle inequality holds; a
/// non-metric "distance" will silently drop results.
///
/// Any `Fn(&T, &T) -> f64` closure is a metric via the blanket impl, so
/// callers can pass a plain function where no state is needed.
pub trait DistanceMetric<T: ?Sized> {
    /// Distance between `a` and `b`.
    fn distance(&self, a: &T, b: &T) -> f64;
}

impl<T: ?Sized, F> DistanceMetric<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    fn distance(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// Straight-line distance between coordinates.
#[derive(Copy, Clone, Debug, Default)]
pub struct EuclideanDistance;

impl DistanceMetric<Coordinate> for EuclideanDistance {
    fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        a.distance(b)
    }
}
