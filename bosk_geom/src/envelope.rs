// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounding envelopes in 2D and 3D.

use core::fmt;

use crate::coord::Coordinate;

/// An axis-aligned minimum bounding box in two or three dimensions.
///
/// An envelope is an immutable value: every operation that "changes" one
/// returns a new envelope. The dimensionality is carried along so that
/// measure computations ([`Self::volume`], [`Self::margin`]) know whether the
/// Z axis participates; a 2D envelope stores a zero-width Z range, which lets
/// intersection and containment tests treat every envelope as three-axis
/// without special cases.
///
/// Per-axis the invariant `min <= max` holds, except for the distinguished
/// [`Self::empty`] sentinel (inverted infinite bounds) whose union with any
/// envelope is that envelope.
#[derive(Copy, Clone, PartialEq)]
pub struct Envelope {
    dims: usize,
    min: [f64; 3],
    max: [f64; 3],
}

impl Envelope {
    /// Create a 2D envelope. Corner coordinates may be given in any order.
    pub fn new_2d(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            dims: 2,
            min: [x0.min(x1), y0.min(y1), 0.0],
            max: [x0.max(x1), y0.max(y1), 0.0],
        }
    }

    /// Create a 3D envelope. Corner coordinates may be given in any order.
    pub fn new_3d(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> Self {
        Self {
            dims: 3,
            min: [x0.min(x1), y0.min(y1), z0.min(z1)],
            max: [x0.max(x1), y0.max(y1), z0.max(z1)],
        }
    }

    /// The degenerate envelope of a single coordinate.
    ///
    /// A coordinate with `z == 0.0` yields a 2D envelope, matching the
    /// zero-width-Z convention used throughout the workspace.
    pub fn point(c: &Coordinate) -> Self {
        let dims = if c.z == 0.0 { 2 } else { 3 };
        Self {
            dims,
            min: [c.x, c.y, c.z],
            max: [c.x, c.y, c.z],
        }
    }

    /// The envelope covering all of space in `dims` dimensions.
    ///
    /// # Panics
    ///
    /// Panics if `dims` is not 2 or 3.
    pub fn infinite(dims: usize) -> Self {
        assert!(dims == 2 || dims == 3, "envelope dims must be 2 or 3");
        let z = if dims == 3 { f64::INFINITY } else { 0.0 };
        Self {
            dims,
            min: [f64::NEG_INFINITY, f64::NEG_INFINITY, -z],
            max: [f64::INFINITY, f64::INFINITY, z],
        }
    }

    /// The empty sentinel: union identity, intersects nothing.
    ///
    /// # Panics
    ///
    /// Panics if `dims` is not 2 or 3.
    pub fn empty(dims: usize) -> Self {
        assert!(dims == 2 || dims == 3, "envelope dims must be 2 or 3");
        // The Z sentinel is inverted even in 2D so that a union with a 3D
        // envelope yields that envelope's Z range unchanged.
        Self {
            dims,
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Dimensionality, 2 or 3.
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Lower bound along `axis`.
    pub fn min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    /// Upper bound along `axis`.
    pub fn max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    /// Width along `axis`; zero for the empty sentinel.
    pub fn extent(&self, axis: usize) -> f64 {
        (self.max[axis] - self.min[axis]).max(0.0)
    }

    /// True when any participating axis is inverted (no content).
    pub fn is_empty(&self) -> bool {
        (0..self.dims).any(|a| self.max[a] < self.min[a])
    }

    /// True when every bound is a finite number.
    pub fn is_finite(&self) -> bool {
        (0..self.dims).all(|a| self.min[a].is_finite() && self.max[a].is_finite())
    }

    /// Center point of the envelope.
    pub fn center(&self) -> Coordinate {
        Coordinate {
            x: 0.5 * (self.min[0] + self.max[0]),
            y: 0.5 * (self.min[1] + self.max[1]),
            z: if self.dims == 3 {
                0.5 * (self.min[2] + self.max[2])
            } else {
                0.0
            },
        }
    }

    /// Area of the XY face.
    pub fn area(&self) -> f64 {
        self.extent(0) * self.extent(1)
    }

    /// Measure over the participating axes: area in 2D, volume in 3D.
    pub fn volume(&self) -> f64 {
        (0..self.dims).map(|a| self.extent(a)).product()
    }

    /// Sum of extents over the participating axes.
    pub fn margin(&self) -> f64 {
        (0..self.dims).map(|a| self.extent(a)).sum()
    }

    /// Smallest envelope containing both operands.
    ///
    /// The result takes the larger dimensionality of the two.
    pub fn union(&self, other: &Self) -> Self {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for a in 0..3 {
            min[a] = self.min[a].min(other.min[a]);
            max[a] = self.max[a].max(other.max[a]);
        }
        Self {
            dims: self.dims.max(other.dims),
            min,
            max,
        }
    }

    /// The (possibly empty) intersection of both operands.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for a in 0..3 {
            min[a] = self.min[a].max(other.min[a]);
            max[a] = self.max[a].min(other.max[a]);
        }
        Self {
            dims: self.dims.max(other.dims),
            min,
            max,
        }
    }

    /// Whether the envelopes share at least a boundary point.
    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|a| self.min[a] <= other.max[a] && other.min[a] <= self.max[a])
    }

    /// Whether `other` lies fully inside this envelope (boundaries count).
    pub fn contains_envelope(&self, other: &Self) -> bool {
        (0..3).all(|a| self.min[a] <= other.min[a] && other.max[a] <= self.max[a])
    }

    /// Whether the coordinate lies inside this envelope (boundaries count).
    pub fn contains_coordinate(&self, c: &Coordinate) -> bool {
        self.min[0] <= c.x
            && c.x <= self.max[0]
            && self.min[1] <= c.y
            && c.y <= self.max[1]
            && self.min[2] <= c.z
            && c.z <= self.max[2]
    }

    /// Shared measure of both operands (area in 2D, volume in 3D); zero when
    /// they do not overlap.
    pub fn overlap(&self, other: &Self) -> f64 {
        let isect = self.intersection(other);
        if isect.is_empty() { 0.0 } else { isect.volume() }
    }

    /// How much this envelope's measure grows when extended to cover `other`.
    pub fn enlargement(&self, other: &Self) -> f64 {
        self.union(other).volume() - self.volume()
    }

    /// Smallest distance from the coordinate to any point of the envelope;
    /// zero when the coordinate is inside.
    pub fn min_distance(&self, c: &Coordinate) -> f64 {
        let mut sum = 0.0;
        for a in 0..self.dims {
            let v = c.get(a);
            let d = if v < self.min[a] {
                self.min[a] - v
            } else if v > self.max[a] {
                v - self.max[a]
            } else {
                0.0
            };
            sum += d * d;
        }
        sum.sqrt()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dims == 2 {
            write!(
                f,
                "Envelope[{}..{}, {}..{}]",
                self.min[0], self.max[0], self.min[1], self.max[1]
            )
        } else {
            write!(
                f,
                "Envelope[{}..{}, {}..{}, {}..{}]",
                self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2]
            )
        }
    }
}
