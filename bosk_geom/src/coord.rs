// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point coordinates with per-axis access.

use core::fmt;

/// A point in 2D or 3D space.
///
/// A 2D coordinate is a 3D coordinate with `z == 0.0`; the trees treat an
/// unused Z axis as zero-width throughout. Equality is exact floating-point
/// equality, which is what the index trees rely on for duplicate detection
/// and removal.
#[derive(Copy, Clone, PartialEq)]
pub struct Coordinate {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component; `0.0` for 2D coordinates.
    pub z: f64,
}

impl Coordinate {
    /// Create a 2D coordinate (`z = 0.0`).
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Create a 3D coordinate.
    pub const fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    pub fn get(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("coordinate axis out of range: {axis}"),
        }
    }

    /// Mutable component along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    pub fn get_mut(&mut self, axis: usize) -> &mut f64 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("coordinate axis out of range: {axis}"),
        }
    }

    /// Euclidean distance to another coordinate.
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.z == 0.0 {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "({}, {}, {})", self.x, self.y, self.z)
        }
    }
}
