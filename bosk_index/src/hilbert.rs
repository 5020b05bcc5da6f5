// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hilbert space-filling-curve encoding for 2D and 3D coordinates.

use bosk_geom::Coordinate;

use crate::error::IndexError;

/// Largest order whose 2D curve index fits in a `u128`.
pub const MAX_ORDER_2D: u32 = 63;
/// Largest order whose 3D curve index fits in a `u128`.
pub const MAX_ORDER_3D: u32 = 42;

/// Maps coordinates to their index along a Hilbert space-filling curve.
///
/// The curve covers a `2^order` by `2^order` (by `2^order` in 3D) grid of
/// unit cells; a coordinate is truncated to the cell containing it and the
/// cell's position along the curve is returned. Nearby coordinates receive
/// nearby curve indices far more often than not, which is the property the
/// Hilbert-packed R-tree leans on.
///
/// The curve is defined over non-negative cells. Negative domains are
/// supported through a per-axis offset applied before encoding; see
/// [`Self::with_offset`].
#[derive(Copy, Clone, Debug)]
pub struct HilbertEncoder {
    dims: usize,
    order: u32,
    offset: [f64; 3],
}

impl HilbertEncoder {
    /// Create an encoder for `dims`-dimensional coordinates with `order` bits
    /// per axis.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidDimension`] unless `dims` is 2 or 3, and
    /// [`IndexError::InvalidOrder`] when `order` is zero or the curve index
    /// would overflow `u128` ([`MAX_ORDER_2D`] / [`MAX_ORDER_3D`]).
    pub fn new(dims: usize, order: u32) -> Result<Self, IndexError> {
        let max = match dims {
            2 => MAX_ORDER_2D,
            3 => MAX_ORDER_3D,
            _ => return Err(IndexError::InvalidDimension(dims)),
        };
        if order == 0 || order > max {
            return Err(IndexError::InvalidOrder { order, dims, max });
        }
        Ok(Self {
            dims,
            order,
            offset: [0.0; 3],
        })
    }

    /// Shift every coordinate by `offset` before encoding.
    ///
    /// Choosing the offset as the negated lower corner of the data's bounding
    /// envelope moves a negative domain onto the curve's non-negative grid.
    #[must_use]
    pub fn with_offset(mut self, x: f64, y: f64, z: f64) -> Self {
        self.offset = [x, y, z];
        self
    }

    /// Dimensionality, 2 or 3.
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Bits per axis.
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Number of cells along each axis, `2^order`.
    pub const fn cells_per_axis(&self) -> u64 {
        1 << self.order
    }

    /// Curve index of the grid cell containing `c`.
    ///
    /// # Errors
    ///
    /// [`IndexError::NegativeCoordinate`] when a component is negative after
    /// the offset, and [`IndexError::CoordinateOutOfRange`] when a component
    /// falls outside the `2^order` grid.
    pub fn encode(&self, c: &Coordinate) -> Result<u128, IndexError> {
        let mut cells = [0_u64; 3];
        for (axis, cell) in cells.iter_mut().enumerate().take(self.dims) {
            let v = c.get(axis) + self.offset[axis];
            if v < 0.0 || v.is_nan() {
                return Err(IndexError::NegativeCoordinate(v));
            }
            if v >= self.cells_per_axis() as f64 {
                return Err(IndexError::CoordinateOutOfRange {
                    value: v,
                    order: self.order,
                });
            }
            #[expect(
                clippy::cast_possible_truncation,
                reason = "bounds checked against the cell grid above"
            )]
            {
                *cell = v as u64;
            }
        }
        if self.dims == 2 {
            Ok(xy_to_index(self.order, cells[0], cells[1]))
        } else {
            Ok(xyz_to_index(self.order, cells))
        }
    }
}

/// 2D cell to curve index.
///
/// The corner order is pinned at every resolution: (0,0) -> 0, (1,0) -> 1,
/// (1,1) -> 2, (0,1) -> 3. The lowest-level motif of the curve alternates
/// orientation with each extra order, so odd orders swap the axes on entry
/// to keep the corner order stable.
fn xy_to_index(order: u32, x: u64, y: u64) -> u128 {
    let (mut x, mut y) = if order % 2 == 1 { (y, x) } else { (x, y) };
    let mut d: u128 = 0;
    let mut s: u64 = 1 << (order - 1);
    while s > 0 {
        let rx = u64::from(x & s > 0);
        let ry = u64::from(y & s > 0);
        d += u128::from(s) * u128::from(s) * u128::from((3 * rx) ^ ry);
        // Rotate the quadrant so the sub-curve continues the traversal.
        // Wrapping keeps the low bits correct; the consumed high bits no
        // longer matter.
        if ry == 0 {
            if rx == 1 {
                x = (s - 1).wrapping_sub(x);
                y = (s - 1).wrapping_sub(y);
            }
            core::mem::swap(&mut x, &mut y);
        }
        s /= 2;
    }
    d
}

/// 3D cell to curve index, via Skilling's transpose-form algorithm
/// ("Programming the Hilbert curve", AIP Conf. Proc. 707, 2004).
fn xyz_to_index(order: u32, mut x: [u64; 3]) -> u128 {
    let m: u64 = 1 << (order - 1);
    // Inverse undo.
    let mut q = m;
    while q > 1 {
        let p = q - 1;
        for i in 0..3 {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q >>= 1;
    }
    // Gray encode.
    for i in 1..3 {
        x[i] ^= x[i - 1];
    }
    let mut t = 0;
    let mut q = m;
    while q > 1 {
        if x[2] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for axis in &mut x {
        *axis ^= t;
    }
    // Interleave the transposed bits, most significant first.
    let mut d: u128 = 0;
    for b in (0..order).rev() {
        for axis in &x {
            d = (d << 1) | u128::from((axis >> b) & 1);
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_order_is_stable_across_orders() {
        for order in 1..=6 {
            let enc = HilbertEncoder::new(2, order).unwrap();
            assert_eq!(enc.encode(&Coordinate::new(0.0, 0.0)).unwrap(), 0, "order {order}");
            assert_eq!(enc.encode(&Coordinate::new(1.0, 0.0)).unwrap(), 1, "order {order}");
            assert_eq!(enc.encode(&Coordinate::new(1.0, 1.0)).unwrap(), 2, "order {order}");
            assert_eq!(enc.encode(&Coordinate::new(0.0, 1.0)).unwrap(), 3, "order {order}");
        }
    }

    #[test]
    fn curve_visits_every_cell_once() {
        let order = 3;
        let enc = HilbertEncoder::new(2, order).unwrap();
        let n = 1_u64 << order;
        let mut seen = vec![false; usize::try_from(n * n).unwrap()];
        for x in 0..n {
            for y in 0..n {
                let d = enc.encode(&Coordinate::new(x as f64, y as f64)).unwrap();
                let d = usize::try_from(d).unwrap();
                assert!(d < seen.len(), "index {d} outside the grid");
                assert!(!seen[d], "cell ({x}, {y}) collides at {d}");
                seen[d] = true;
            }
        }
    }

    #[test]
    fn consecutive_indices_are_adjacent_cells() {
        let order = 4;
        let enc = HilbertEncoder::new(2, order).unwrap();
        let n = 1_u64 << order;
        let mut by_index = vec![(0_u64, 0_u64); usize::try_from(n * n).unwrap()];
        for x in 0..n {
            for y in 0..n {
                let d = enc.encode(&Coordinate::new(x as f64, y as f64)).unwrap();
                by_index[usize::try_from(d).unwrap()] = (x, y);
            }
        }
        for pair in by_index.windows(2) {
            let (ax, ay) = pair[0];
            let (bx, by) = pair[1];
            assert_eq!(ax.abs_diff(bx) + ay.abs_diff(by), 1, "curve jumps between cells");
        }
    }

    #[test]
    fn coordinates_truncate_to_cells() {
        let enc = HilbertEncoder::new(2, 4).unwrap();
        assert_eq!(
            enc.encode(&Coordinate::new(1.9, 0.2)).unwrap(),
            enc.encode(&Coordinate::new(1.0, 0.0)).unwrap()
        );
    }

    #[test]
    fn negative_components_are_rejected() {
        let enc = HilbertEncoder::new(2, 4).unwrap();
        assert_eq!(
            enc.encode(&Coordinate::new(-1.0, 2.0)),
            Err(IndexError::NegativeCoordinate(-1.0))
        );
    }

    #[test]
    fn offset_shifts_negative_domains_into_range() {
        let enc = HilbertEncoder::new(2, 4).unwrap().with_offset(8.0, 8.0, 0.0);
        let shifted = enc.encode(&Coordinate::new(-7.0, -8.0)).unwrap();
        let plain = HilbertEncoder::new(2, 4).unwrap();
        assert_eq!(shifted, plain.encode(&Coordinate::new(1.0, 0.0)).unwrap());
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        let enc = HilbertEncoder::new(2, 2).unwrap();
        assert_eq!(
            enc.encode(&Coordinate::new(4.0, 0.0)),
            Err(IndexError::CoordinateOutOfRange {
                value: 4.0,
                order: 2
            })
        );
    }

    #[test]
    fn construction_validates_dims_and_order() {
        assert!(matches!(
            HilbertEncoder::new(4, 8),
            Err(IndexError::InvalidDimension(4))
        ));
        assert!(matches!(
            HilbertEncoder::new(2, 0),
            Err(IndexError::InvalidOrder { order: 0, .. })
        ));
        assert!(matches!(
            HilbertEncoder::new(2, MAX_ORDER_2D + 1),
            Err(IndexError::InvalidOrder { .. })
        ));
        assert!(HilbertEncoder::new(2, MAX_ORDER_2D).is_ok());
        assert!(matches!(
            HilbertEncoder::new(3, MAX_ORDER_3D + 1),
            Err(IndexError::InvalidOrder { .. })
        ));
        assert!(HilbertEncoder::new(3, MAX_ORDER_3D).is_ok());
    }

    #[test]
    fn three_d_curve_covers_the_unit_cube() {
        let enc = HilbertEncoder::new(3, 1).unwrap();
        let mut seen = [false; 8];
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    let d = enc
                        .encode(&Coordinate::new_3d(x as f64, y as f64, z as f64))
                        .unwrap();
                    let d = usize::try_from(d).unwrap();
                    assert!(d < 8, "index {d} outside the cube");
                    assert!(!seen[d], "cell collides at {d}");
                    seen[d] = true;
                }
            }
        }
        assert_eq!(enc.encode(&Coordinate::new_3d(0.0, 0.0, 0.0)).unwrap(), 0);
    }

    #[test]
    fn three_d_consecutive_indices_are_adjacent_cells() {
        let order = 2;
        let enc = HilbertEncoder::new(3, order).unwrap();
        let n = 1_u64 << order;
        let mut by_index = vec![(0_u64, 0_u64, 0_u64); usize::try_from(n * n * n).unwrap()];
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let d = enc
                        .encode(&Coordinate::new_3d(x as f64, y as f64, z as f64))
                        .unwrap();
                    by_index[usize::try_from(d).unwrap()] = (x, y, z);
                }
            }
        }
        for pair in by_index.windows(2) {
            let (ax, ay, az) = pair[0];
            let (bx, by, bz) = pair[1];
            assert_eq!(
                ax.abs_diff(bx) + ay.abs_diff(by) + az.abs_diff(bz),
                1,
                "curve jumps between cells"
            );
        }
    }
}
