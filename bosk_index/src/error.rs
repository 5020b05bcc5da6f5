// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the index trees.

use thiserror::Error;

/// Errors reported by tree constructors and mutating operations.
///
/// Construction errors ([`Self::InvalidCapacity`], [`Self::InvalidDimension`],
/// [`Self::InvalidOrder`]) reject a bad configuration before any tree exists.
/// Insertion errors reject a bad argument before the tree is touched; a
/// failed insert never leaves a tree half-modified.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum IndexError {
    /// Node capacity bounds must satisfy `1 <= min < max`.
    #[error("invalid node capacity: min {min}, max {max} (need 1 <= min < max)")]
    InvalidCapacity {
        /// Requested minimum number of children per node.
        min: usize,
        /// Requested maximum number of children per node.
        max: usize,
    },
    /// Trees index 2D or 3D data only.
    #[error("invalid dimension {0} (must be 2 or 3)")]
    InvalidDimension(usize),
    /// Hilbert curve order outside the range the index type can hold.
    #[error("invalid hilbert curve order {order} for {dims}D (must be 1..={max})")]
    InvalidOrder {
        /// Requested bits per axis.
        order: u32,
        /// Dimensionality of the encoder.
        dims: usize,
        /// Largest order the index type supports at this dimensionality.
        max: u32,
    },
    /// The Hilbert curve is defined over non-negative cells; shift negative
    /// domains into range with an offset.
    #[error("coordinate component {0} is negative; apply an offset to encode it")]
    NegativeCoordinate(f64),
    /// A coordinate component does not fit in the encoder's grid.
    #[error("coordinate component {value} exceeds the 2^{order} cell grid")]
    CoordinateOutOfRange {
        /// Offending component after the offset was applied.
        value: f64,
        /// Bits per axis of the encoder.
        order: u32,
    },
    /// The coordinate is already present; k-d tree entries are unique.
    #[error("coordinate is already present in the tree")]
    DuplicateCoordinate,
    /// NaN or infinite bounds cannot be indexed.
    #[error("geometry envelope has NaN or infinite bounds")]
    NonFiniteEnvelope,
}
