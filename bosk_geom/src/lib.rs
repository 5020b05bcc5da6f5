// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bosk Geom: primitive types shared by the bosk index trees.
//!
//! This crate carries the small vocabulary every tree in the workspace
//! speaks:
//!
//! - [`Envelope`]: an axis-aligned bounding box in two or three dimensions,
//!   with the union/overlap/margin arithmetic rectangle trees are built on.
//! - [`Coordinate`]: a point value with per-axis accessors and exact
//!   floating-point equality.
//! - [`SpatialObject`]: the seam between the trees and whatever geometry
//!   model the caller uses; anything that can report a bounding envelope
//!   can be indexed.
//! - [`DistanceMetric`]: a pluggable metric-space distance for the M-tree,
//!   with [`EuclideanDistance`] as the stock implementation.
//!
//! All comparisons here use exact floating-point semantics. There is no
//! epsilon: two envelopes touch exactly when their bounds say they do, which
//! keeps tree behavior reproducible across runs.
//!
//! # Example
//!
//! ```rust
//! use bosk_geom::{Coordinate, Envelope};
//!
//! let a = Envelope::new_2d(0.0, 0.0, 10.0, 10.0);
//! let b = Envelope::new_2d(5.0, 5.0, 15.0, 15.0);
//! assert!(a.intersects(&b));
//! assert_eq!(a.union(&b), Envelope::new_2d(0.0, 0.0, 15.0, 15.0));
//! assert_eq!(a.overlap(&b), 25.0);
//! assert!(a.contains_coordinate(&Coordinate::new(3.0, 4.0)));
//! ```

pub mod coord;
pub mod distance;
pub mod envelope;
pub mod geometry;

pub use coord::Coordinate;
pub use distance::{DistanceMetric, EuclideanDistance};
pub use envelope::Envelope;
pub use geometry::SpatialObject;
