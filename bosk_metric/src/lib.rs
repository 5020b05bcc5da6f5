// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bosk Metric: similarity indexing over arbitrary metric spaces.
//!
//! An [`MTree`] stores items of any `Clone + PartialEq` type under a
//! [`DistanceMetric`](bosk_geom::DistanceMetric) and answers
//! nearest-neighbor queries by expanding subtrees in ascending order of
//! their distance lower bounds. Unlike the rectangle trees in
//! `bosk_index`, no coordinates are required: only the metric.
//!
//! # Example
//!
//! ```rust
//! use bosk_geom::{Coordinate, EuclideanDistance};
//! use bosk_metric::MTree;
//!
//! # fn main() -> Result<(), bosk_metric::MetricError> {
//! let mut tree = MTree::new(2, 8, EuclideanDistance)?;
//! tree.insert_all((0..50).map(|i| Coordinate::new(f64::from(i), 0.0)))?;
//!
//! let target = Coordinate::new(20.3, 0.0);
//! let (nearest, d) = tree.search(&target).next().unwrap();
//! assert_eq!(*nearest, Coordinate::new(20.0, 0.0));
//! assert!((d - 0.3).abs() < 1e-9);
//!
//! // Bounds compose: at most three items, all within distance 5.
//! let close: Vec<_> = tree.search(&target).within(5.0).limit(3).collect();
//! assert_eq!(close.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod policy;
pub mod search;
pub mod tree;

pub use error::MetricError;
pub use policy::{PartitionPolicy, PromotePolicy};
pub use search::{MIter, MSearch};
pub use tree::MTree;
