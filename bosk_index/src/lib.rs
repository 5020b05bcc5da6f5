// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bosk Index: in-memory spatial index trees.
//!
//! Four index families over the [`bosk_geom`] vocabulary:
//!
//! - [`RectTree`]: a rectangle tree engine generic over its balancing
//!   policy, instantiated as the classic [`RTree`] (quadratic split), the
//!   [`RStarTree`] (forced reinsertion, margin-driven splits), and the
//!   [`HilbertRTree`] (curve-ordered placement over a fixed world).
//! - [`KdTree`]: a point k-d tree with cached subtree regions, range
//!   search, and branch-and-bound nearest-neighbor lookup.
//! - [`QuadTree`]: a region quad-tree over a fixed bound, with an overflow
//!   list keeping out-of-bounds insertion total.
//! - [`HilbertEncoder`]: the space-filling-curve codec behind the Hilbert
//!   R-tree, usable on its own.
//!
//! All trees are single-threaded values: wrap them in a lock to share them,
//! and do not mutate a tree while one of its lazy search iterators is
//! alive (the borrow checker enforces this).
//!
//! # Example
//!
//! ```rust
//! use bosk_geom::{Coordinate, Envelope};
//! use bosk_index::RStarTree;
//!
//! # fn main() -> Result<(), bosk_index::IndexError> {
//! let mut tree = RStarTree::new(4, 16)?;
//! tree.insert_all((0..100).map(|i| Coordinate::new(f64::from(i), f64::from(i % 10))))?;
//! let nearby = tree
//!     .search(&Envelope::new_2d(0.0, 0.0, 5.0, 5.0))
//!     .count();
//! assert!(nearby > 0);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hilbert;
pub mod kdtree;
pub mod quadtree;
pub mod rect;

pub use error::IndexError;
pub use hilbert::HilbertEncoder;
pub use kdtree::KdTree;
pub use quadtree::QuadTree;
pub use rect::{
    HilbertRTree, HilbertSplit, QuadraticSplit, RStarSplit, RStarTree, RTree, RectTree,
    SplitStrategy,
};
