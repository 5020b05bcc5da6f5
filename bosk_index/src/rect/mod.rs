// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle trees: one engine, three balancing policies.
//!
//! [`RectTree`] owns all structure (arena nodes, envelopes, parent links)
//! and delegates every placement decision to its [`SplitStrategy`].
//! [`RTree`], [`RStarTree`], and [`HilbertRTree`] are the three stock
//! instantiations.

mod node;
mod tree;

pub mod strategy;

pub use strategy::{HilbertSplit, QuadraticSplit, RStarSplit, SplitStrategy};
pub use tree::{HilbertRTree, RStarTree, RTree, RectTree, Search};
