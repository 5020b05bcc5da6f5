// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for the M-tree.

use thiserror::Error;

/// Errors reported by M-tree construction and mutation.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum MetricError {
    /// Node capacity bounds must satisfy `1 <= min < max`.
    #[error("invalid node capacity: min {min}, max {max} (need 1 <= min < max)")]
    InvalidCapacity {
        /// Requested minimum number of entries per node.
        min: usize,
        /// Requested maximum number of entries per node.
        max: usize,
    },
    /// The item is already present; M-tree entries are unique.
    #[error("item is already present in the tree")]
    DuplicateItem,
}
