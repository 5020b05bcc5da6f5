// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split policies for the M-tree.

/// How two pivot items are chosen when a node splits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum PromotePolicy {
    /// Promote the pair of entries with the greatest pairwise distance,
    /// which tends to minimize overlap between the two new regions.
    #[default]
    MaxDistance,
}

/// How the remaining entries are divided between the two pivots.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum PartitionPolicy {
    /// Each entry joins its nearer pivot, shifted only as needed to keep
    /// both groups at the capacity floor.
    #[default]
    GeneralizedHyperplane,
    /// Pivots take turns claiming their nearest unassigned entry, yielding
    /// equal-sized groups at the cost of larger radii.
    Balanced,
}
