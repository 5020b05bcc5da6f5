// Copyright 2026 the Bosk Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between index trees and caller geometry.

use crate::coord::Coordinate;
use crate::envelope::Envelope;

/// Anything with a bounding envelope.
///
/// The rectangle trees never look inside the objects they store; they
/// consume them purely as opaque values with a bounding [`Envelope`] and an
/// equality contract. Implement this for your geometry model to index it.
pub trait SpatialObject {
    /// The axis-aligned minimum bounding envelope of this object.
    fn envelope(&self) -> Envelope;
}

impl SpatialObject for Coordinate {
    fn envelope(&self) -> Envelope {
        Envelope::point(self)
    }
}

impl SpatialObject for Envelope {
    fn envelope(&self) -> Envelope {
        *self
    }
}

impl<T: SpatialObject> SpatialObject for &T {
    fn envelope(&self) -> Envelope {
        (*self).envelope()
    }
}
