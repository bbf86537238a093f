//! Rays.

use crate::common::*;
use super::point::Point3f;
use super::vector::Vector3f;

/// A ray with an origin and a direction. Immutable value type; callers
/// normalize the direction contextually.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,
}

impl Ray {
    /// Create a new `Ray`.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Self { o, d }
    }

    /// Returns the point at parametric distance `t` along the ray.
    ///
    /// * `t` - Parametric distance.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}
