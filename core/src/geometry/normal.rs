//! Surface normals.

use crate::common::*;
use std::ops::Neg;
use super::vector::Vector3f;

/// A surface normal. Kept distinct from `Vector3f` so shading-vs-geometric
/// normal bookkeeping stays visible in signatures.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Normal3f {
    /// X-component.
    pub x: Float,

    /// Y-component.
    pub y: Float,

    /// Z-component.
    pub z: Float,
}

impl Normal3f {
    /// Create a new `Normal3f`.
    ///
    /// * `x` - X-component.
    /// * `y` - Y-component.
    /// * `z` - Z-component.
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Returns the normalized normal.
    pub fn normalize(&self) -> Self {
        let v = Vector3f::from(*self).normalize();
        Self::new(v.x, v.y, v.z)
    }

    /// Returns the dot product with a vector.
    ///
    /// * `v` - The vector.
    pub fn dot(&self, v: &Vector3f) -> Float {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Returns the absolute value of the dot product with a vector.
    ///
    /// * `v` - The vector.
    pub fn abs_dot(&self, v: &Vector3f) -> Float {
        self.dot(v).abs()
    }

    /// Flip the normal so it lies in the same hemisphere as the given vector.
    ///
    /// * `v` - The vector.
    pub fn face_forward(&self, v: &Vector3f) -> Self {
        if self.dot(v) < 0.0 {
            -*self
        } else {
            *self
        }
    }
}

impl Neg for Normal3f {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<Vector3f> for Normal3f {
    fn from(v: Vector3f) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Normal3f> for Vector3f {
    fn from(n: Normal3f) -> Self {
        Vector3f::new(n.x, n.y, n.z)
    }
}
