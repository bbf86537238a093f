//! 2-D and 3-D points.

use crate::common::*;
use std::ops::{Add, Index, IndexMut, Sub};
use super::vector::Vector3f;

/// A 3-D point with `Float` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3f {
    /// X-coordinate.
    pub x: Float,

    /// Y-coordinate.
    pub y: Float,

    /// Z-coordinate.
    pub z: Float,
}

impl Point3f {
    /// Create a new `Point3f`.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Returns the squared distance to another point.
    ///
    /// * `other` - The other point.
    pub fn distance_squared(&self, other: &Self) -> Float {
        (*self - *other).length_squared()
    }

    /// Returns the distance to another point.
    ///
    /// * `other` - The other point.
    pub fn distance(&self, other: &Self) -> Float {
        (*self - *other).length()
    }

    /// Returns the component-wise minimum with another point.
    ///
    /// * `other` - The other point.
    pub fn min(&self, other: &Self) -> Self {
        Self::new(
            min(self.x, other.x),
            min(self.y, other.y),
            min(self.z, other.z),
        )
    }

    /// Returns the component-wise maximum with another point.
    ///
    /// * `other` - The other point.
    pub fn max(&self, other: &Self) -> Self {
        Self::new(
            max(self.x, other.x),
            max(self.y, other.y),
            max(self.z, other.z),
        )
    }

    /// Returns `true` if any coordinate is NaN or infinite.
    pub fn has_nans(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite())
    }
}

impl Add<Vector3f> for Point3f {
    type Output = Self;

    fn add(self, v: Vector3f) -> Self {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3f {
    type Output = Vector3f;

    fn sub(self, other: Self) -> Vector3f {
        Vector3f::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Sub<Vector3f> for Point3f {
    type Output = Self;

    fn sub(self, v: Vector3f) -> Self {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl Index<Axis> for Point3f {
    type Output = Float;

    /// Index the point by axis.
    ///
    /// * `axis` - The axis.
    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for Point3f {
    /// Mutably index the point by axis.
    ///
    /// * `axis` - The axis.
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl Index<usize> for Point3f {
    type Output = Float;

    /// Index the point by dimension { 0 = X, 1 = Y, 2 = Z }.
    ///
    /// * `i` - The dimension.
    fn index(&self, i: usize) -> &Self::Output {
        &self[Axis::from(i)]
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Vector3f::new(p.x, p.y, p.z)
    }
}

/// A 2-D point with `Float` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2f {
    /// X-coordinate.
    pub x: Float,

    /// Y-coordinate.
    pub y: Float,
}

impl Point2f {
    /// Create a new `Point2f`.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub fn new(x: Float, y: Float) -> Self {
        Self { x, y }
    }
}
