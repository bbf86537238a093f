//! 3-D vectors.

use crate::common::*;
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub};

/// A 3-D vector with `Float` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3f {
    /// X-component.
    pub x: Float,

    /// Y-component.
    pub y: Float,

    /// Z-component.
    pub z: Float,
}

impl Vector3f {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new `Vector3f`.
    ///
    /// * `x` - X-component.
    /// * `y` - Y-component.
    /// * `z` - Z-component.
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }

    /// Returns the square of the vector's length.
    pub fn length_squared(&self) -> Float {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the vector's length.
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector pointing in the same direction.
    pub fn normalize(&self) -> Self {
        *self / self.length()
    }

    /// Returns the dot product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn dot(&self, other: &Self) -> Float {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the absolute value of the dot product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn abs_dot(&self, other: &Self) -> Float {
        self.dot(other).abs()
    }

    /// Returns the cross product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Returns `true` if any component is NaN or infinite.
    pub fn has_nans(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite())
    }
}

impl Add for Vector3f {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vector3f {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vector3f {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector3f {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Float> for Vector3f {
    type Output = Self;

    fn mul(self, s: Float) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vector3f> for Float {
    type Output = Vector3f;

    fn mul(self, v: Vector3f) -> Vector3f {
        v * self
    }
}

impl Div<Float> for Vector3f {
    type Output = Self;

    fn div(self, s: Float) -> Self {
        debug_assert!(s != 0.0);
        let inv = 1.0 / s;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl Index<Axis> for Vector3f {
    type Output = Float;

    /// Index the vector by axis.
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

impl Index<usize> for Vector3f {
    type Output = Float;

    /// Index the vector by dimension { 0 = X, 1 = Y, 2 = Z }.
    ///
    /// * `i` - The dimension.
    fn index(&self, i: usize) -> &Self::Output {
        &self[Axis::from(i)]
    }
}
