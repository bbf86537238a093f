//! RGB spectrum.

use crate::common::*;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign};

/// Radiance/importance carried as an RGB triplet.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Spectrum {
    /// Red component.
    pub r: Float,

    /// Green component.
    pub g: Float,

    /// Blue component.
    pub b: Float,
}

impl Spectrum {
    /// Black.
    pub const ZERO: Self = Self { r: 0.0, g: 0.0, b: 0.0 };

    /// White.
    pub const ONE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };

    /// Create a new `Spectrum`.
    ///
    /// * `r` - Red component.
    /// * `g` - Green component.
    /// * `b` - Blue component.
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { r, g, b }
    }

    /// Create a `Spectrum` with all components equal.
    ///
    /// * `v` - The component value.
    pub fn splat(v: Float) -> Self {
        Self::new(v, v, v)
    }

    /// Returns `true` if all components are zero.
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// Returns `true` if all components are finite.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Returns the luminance (Rec. 709 weights).
    pub fn y(&self) -> Float {
        0.212671 * self.r + 0.715160 * self.g + 0.072169 * self.b
    }

    /// Returns the maximum component.
    pub fn max_component(&self) -> Float {
        max(self.r, max(self.g, self.b))
    }
}

impl Add for Spectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl AddAssign for Spectrum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul for Spectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl Mul<Float> for Spectrum {
    type Output = Self;

    fn mul(self, s: Float) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Spectrum> for Float {
    type Output = Spectrum;

    fn mul(self, s: Spectrum) -> Spectrum {
        s * self
    }
}

impl MulAssign for Spectrum {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl MulAssign<Float> for Spectrum {
    fn mul_assign(&mut self, s: Float) {
        *self = *self * s;
    }
}

impl Div<Float> for Spectrum {
    type Output = Self;

    fn div(self, s: Float) -> Self {
        debug_assert!(s != 0.0);
        let inv = 1.0 / s;
        self * inv
    }
}

impl Sum for Spectrum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |a, b| a + b)
    }
}
