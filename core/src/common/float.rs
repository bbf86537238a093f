//! Float type and numeric constants.

use num_traits::Num;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Infinity (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// PI/2 (π/2)
pub const PI_OVER_TWO: Float = PI * 0.5;

/// PI/4 (π/4)
pub const PI_OVER_FOUR: Float = PI * 0.25;

/// Machine Epsilon
pub const MACHINE_EPSILON: Float = f32::EPSILON * 0.5;

/// Offset applied along the surface normal when spawning shadow/continuation
/// rays so they do not self-intersect their origin surface.
pub const SHADOW_EPSILON: Float = 0.0001;

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the given range.
///
/// * `x`   - The value.
/// * `lo`  - Lower bound.
/// * `hi`  - Upper bound.
#[inline(always)]
pub fn clamp<T>(x: T, lo: T, hi: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// Linearly interpolate between 2 values.
///
/// * `t` - Interpolation parameter.
/// * `a` - Value at `t = 0`.
/// * `b` - Value at `t = 1`.
#[inline(always)]
pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}
