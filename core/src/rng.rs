//! Random Number Generator.

use crate::common::*;
use crate::geometry::Point2f;

/// 1 - epsilon in the precision used for `Float`.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1"); // 0.99999994

const PCG32_DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;
const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;

/// PCG-32 pseudo-random number generator.
#[derive(Clone)]
pub struct Rng {
    state: u64,
    inc: u64,
}

impl Default for Rng {
    /// Return a new `Rng` with the default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl Rng {
    /// Create a new `Rng` seeded with the given sequence index. Distinct
    /// indices yield statistically independent streams.
    ///
    /// * `sequence_index` - The sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut rng = Self { state: 0, inc: 0 };
        rng.inc = sequence_index.wrapping_shl(1) | 1;
        let _ = rng.uniform_u32();
        rng.state = rng.state.wrapping_add(PCG32_DEFAULT_STATE);
        let _ = rng.uniform_u32();
        rng
    }

    /// Returns a uniformly distributed `u32`.
    #[inline(always)]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed `Float` in `[0, 1)`.
    pub fn uniform_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32"),
            ONE_MINUS_EPSILON,
        )
    }

    /// Returns 2 independent uniform `Float`s in `[0, 1)` as a point.
    pub fn uniform_2d(&mut self) -> Point2f {
        Point2f::new(self.uniform_float(), self.uniform_float())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_float_stays_in_unit_interval() {
        let mut rng = Rng::new(7);
        for _ in 0..10_000 {
            let u = rng.uniform_float();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn sequences_are_reproducible() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }
}
