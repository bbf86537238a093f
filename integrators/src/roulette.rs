//! Adaptive roulette calibration.

use bidir_core::common::*;
use std::collections::VecDeque;

/// Smallest continuation probability the calibrator will suggest.
const MIN_CONTINUE: Float = 0.05;

/// Largest continuation probability the calibrator will suggest.
const MAX_CONTINUE: Float = 0.95;

/// Russian-roulette policy for path extension beyond the always-kept prefix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RouletteMode {
    /// Continue with a fixed probability per bounce.
    Fixed(Float),

    /// Continue with the per-pixel calibrated probability.
    Adaptive,
}

impl Default for RouletteMode {
    fn default() -> Self {
        Self::Fixed(0.7)
    }
}

/// A sliding window of recent per-pixel luminance estimates and the ray
/// counts spent obtaining them, used to estimate a variance-to-cost ratio.
/// One instance per pixel, shared across workers behind a mutex.
pub struct RouletteStats {
    /// Window capacity.
    capacity: usize,

    /// Most recent `(luminance, rays)` samples.
    window: VecDeque<(Float, u32)>,

    /// Running sum of luminances over the window.
    sum: Float,

    /// Running sum of squared luminances over the window.
    sum_sq: Float,

    /// Running sum of ray counts over the window.
    rays: u64,
}

impl RouletteStats {
    /// Create an empty `RouletteStats` window.
    ///
    /// * `capacity` - Number of most-recent samples retained.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
            sum: 0.0,
            sum_sq: 0.0,
            rays: 0,
        }
    }

    /// Record one pixel sample, evicting the oldest once the window is full.
    ///
    /// * `luminance` - The sample's luminance estimate.
    /// * `rays`      - Scene rays spent producing it.
    pub fn add_sample(&mut self, luminance: Float, rays: u32) {
        if self.window.len() == self.capacity {
            if let Some((lum, r)) = self.window.pop_front() {
                self.sum -= lum;
                self.sum_sq -= lum * lum;
                self.rays -= r as u64;
            }
        }
        self.window.push_back((luminance, rays));
        self.sum += luminance;
        self.sum_sq += luminance * luminance;
        self.rays += rays as u64;
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no samples yet.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Sample variance of the windowed luminances.
    pub fn variance(&self) -> Float {
        let n = self.window.len() as Float;
        if n < 2.0 {
            return 0.0;
        }
        let mean = self.sum / n;
        max(0.0, (self.sum_sq - n * mean * mean) / (n - 1.0))
    }

    /// Mean ray count per sample over the window.
    pub fn mean_rays(&self) -> Float {
        if self.window.is_empty() {
            0.0
        } else {
            self.rays as Float / self.window.len() as Float
        }
    }

    /// The calibrated continuation probability: pixels whose estimates are
    /// still noisy relative to their mean keep longer paths, converged
    /// pixels are cut short. Clamped so paths neither die instantly nor
    /// run forever.
    pub fn threshold(&self) -> Float {
        let n = self.window.len() as Float;
        if n < 2.0 {
            return MAX_CONTINUE;
        }
        let mean = self.sum / n;
        if mean <= 0.0 {
            return MIN_CONTINUE;
        }
        let rel_dev = self.variance().sqrt() / mean;
        clamp(rel_dev, MIN_CONTINUE, MAX_CONTINUE)
    }
}
