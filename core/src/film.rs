//! Film / pixel estimator.

use crate::common::*;
use crate::spectrum::Spectrum;
use std::path::Path;

/// A fixed-size buffer of accumulated pixel radiance. Contributions are
/// summed; callers scale by their own sample counts when reading the image
/// out. A single malformed Monte-Carlo sample must never corrupt a running
/// pixel average, so non-finite contributions are dropped at this boundary.
#[derive(Clone)]
pub struct Film {
    /// Image width in pixels.
    width: usize,

    /// Image height in pixels.
    height: usize,

    /// Per-pixel radiance sums.
    pixels: Vec<Spectrum>,
}

impl Film {
    /// Create a new black `Film`.
    ///
    /// * `width`  - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Spectrum::ZERO; width * height],
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Accumulate a contribution into a pixel. Out-of-bounds coordinates and
    /// non-finite colors are dropped.
    ///
    /// * `x`     - Pixel x-coordinate.
    /// * `y`     - Pixel y-coordinate.
    /// * `color` - The contribution.
    pub fn add_color(&mut self, x: usize, y: usize, color: Spectrum) {
        if x >= self.width || y >= self.height {
            return;
        }
        if !color.is_finite() {
            debug!("Dropping non-finite sample at ({x}, {y})");
            return;
        }
        self.pixels[y * self.width + x] += color;
    }

    /// Returns the accumulated sum at a pixel.
    ///
    /// * `x` - Pixel x-coordinate.
    /// * `y` - Pixel y-coordinate.
    pub fn pixel(&self, x: usize, y: usize) -> Spectrum {
        self.pixels[y * self.width + x]
    }

    /// Add another film's sums into this one. Both films must share
    /// dimensions.
    ///
    /// * `other` - The film to merge in.
    pub fn merge(&mut self, other: &Film) {
        debug_assert!(self.width == other.width && self.height == other.height);
        for (dst, src) in self.pixels.iter_mut().zip(other.pixels.iter()) {
            *dst += *src;
        }
    }

    /// Reset all pixels to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Spectrum::ZERO);
    }

    /// Returns a tone-mapped 8-bit RGB snapshot, scaling sums by `scale`
    /// (typically 1 / merged frame count) and applying gamma 2.2.
    ///
    /// * `scale` - Factor applied to each pixel sum.
    pub fn to_rgb8(&self, scale: Float) -> Vec<u8> {
        let inv_gamma = 1.0 / 2.2;
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            let c = *px * scale;
            for v in [c.r, c.g, c.b] {
                let v = clamp(v, 0.0, 1.0).powf(inv_gamma);
                out.push((v * 255.0 + 0.5) as u8);
            }
        }
        out
    }

    /// Write the film as a PNG.
    ///
    /// * `path`  - Output path.
    /// * `scale` - Factor applied to each pixel sum.
    pub fn write_png<P: AsRef<Path>>(&self, path: P, scale: Float) -> image::ImageResult<()> {
        let rgb = self.to_rgb8(scale);
        let img = image::RgbImage::from_raw(self.width as u32, self.height as u32, rgb)
            .expect("film buffer size mismatch");
        img.save(path)
    }
}
