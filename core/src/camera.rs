//! Cameras.

use crate::common::*;
use crate::geometry::*;
use std::sync::Arc;

/// The ray-generation / pixel-projection capability consumed by the
/// integrator. `we`/`pdf_we` describe the camera's importance emission and
/// are what the bidirectional weighting needs for `t = 1` strategies.
pub trait Camera: Send + Sync {
    /// Returns the primary ray for a pixel.
    ///
    /// * `x`      - Pixel x-coordinate.
    /// * `y`      - Pixel y-coordinate.
    /// * `jitter` - Sub-pixel offsets in `[0, 1)^2`.
    /// * `lens`   - Lens sample parameters.
    fn ray_from_pixel(&self, x: usize, y: usize, jitter: Point2f, lens: Point2f) -> Ray;

    /// Projects a ray leaving the camera position back onto the film and
    /// returns the pixel it lands on, or `None` if it falls outside.
    ///
    /// * `ray` - The ray (origin at the camera, direction into the scene).
    fn pixel_from_ray(&self, ray: &Ray) -> Option<(usize, usize)>;

    /// Returns the film area used to normalize importance.
    fn film_area(&self) -> Float;

    /// Map a uniform sample to a point on the aperture.
    ///
    /// * `u` - First sample dimension.
    /// * `v` - Second sample dimension.
    fn sample_aperture(&self, u: Float, v: Float) -> Point2f;

    /// Returns the importance emitted along the given camera ray.
    ///
    /// * `ray` - The ray.
    fn we(&self, ray: &Ray) -> Float;

    /// Returns the positional and directional pdfs of sampling the given
    /// camera ray.
    ///
    /// * `ray` - The ray.
    fn pdf_we(&self, ray: &Ray) -> (Float, Float);

    /// Returns the image resolution in pixels.
    fn resolution(&self) -> (usize, usize);
}

/// Atomic reference counted `Camera`.
pub type ArcCamera = Arc<dyn Camera>;
