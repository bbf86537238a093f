//! Lights.

use crate::common::*;
use crate::geometry::*;
use crate::interaction::IntersectionInfo;
use crate::rng::Rng;
use crate::spectrum::Spectrum;
use std::sync::Arc;

/// An emitted-ray sample drawn from a light.
#[derive(Clone)]
pub struct LightSample {
    /// The emitted ray, leaving the light surface.
    pub ray: Ray,

    /// Emitted radiance along the ray.
    pub color: Spectrum,

    /// Surface normal at the ray origin.
    pub normal: Normal3f,

    /// Pdf of the ray origin with respect to surface area on the light.
    pub area_pdf: Float,

    /// Pdf of the ray direction with respect to solid angle.
    pub angle_pdf: Float,
}

/// A light source with geometric presence in the scene.
pub trait Light: Send + Sync {
    /// Sample a ray leaving the light.
    ///
    /// * `rng` - Random source.
    fn sample_ray(&self, rng: &mut Rng) -> LightSample;

    /// Returns the parametric distance of the nearest intersection with the
    /// light's geometry, or `None`.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<Float>;

    /// Resolves the intersection along the ray into surface detail, or
    /// `None` if the ray misses.
    ///
    /// * `ray` - The ray.
    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo>;

    /// Returns the solid-angle pdf of emitting toward `wo` from the given
    /// point on the light.
    ///
    /// * `info` - The interaction on the light surface.
    /// * `wo`   - The emission direction.
    fn pdf(&self, info: &IntersectionInfo, wo: Vector3f) -> Float;

    /// Returns the surface area of the light's geometry.
    fn area(&self) -> Float;

    /// Returns the emitted radiance (front side).
    fn intensity(&self) -> Spectrum;
}

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light>;
