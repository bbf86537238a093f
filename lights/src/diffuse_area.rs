//! Diffuse area light.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::light::{Light, LightSample};
use bidir_core::material::{Material, ScatterComponent, ScatterSample};
use bidir_core::rng::Rng;
use bidir_core::sampling::*;
use bidir_core::spectrum::Spectrum;
use bidir_shapes::Quad;
use std::sync::Arc;

/// Placeholder material for the emitter's geometry; the light's surface
/// never scatters.
struct Emissive;

impl Material for Emissive {
    fn sample(&self, _: &IntersectionInfo, _: &mut Rng, _: bool) -> Option<ScatterSample> {
        None
    }
    fn brdf(&self, _: &IntersectionInfo, _: Vector3f, _: ScatterComponent) -> Spectrum {
        Spectrum::ZERO
    }
    fn pdf(&self, _: &IntersectionInfo, _: Vector3f, _: bool, _: ScatterComponent) -> Float {
        0.0
    }
}

/// A one-sided quad emitter with spatially uniform radiance and
/// cosine-weighted directional emission.
pub struct DiffuseAreaLight {
    /// The emitting surface.
    quad: Quad,

    /// Emitted radiance from the front side.
    radiance: Spectrum,
}

impl DiffuseAreaLight {
    /// Create a new `DiffuseAreaLight` over the parallelogram
    /// `corner + u*e1 + v*e2`. Emission leaves the side the right-hand-rule
    /// normal of `(e1, e2)` points toward.
    ///
    /// * `corner`   - Corner point.
    /// * `e1`       - First edge vector.
    /// * `e2`       - Second edge vector.
    /// * `radiance` - Emitted radiance.
    pub fn new(corner: Point3f, e1: Vector3f, e2: Vector3f, radiance: Spectrum) -> Self {
        Self {
            quad: Quad::new(corner, e1, e2, Arc::new(Emissive)),
            radiance,
        }
    }
}

impl Light for DiffuseAreaLight {
    fn sample_ray(&self, rng: &mut Rng) -> LightSample {
        let u = rng.uniform_2d();
        let p = self.quad.point_at(u.x, u.y);
        let n = self.quad.normal();

        let d = cosine_sample_hemisphere(&Vector3f::from(n), rng.uniform_2d());
        let o = p + Vector3f::from(n) * SHADOW_EPSILON;

        LightSample {
            ray: Ray::new(o, d),
            color: self.radiance,
            normal: n,
            area_pdf: 1.0 / self.quad.area(),
            angle_pdf: cosine_hemisphere_pdf(n.dot(&d)),
        }
    }

    fn intersect(&self, ray: &Ray) -> Option<Float> {
        self.quad.intersect_uv(ray).map(|(t, _)| t)
    }

    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
        let (t, uv) = self.quad.intersect_uv(ray)?;
        let n = self.quad.normal();
        Some(IntersectionInfo {
            p: ray.at(t),
            ns: n,
            ng: n,
            dir: ray.d,
            uv,
            // Light surfaces carry no scattering material.
            material: None,
        })
    }

    fn pdf(&self, _info: &IntersectionInfo, wo: Vector3f) -> Float {
        cosine_hemisphere_pdf(self.quad.normal().dot(&wo))
    }

    fn area(&self) -> Float {
        self.quad.area()
    }

    fn intensity(&self) -> Spectrum {
        self.radiance
    }
}
