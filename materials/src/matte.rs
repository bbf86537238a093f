//! Matte material.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::*;
use bidir_core::rng::Rng;
use bidir_core::sampling::*;
use bidir_core::spectrum::Spectrum;

/// Lambertian diffuse reflection with cosine-weighted sampling.
pub struct Matte {
    /// Diffuse reflectance.
    reflectance: Spectrum,
}

impl Matte {
    /// Create a new `Matte` material.
    ///
    /// * `reflectance` - Diffuse reflectance.
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }

    /// Shading normal flipped toward the side the ray arrived on.
    ///
    /// * `info` - The surface interaction.
    fn oriented_normal(info: &IntersectionInfo) -> Normal3f {
        info.ns.face_forward(&-info.dir)
    }

    /// Whether `w` leaves the surface through the same hemisphere of both
    /// the shading and geometric normals. Directions that pass the shading
    /// normal but cross the geometric surface would leak light through
    /// geometry and are rejected.
    ///
    /// * `info` - The surface interaction.
    /// * `w`    - The outgoing direction.
    fn consistent_hemispheres(info: &IntersectionInfo, w: &Vector3f) -> bool {
        let incoming = -info.dir;
        let same_side_ns = info.ns.dot(w) * info.ns.dot(&incoming) > 0.0;
        let same_side_ng = info.ng.dot(w) * info.ng.dot(&incoming) > 0.0;
        same_side_ns && same_side_ng
    }
}

impl Material for Matte {
    fn sample(&self, info: &IntersectionInfo, rng: &mut Rng, adjoint: bool) -> Option<ScatterSample> {
        let n = Self::oriented_normal(info);
        let wo = cosine_sample_hemisphere(&Vector3f::from(n), rng.uniform_2d());
        if !Self::consistent_hemispheres(info, &wo) {
            return None;
        }

        let cos_out = n.abs_dot(&wo);
        let pdf = cosine_hemisphere_pdf(cos_out);
        if pdf <= 0.0 {
            return None;
        }
        let rpdf = cosine_hemisphere_pdf(n.abs_dot(&-info.dir));

        // Shading-normal transport asymmetry correction for importance
        // transport (Veach 5.19). Identity when ns == ng.
        let mut color = self.reflectance * INV_PI;
        if adjoint {
            let num = info.ns.abs_dot(&-info.dir) * info.ng.abs_dot(&wo);
            let den = info.ng.abs_dot(&-info.dir) * info.ns.abs_dot(&wo);
            if den > 0.0 {
                color *= num / den;
            }
        }

        Some(ScatterSample {
            color,
            ray: info.spawn_ray(wo),
            pdf,
            rpdf,
            specular: false,
            component: ScatterComponent::DIFFUSE,
        })
    }

    fn brdf(&self, info: &IntersectionInfo, wo: Vector3f, component: ScatterComponent) -> Spectrum {
        if !component.contains(ScatterComponent::DIFFUSE) {
            return Spectrum::ZERO;
        }
        if !Self::consistent_hemispheres(info, &wo) {
            return Spectrum::ZERO;
        }
        self.reflectance * INV_PI
    }

    fn pdf(&self, info: &IntersectionInfo, wo: Vector3f, _adjoint: bool, component: ScatterComponent) -> Float {
        if !component.contains(ScatterComponent::DIFFUSE) {
            return 0.0;
        }
        if !Self::consistent_hemispheres(info, &wo) {
            return 0.0;
        }
        let n = Self::oriented_normal(info);
        cosine_hemisphere_pdf(n.abs_dot(&wo))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use super::*;

    fn interaction() -> IntersectionInfo {
        IntersectionInfo {
            p: Point3f::new(0.0, 0.0, 0.0),
            ns: Normal3f::new(0.0, 1.0, 0.0),
            ng: Normal3f::new(0.0, 1.0, 0.0),
            dir: Vector3f::new(0.0, -1.0, 0.0),
            uv: Point2f::new(0.5, 0.5),
            material: None,
        }
    }

    #[test]
    fn samples_stay_above_surface() {
        let m = Matte::new(Spectrum::splat(0.8));
        let info = interaction();
        let mut rng = Rng::new(1);
        for _ in 0..500 {
            if let Some(s) = m.sample(&info, &mut rng, false) {
                assert!(info.ng.dot(&s.ray.d) > 0.0);
                assert!(!s.specular);
                assert!(s.pdf > 0.0);
            }
        }
    }

    #[test]
    fn pdf_matches_cosine_density() {
        let m = Matte::new(Spectrum::splat(0.5));
        let info = interaction();
        let w = Vector3f::new(0.0, 1.0, 0.0);
        let pdf = m.pdf(&info, w, false, ScatterComponent::DIFFUSE);
        assert!(approx_eq!(Float, pdf, INV_PI, epsilon = 1e-6));
    }

    #[test]
    fn rejects_below_surface_directions() {
        let m = Matte::new(Spectrum::splat(0.5));
        let info = interaction();
        let below = Vector3f::new(0.0, -1.0, 0.0);
        assert!(m.brdf(&info, below, ScatterComponent::DIFFUSE).is_black());
        assert_eq!(m.pdf(&info, below, false, ScatterComponent::DIFFUSE), 0.0);
    }

    #[test]
    fn rejects_light_leak_between_normals() {
        let m = Matte::new(Spectrum::splat(0.5));
        let mut info = interaction();
        // Shading normal tilted so a grazing direction sits above ns but
        // below ng.
        info.ns = Normal3f::new(0.8, 0.6, 0.0).normalize();
        let leak = Vector3f::new(0.9, -0.1, 0.0).normalize();
        assert!(info.ns.dot(&leak) > 0.0 && info.ng.dot(&leak) < 0.0);
        assert!(m.brdf(&info, leak, ScatterComponent::DIFFUSE).is_black());
    }
}
