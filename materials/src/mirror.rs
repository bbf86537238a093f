//! Mirror material.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::*;
use bidir_core::rng::Rng;
use bidir_core::spectrum::Spectrum;

/// Perfect specular reflection. The outgoing direction is deterministic, so
/// samples are flagged specular and connection-time evaluation is zero (a
/// Dirac lobe cannot be hit by sampling the other sub-path).
pub struct Mirror {
    /// Reflection tint.
    tint: Spectrum,
}

impl Mirror {
    /// Create a new `Mirror` material.
    ///
    /// * `tint` - Reflection tint.
    pub fn new(tint: Spectrum) -> Self {
        Self { tint }
    }
}

impl Material for Mirror {
    fn sample(&self, info: &IntersectionInfo, _rng: &mut Rng, _adjoint: bool) -> Option<ScatterSample> {
        let n = info.ns.face_forward(&-info.dir);
        let nv = Vector3f::from(n);
        let cos_in = -info.dir.dot(&nv);
        if cos_in <= 0.0 {
            return None;
        }
        let wo = info.dir + nv * (2.0 * cos_in);

        // Cancel the cosine the walker multiplies in, so throughput picks
        // up exactly the tint.
        let cos_out = n.abs_dot(&wo);
        if cos_out <= 0.0 {
            return None;
        }

        Some(ScatterSample {
            color: self.tint / cos_out,
            ray: info.spawn_ray(wo),
            pdf: 1.0,
            rpdf: 1.0,
            specular: true,
            component: ScatterComponent::SPECULAR,
        })
    }

    fn brdf(&self, _info: &IntersectionInfo, _wo: Vector3f, _component: ScatterComponent) -> Spectrum {
        Spectrum::ZERO
    }

    fn pdf(&self, _info: &IntersectionInfo, _wo: Vector3f, _adjoint: bool, _component: ScatterComponent) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use super::*;

    #[test]
    fn reflects_about_the_normal() {
        let m = Mirror::new(Spectrum::ONE);
        let info = IntersectionInfo {
            p: Point3f::new(0.0, 0.0, 0.0),
            ns: Normal3f::new(0.0, 1.0, 0.0),
            ng: Normal3f::new(0.0, 1.0, 0.0),
            dir: Vector3f::new(1.0, -1.0, 0.0).normalize(),
            uv: Point2f::new(0.0, 0.0),
            material: None,
        };
        let mut rng = Rng::new(1);
        let s = m.sample(&info, &mut rng, false).unwrap();
        let expected = Vector3f::new(1.0, 1.0, 0.0).normalize();
        assert!(approx_eq!(Float, s.ray.d.dot(&expected), 1.0, epsilon = 1e-5));
        assert!(s.specular);
        assert_eq!(s.component, ScatterComponent::SPECULAR);
    }

    #[test]
    fn never_evaluates_at_connections() {
        let m = Mirror::new(Spectrum::ONE);
        let info = IntersectionInfo {
            p: Point3f::new(0.0, 0.0, 0.0),
            ns: Normal3f::new(0.0, 1.0, 0.0),
            ng: Normal3f::new(0.0, 1.0, 0.0),
            dir: Vector3f::new(0.0, -1.0, 0.0),
            uv: Point2f::new(0.0, 0.0),
            material: None,
        };
        let w = Vector3f::new(0.0, 1.0, 0.0);
        assert!(m.brdf(&info, w, ScatterComponent::SPECULAR).is_black());
        assert_eq!(m.pdf(&info, w, false, ScatterComponent::SPECULAR), 0.0);
    }
}
