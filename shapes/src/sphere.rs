//! Spheres.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::ArcMaterial;
use bidir_core::primitive::Primitive;
use std::sync::Arc;

/// A sphere described by its center and radius.
pub struct Sphere {
    /// Center.
    center: Point3f,

    /// Radius.
    radius: Float,

    /// Surface material.
    material: ArcMaterial,
}

impl Sphere {
    /// Create a new `Sphere`.
    ///
    /// * `center`   - Center.
    /// * `radius`   - Radius.
    /// * `material` - Surface material.
    pub fn new(center: Point3f, radius: Float, material: ArcMaterial) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }
}

impl Primitive for Sphere {
    fn world_bound(&self) -> Bounds3f {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        Bounds3f::new(self.center - r, self.center + r)
    }

    fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f> {
        self.world_bound().overlap(clip)
    }

    fn intersect(&self, ray: &Ray) -> Option<Float> {
        let oc = ray.o - self.center;
        let a = ray.d.length_squared();
        if a == 0.0 {
            return None;
        }
        let half_b = oc.dot(&ray.d);
        let c = oc.length_squared() - self.radius * self.radius;

        let disc = half_b * half_b - a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();

        // Nearest root in front of the origin.
        let t0 = (-half_b - sqrt_disc) / a;
        if t0 > 0.0 {
            return Some(t0);
        }
        let t1 = (-half_b + sqrt_disc) / a;
        (t1 > 0.0).then_some(t1)
    }

    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
        let t = self.intersect(ray)?;
        let p = ray.at(t);
        let n = Normal3f::from((p - self.center) / self.radius);

        // Spherical parametrization.
        let theta = clamp(n.z, -1.0, 1.0).acos();
        let phi = n.y.atan2(n.x);
        let phi = if phi < 0.0 { phi + TWO_PI } else { phi };

        Some(IntersectionInfo {
            p,
            ns: n,
            ng: n,
            dir: ray.d,
            uv: Point2f::new(phi / TWO_PI, theta / PI),
            material: Some(Arc::clone(&self.material)),
        })
    }
}
