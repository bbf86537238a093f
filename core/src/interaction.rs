//! Ray/surface intersections.

use crate::common::*;
use crate::geometry::*;
use crate::material::ArcMaterial;

/// The resolved result of a ray/surface hit. Created fresh per intersection
/// and owned by the caller.
#[derive(Clone)]
pub struct IntersectionInfo {
    /// World-space hit position.
    pub p: Point3f,

    /// Shading normal.
    pub ns: Normal3f,

    /// Geometric normal. May differ from `ns`; BRDF evaluation uses both to
    /// reject light-leak configurations where they disagree in sign relative
    /// to the ray.
    pub ng: Normal3f,

    /// Direction of the incoming ray (pointing toward the surface).
    pub dir: Vector3f,

    /// 2-D surface parametrization at the hit.
    pub uv: Point2f,

    /// Material at the interaction, if any (light surfaces carry none).
    pub material: Option<ArcMaterial>,
}

impl IntersectionInfo {
    /// Spawn a ray leaving the surface in the given direction, offset along
    /// the geometric normal to avoid self-intersection.
    ///
    /// * `d` - The outgoing direction.
    pub fn spawn_ray(&self, d: Vector3f) -> Ray {
        let sign = if self.ng.dot(&d) < 0.0 { -1.0 } else { 1.0 };
        let o = self.p + Vector3f::from(self.ng) * (sign * SHADOW_EPSILON);
        Ray::new(o, d)
    }
}
