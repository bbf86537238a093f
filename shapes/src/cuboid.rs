//! Axis-aligned boxes.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::ArcMaterial;
use bidir_core::primitive::Primitive;
use std::sync::Arc;

/// An axis-aligned box primitive.
pub struct Cuboid {
    /// The box extent.
    bounds: Bounds3f,

    /// Surface material.
    material: ArcMaterial,
}

impl Cuboid {
    /// Create a new `Cuboid`.
    ///
    /// * `bounds`   - The box extent.
    /// * `material` - Surface material.
    pub fn new(bounds: Bounds3f, material: ArcMaterial) -> Self {
        Self { bounds, material }
    }

    /// Returns the outward normal at a point on the box surface, derived
    /// from the face the point is nearest to.
    ///
    /// * `p` - The surface point.
    fn normal_at(&self, p: &Point3f) -> Normal3f {
        let mut best_axis = Axis::X;
        let mut best_dist = INFINITY;
        let mut sign = 1.0;
        for axis in Axis::all() {
            let d_min = (p[axis] - self.bounds.p_min[axis]).abs();
            let d_max = (p[axis] - self.bounds.p_max[axis]).abs();
            if d_min < best_dist {
                best_dist = d_min;
                best_axis = axis;
                sign = -1.0;
            }
            if d_max < best_dist {
                best_dist = d_max;
                best_axis = axis;
                sign = 1.0;
            }
        }
        let mut n = Vector3f::ZERO;
        match best_axis {
            Axis::X => n.x = sign,
            Axis::Y => n.y = sign,
            Axis::Z => n.z = sign,
        }
        Normal3f::from(n)
    }
}

impl Primitive for Cuboid {
    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f> {
        self.bounds.overlap(clip)
    }

    fn intersect(&self, ray: &Ray) -> Option<Float> {
        let (t_near, t_far) = self.bounds.intersect(ray, 0.0, INFINITY)?;
        if t_near > 0.0 {
            Some(t_near)
        } else if t_far > 0.0 {
            Some(t_far)
        } else {
            None
        }
    }

    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
        let t = self.intersect(ray)?;
        let p = ray.at(t);
        let n = self.normal_at(&p);
        Some(IntersectionInfo {
            p,
            ns: n,
            ng: n,
            dir: ray.d,
            uv: Point2f::default(),
            material: Some(Arc::clone(&self.material)),
        })
    }
}
