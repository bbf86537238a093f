//! Quads.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::ArcMaterial;
use bidir_core::primitive::Primitive;
use std::sync::Arc;

/// A parallelogram described by a corner and 2 edge vectors. The geometric
/// normal follows the right-hand rule over `(e1, e2)`.
pub struct Quad {
    /// Corner point.
    corner: Point3f,

    /// First edge vector.
    e1: Vector3f,

    /// Second edge vector.
    e2: Vector3f,

    /// Unit normal.
    normal: Normal3f,

    /// Surface material.
    material: ArcMaterial,
}

impl Quad {
    /// Create a new `Quad`.
    ///
    /// * `corner`   - Corner point.
    /// * `e1`       - First edge vector.
    /// * `e2`       - Second edge vector.
    /// * `material` - Surface material.
    pub fn new(corner: Point3f, e1: Vector3f, e2: Vector3f, material: ArcMaterial) -> Self {
        Self {
            corner,
            e1,
            e2,
            normal: Normal3f::from(e1.cross(&e2).normalize()),
            material,
        }
    }

    /// Returns the quad's area.
    pub fn area(&self) -> Float {
        self.e1.cross(&self.e2).length()
    }

    /// Returns the unit normal.
    pub fn normal(&self) -> Normal3f {
        self.normal
    }

    /// Intersect returning the parametric distance and the `(u, v)` surface
    /// coordinates, or `None`.
    ///
    /// * `ray` - The ray.
    pub fn intersect_uv(&self, ray: &Ray) -> Option<(Float, Point2f)> {
        let n = Vector3f::from(self.normal);
        let denom = n.dot(&ray.d);
        if denom.abs() < 1e-9 {
            return None;
        }
        let t = n.dot(&(self.corner - ray.o)) / denom;
        if t <= 0.0 {
            return None;
        }

        // Solve the 2x2 system projecting the hit onto the edge basis.
        let rel = ray.at(t) - self.corner;
        let e1e1 = self.e1.length_squared();
        let e2e2 = self.e2.length_squared();
        let e1e2 = self.e1.dot(&self.e2);
        let det = e1e1 * e2e2 - e1e2 * e1e2;
        if det.abs() < 1e-12 {
            return None;
        }
        let b1 = rel.dot(&self.e1);
        let b2 = rel.dot(&self.e2);
        let u = (b1 * e2e2 - b2 * e1e2) / det;
        let v = (b2 * e1e1 - b1 * e1e2) / det;

        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some((t, Point2f::new(u, v)))
    }

    /// Returns the world point at surface coordinates `(u, v)`.
    ///
    /// * `u` - First coordinate in `[0, 1]`.
    /// * `v` - Second coordinate in `[0, 1]`.
    pub fn point_at(&self, u: Float, v: Float) -> Point3f {
        self.corner + self.e1 * u + self.e2 * v
    }
}

impl Primitive for Quad {
    fn world_bound(&self) -> Bounds3f {
        Bounds3f::from_point(self.corner)
            .union_point(&(self.corner + self.e1))
            .union_point(&(self.corner + self.e2))
            .union_point(&(self.corner + self.e1 + self.e2))
    }

    fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f> {
        self.world_bound().overlap(clip)
    }

    fn intersect(&self, ray: &Ray) -> Option<Float> {
        self.intersect_uv(ray).map(|(t, _)| t)
    }

    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
        let (t, uv) = self.intersect_uv(ray)?;
        Some(IntersectionInfo {
            p: ray.at(t),
            ns: self.normal,
            ng: self.normal,
            dir: ray.d,
            uv,
            material: Some(Arc::clone(&self.material)),
        })
    }
}
