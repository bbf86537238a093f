//! Triangles.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::ArcMaterial;
use bidir_core::primitive::Primitive;
use std::sync::Arc;

/// A single triangle with per-face normal.
pub struct Triangle {
    /// Vertex positions.
    p: [Point3f; 3],

    /// Unit geometric normal.
    normal: Normal3f,

    /// Surface material.
    material: ArcMaterial,
}

impl Triangle {
    /// Create a new `Triangle`.
    ///
    /// * `p0`       - First vertex.
    /// * `p1`       - Second vertex.
    /// * `p2`       - Third vertex.
    /// * `material` - Surface material.
    pub fn new(p0: Point3f, p1: Point3f, p2: Point3f, material: ArcMaterial) -> Self {
        let normal = Normal3f::from((p1 - p0).cross(&(p2 - p0)).normalize());
        Self {
            p: [p0, p1, p2],
            normal,
            material,
        }
    }

    /// Möller-Trumbore intersection returning `(t, b1, b2)` barycentrics, or
    /// `None`. Near-zero determinants are treated as a miss.
    ///
    /// * `ray` - The ray.
    fn intersect_bary(&self, ray: &Ray) -> Option<(Float, Float, Float)> {
        let e1 = self.p[1] - self.p[0];
        let e2 = self.p[2] - self.p[0];
        let pvec = ray.d.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < 1e-9 {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.o - self.p[0];
        let b1 = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&b1) {
            return None;
        }

        let qvec = tvec.cross(&e1);
        let b2 = ray.d.dot(&qvec) * inv_det;
        if b2 < 0.0 || b1 + b2 > 1.0 {
            return None;
        }

        let t = e2.dot(&qvec) * inv_det;
        (t > 0.0).then_some((t, b1, b2))
    }
}

impl Primitive for Triangle {
    fn world_bound(&self) -> Bounds3f {
        Bounds3f::from_point(self.p[0])
            .union_point(&self.p[1])
            .union_point(&self.p[2])
    }

    /// Clips the triangle polygon against the box (Sutherland-Hodgman) so
    /// straddling triangles get a tight membership test, and bounds the
    /// clipped polygon.
    fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f> {
        let mut poly: Vec<Point3f> = self.p.to_vec();

        for axis in Axis::all() {
            for (plane, keep_below) in [(clip.p_min[axis], false), (clip.p_max[axis], true)] {
                if poly.is_empty() {
                    return None;
                }
                let inside = |p: &Point3f| {
                    if keep_below {
                        p[axis] <= plane
                    } else {
                        p[axis] >= plane
                    }
                };

                let mut clipped = Vec::with_capacity(poly.len() + 1);
                for i in 0..poly.len() {
                    let cur = poly[i];
                    let next = poly[(i + 1) % poly.len()];
                    let cur_in = inside(&cur);
                    let next_in = inside(&next);

                    if cur_in {
                        clipped.push(cur);
                    }
                    if cur_in != next_in {
                        let denom = next[axis] - cur[axis];
                        if denom.abs() > 0.0 {
                            let s = (plane - cur[axis]) / denom;
                            clipped.push(cur + (next - cur) * s);
                        }
                    }
                }
                poly = clipped;
            }
        }

        if poly.is_empty() {
            return None;
        }
        let bound = poly
            .iter()
            .fold(Bounds3f::EMPTY, |b, p| b.union_point(p));
        bound.overlap(clip)
    }

    fn intersect(&self, ray: &Ray) -> Option<Float> {
        self.intersect_bary(ray).map(|(t, _, _)| t)
    }

    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
        let (t, b1, b2) = self.intersect_bary(ray)?;
        Some(IntersectionInfo {
            p: ray.at(t),
            ns: self.normal,
            ng: self.normal,
            dir: ray.d,
            uv: Point2f::new(b1, b2),
            material: Some(Arc::clone(&self.material)),
        })
    }
}

#[cfg(test)]
mod tests {
    use bidir_core::material::{Material, ScatterComponent, ScatterSample};
    use bidir_core::rng::Rng;
    use bidir_core::spectrum::Spectrum;
    use super::*;

    struct NullMaterial;

    impl Material for NullMaterial {
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

    fn tri() -> Triangle {
        Triangle::new(
            Point3f::new(-1.0, 0.0, -1.0),
            Point3f::new(1.0, 0.0, -1.0),
            Point3f::new(0.0, 0.0, 1.0),
            Arc::new(NullMaterial),
        )
    }

    #[test]
    fn clipping_shrinks_straddling_bounds() {
        let t = tri();
        let clip = Bounds3f::new(Point3f::new(-2.0, -1.0, 0.0), Point3f::new(2.0, 1.0, 2.0));
        let clipped = t.clipped_bound(&clip).unwrap();
        // Only the apex-side part of the triangle lies in z >= 0; the
        // clipped x-extent is half the full one.
        assert!(clipped.p_min.z >= 0.0 - 1e-5);
        assert!(clipped.p_max.x <= 0.5 + 1e-5 && clipped.p_min.x >= -0.5 - 1e-5);
    }

    #[test]
    fn clipping_misses_disjoint_box() {
        let t = tri();
        let clip = Bounds3f::new(Point3f::new(5.0, 5.0, 5.0), Point3f::new(6.0, 6.0, 6.0));
        assert!(t.clipped_bound(&clip).is_none());
    }

    #[test]
    fn ray_hits_interior_and_misses_outside() {
        let t = tri();
        let down = Vector3f::new(0.0, -1.0, 0.0);
        let hit = Primitive::intersect(&t, &Ray::new(Point3f::new(0.0, 2.0, 0.0), down));
        assert!((hit.unwrap() - 2.0).abs() < 1e-5);
        let miss = Primitive::intersect(&t, &Ray::new(Point3f::new(0.9, 2.0, 0.9), down));
        assert!(miss.is_none());
    }
}
