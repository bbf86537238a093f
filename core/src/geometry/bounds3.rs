//! Axis-aligned bounding boxes.

use crate::common::*;
use super::point::Point3f;
use super::ray::Ray;
use super::vector::Vector3f;

/// An axis-aligned bounding box described by its minimum and maximum corners.
/// Once built from geometry, `p_min <= p_max` holds componentwise; the empty
/// box uses +inf/-inf sentinels so unions work without special cases.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3f {
    /// Minimum corner.
    pub p_min: Point3f,

    /// Maximum corner.
    pub p_max: Point3f,
}

impl Bounds3f {
    /// The empty box (+inf/-inf sentinels).
    pub const EMPTY: Self = Self {
        p_min: Point3f {
            x: INFINITY,
            y: INFINITY,
            z: INFINITY,
        },
        p_max: Point3f {
            x: -INFINITY,
            y: -INFINITY,
            z: -INFINITY,
        },
    };

    /// Create a new `Bounds3f` from 2 corner points.
    ///
    /// * `p1` - First corner.
    /// * `p2` - Second corner.
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Create a `Bounds3f` containing a single point.
    ///
    /// * `p` - The point.
    pub fn from_point(p: Point3f) -> Self {
        Self { p_min: p, p_max: p }
    }

    /// Returns `true` if the box is empty.
    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    /// Returns the union with another box.
    ///
    /// * `other` - The other box.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.min(&other.p_min),
            p_max: self.p_max.max(&other.p_max),
        }
    }

    /// Returns the union with a point.
    ///
    /// * `p` - The point.
    pub fn union_point(&self, p: &Point3f) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Returns the overlap with another box, or `None` if the boxes are
    /// disjoint.
    ///
    /// * `other` - The other box.
    pub fn overlap(&self, other: &Self) -> Option<Self> {
        let clipped = Self {
            p_min: self.p_min.max(&other.p_min),
            p_max: self.p_max.min(&other.p_max),
        };
        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }

    /// Returns the vector from the minimum to the maximum corner.
    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    /// Returns the surface area of the box.
    pub fn surface_area(&self) -> Float {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns the axis of the box's largest extent.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Slab test. Returns the parametric entry and exit distances of the ray
    /// against the box within `[t_min, t_max]`, or `None` if there is no
    /// intersection. A ray whose direction is zero on some axis hits only if
    /// its origin lies inside that axis' slab.
    ///
    /// * `ray`   - The ray.
    /// * `t_min` - Start of the parametric range.
    /// * `t_max` - End of the parametric range.
    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<(Float, Float)> {
        let mut t_near = t_min;
        let mut t_far = t_max;

        for axis in Axis::all() {
            let d = ray.d[axis];
            if d == 0.0 {
                if ray.o[axis] < self.p_min[axis] || ray.o[axis] > self.p_max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (self.p_min[axis] - ray.o[axis]) * inv;
            let mut t1 = (self.p_max[axis] - ray.o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_near = max(t_near, t0);
            t_far = min(t_far, t1);
            if t_near > t_far {
                return None;
            }
        }

        Some((t_near, t_far))
    }
}

impl Default for Bounds3f {
    /// Return the empty box.
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds3f {
        Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn ray_through_center_hits_with_ordered_range() {
        let b = unit_box();
        let ray = Ray::new(Point3f::new(-5.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        let (t_near, t_far) = b.intersect(&ray, 0.0, INFINITY).unwrap();
        assert!(t_near < t_far);
        assert!((t_near - 4.0).abs() < 1e-5 && (t_far - 6.0).abs() < 1e-5);
    }

    #[test]
    fn axis_parallel_ray_outside_slab_misses() {
        let b = unit_box();
        // Parallel to X, outside the Y slab; never intersects regardless of
        // the other axes.
        let ray = Ray::new(Point3f::new(-5.0, 2.0, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        assert!(b.intersect(&ray, 0.0, INFINITY).is_none());
    }

    #[test]
    fn axis_parallel_ray_inside_slab_hits() {
        let b = unit_box();
        let ray = Ray::new(Point3f::new(-5.0, 0.5, 0.5), Vector3f::new(1.0, 0.0, 0.0));
        assert!(b.intersect(&ray, 0.0, INFINITY).is_some());
    }

    #[test]
    fn range_narrowing_rejects_hits_behind_t_max() {
        let b = unit_box();
        let ray = Ray::new(Point3f::new(-5.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        assert!(b.intersect(&ray, 0.0, 3.0).is_none());
    }

    #[test]
    fn empty_box_has_zero_area_and_unions_identity() {
        let b = Bounds3f::EMPTY;
        assert!(b.is_empty());
        assert_eq!(b.surface_area(), 0.0);
        let u = b.union(&unit_box());
        assert_eq!(u, unit_box());
    }

    #[test]
    fn overlap_clips_to_shared_region() {
        let a = unit_box();
        let b = Bounds3f::new(Point3f::new(0.0, 0.0, 0.0), Point3f::new(3.0, 3.0, 3.0));
        let o = a.overlap(&b).unwrap();
        assert_eq!(o.p_min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(o.p_max, Point3f::new(1.0, 1.0, 1.0));

        let far = Bounds3f::new(Point3f::new(5.0, 5.0, 5.0), Point3f::new(6.0, 6.0, 6.0));
        assert!(a.overlap(&far).is_none());
    }
}
