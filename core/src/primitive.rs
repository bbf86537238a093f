//! Primitives and spatial partitioning.

use crate::common::*;
use crate::geometry::*;
use crate::interaction::IntersectionInfo;
use std::sync::Arc;

/// An intersectable, boundable piece of scene geometry.
pub trait Primitive: Send + Sync {
    /// Returns the bounding box in world space.
    fn world_bound(&self) -> Bounds3f;

    /// Returns the bounding box clipped against the given box, or `None` if
    /// the primitive does not overlap it. Used by the kd-tree to decide
    /// which children a straddling primitive belongs to.
    ///
    /// * `clip` - The clip box.
    fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f>;

    /// Returns the parametric distance of the nearest intersection along the
    /// ray, or `None` if there is no intersection.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<Float>;

    /// Resolves the intersection along the ray into full surface detail, or
    /// `None` if the ray misses.
    ///
    /// * `ray` - The ray.
    fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo>;
}

/// Atomic reference counted `Primitive`.
pub type ArcPrimitive = Arc<dyn Primitive>;

/// The acceleration-structure contract: build once from the scene's
/// primitive set, then answer ray queries over a parametric range.
pub trait Partitioning: Send + Sync {
    /// Build the structure over the given primitives, replacing any previous
    /// contents.
    ///
    /// * `primitives` - The primitives.
    fn build(&mut self, primitives: Vec<ArcPrimitive>);

    /// Returns the nearest hit in `[t_min, t_max]` as a distance/primitive
    /// pair, or `None`. When `nearest` is false, any hit in range may be
    /// returned and the search terminates early; this is the fast path for
    /// shadow rays.
    ///
    /// * `ray`     - The ray.
    /// * `t_min`   - Start of the parametric range.
    /// * `t_max`   - End of the parametric range.
    /// * `nearest` - Whether the closest hit is required.
    fn intersect(
        &self,
        ray: &Ray,
        t_min: Float,
        t_max: Float,
        nearest: bool,
    ) -> Option<(Float, ArcPrimitive)>;

    /// Returns the bounding box of the built primitive set.
    fn world_bound(&self) -> Bounds3f;
}
