//! KD Tree Common

use bidir_core::common::*;
use bidir_core::geometry::*;
use ordered_float::OrderedFloat;
use std::hint::black_box;
use std::time::Instant;

/// Event kinds, in the tie-break order the split-cost sweep depends on:
/// at equal position, `End < Planar < Start` so coincident end/start events
/// never double-count overlap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EventKind {
    End = 0,
    Planar = 1,
    Start = 2,
}

/// A tagged occurrence of a primitive's extent boundary along one axis.
/// Transient: generated during construction, consumed by the sweep.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SahEvent {
    /// Index of the primitive.
    pub(crate) prim: u32,

    /// Position of the boundary along the axis.
    pub(crate) t: Float,

    /// Event kind.
    pub(crate) kind: EventKind,
}

impl SahEvent {
    /// Create a new `SahEvent`.
    ///
    /// * `prim` - Index of the primitive.
    /// * `t`    - Position along the axis.
    /// * `kind` - Event kind.
    pub(crate) fn new(prim: u32, t: Float, kind: EventKind) -> Self {
        Self { prim, t, kind }
    }

    /// Total-order sort key: position, then kind.
    pub(crate) fn sort_key(&self) -> (OrderedFloat<Float>, EventKind) {
        (OrderedFloat(self.t), self.kind)
    }

    /// Generate the events a primitive bound contributes along one axis:
    /// a single planar event for a degenerate extent, otherwise a
    /// start/end pair.
    ///
    /// * `prim`   - Index of the primitive.
    /// * `bounds` - The (clipped) primitive bounds.
    /// * `axis`   - The axis.
    pub(crate) fn for_bounds(prim: u32, bounds: &Bounds3f, axis: Axis) -> [Option<Self>; 2] {
        let lo = bounds.p_min[axis];
        let hi = bounds.p_max[axis];
        if lo == hi {
            [Some(Self::new(prim, lo, EventKind::Planar)), None]
        } else {
            [
                Some(Self::new(prim, lo, EventKind::Start)),
                Some(Self::new(prim, hi, EventKind::End)),
            ]
        }
    }
}

/// A kd-tree node. Interior nodes keep their below-child implicitly at the
/// next index; leaves own their primitive index list non-exclusively (a
/// straddling primitive can appear in both children).
#[derive(Clone, Debug)]
pub(crate) enum KdNode {
    Interior {
        /// Split axis.
        axis: Axis,

        /// Position of the split along `axis`.
        split: Float,

        /// Index of the child covering the space above the split plane.
        above_child: u32,
    },

    Leaf {
        /// Indices of the primitives overlapping the leaf.
        prims: Vec<u32>,
    },
}

/// Which side of the split plane the coincident planar primitives go to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PlanarSide {
    Below,
    Above,
}

/// The chosen split for an interior node.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SplitPlane {
    /// Split axis.
    pub(crate) axis: Axis,

    /// Split position.
    pub(crate) t: Float,

    /// Side the planar primitives are assigned to.
    pub(crate) planar_side: PlanarSide,

    /// SAH cost of the split (excluding traversal overhead).
    pub(crate) cost: Float,
}

/// Relative costs of the operations the SAH cost model trades off, measured
/// on the host at tree-construction time rather than hardcoded.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SahCosts {
    /// Cost of one ray/triangle intersection.
    pub(crate) tri: Float,

    /// Cost of one ray/box intersection.
    pub(crate) bbox: Float,

    /// Cost of one traversal step.
    pub(crate) trav: Float,
}

/// Number of synthetic intersection tests per timing run.
const CALIBRATION_ROUNDS: u32 = 50_000;

impl SahCosts {
    /// Measure the cost constants by timing synthetic ray/triangle and
    /// ray/box intersection tests. Costs are expressed relative to the box
    /// test, whose cost also stands in for a traversal step.
    pub(crate) fn measure() -> Self {
        let bounds = Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let (p0, p1, p2) = (
            Point3f::new(-1.0, -1.0, 0.0),
            Point3f::new(1.0, -1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        );

        let start = Instant::now();
        for i in 0..CALIBRATION_ROUNDS {
            let ray = calibration_ray(i);
            black_box(ray_triangle(&ray, &p0, &p1, &p2));
        }
        let tri_ns = start.elapsed().as_nanos() as Float;

        let start = Instant::now();
        for i in 0..CALIBRATION_ROUNDS {
            let ray = calibration_ray(i);
            black_box(bounds.intersect(&ray, 0.0, INFINITY));
        }
        let bbox_ns = start.elapsed().as_nanos() as Float;

        // Guard against timer granularity on fast hosts.
        let bbox_ns = max(bbox_ns, 1.0);
        let tri = max(tri_ns / bbox_ns, 1.0);
        let costs = Self {
            tri,
            bbox: 1.0,
            trav: 1.0,
        };
        debug!("Calibrated SAH costs: {costs:?}");
        costs
    }
}

/// A deterministic spread of ray directions for calibration.
///
/// * `i` - Test index.
fn calibration_ray(i: u32) -> Ray {
    let a = i as Float * 0.137;
    Ray::new(
        Point3f::new(0.0, 0.0, -5.0),
        Vector3f::new(a.sin() * 0.4, a.cos() * 0.4, 1.0),
    )
}

/// Möller-Trumbore test used only for cost calibration.
///
/// * `ray`          - The ray.
/// * `p0`, `p1`, `p2` - Triangle vertices.
fn ray_triangle(ray: &Ray, p0: &Point3f, p1: &Point3f, p2: &Point3f) -> Option<Float> {
    let e1 = *p1 - *p0;
    let e2 = *p2 - *p0;
    let pvec = ray.d.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.o - *p0;
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
    (t > 0.0).then_some(t)
}
