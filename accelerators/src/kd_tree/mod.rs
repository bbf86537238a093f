//! SAH KD Tree.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::primitive::{ArcPrimitive, Partitioning, Primitive};
use itertools::Itertools;
use std::sync::Arc;

mod common;
use common::*;

/// Hard cap on tree depth.
const MAX_DEPTH: usize = 20;

/// Node primitive count at or below which a leaf is always created.
const MIN_PRIMS: usize = 2;

/// Number of cost-increasing splits tolerated before giving up on a branch.
/// Bounds pathological recursion on degenerate inputs.
const BAD_SPLIT_BUDGET: u32 = 3;

/// Widening applied to the near/far split ranges during traversal so
/// primitives exactly on cell boundaries are not missed to rounding.
const KD_EPSILON: Float = 1e-4;

/// Surface-area-heuristic kd-tree over the scene's primitives. The cost
/// constants driving the heuristic are measured on the host at construction
/// time, so the model is self-calibrating per run.
pub struct KdTree {
    /// Calibrated SAH cost constants.
    costs: SahCosts,

    /// The primitives.
    primitives: Vec<ArcPrimitive>,

    /// Flattened tree nodes; the below-child of an interior node is at the
    /// next index.
    nodes: Vec<KdNode>,

    /// Bounding box over all primitives.
    bounds: Bounds3f,
}

impl KdTree {
    /// Create an empty `KdTree`, measuring the SAH cost constants.
    pub fn new() -> Self {
        Self {
            costs: SahCosts::measure(),
            primitives: vec![],
            nodes: vec![],
            bounds: Bounds3f::EMPTY,
        }
    }

    /// Recursive traversal. At an interior node the near child (the one
    /// containing the ray origin) is searched first over its clipped
    /// parametric range; the far child is searched only if that misses.
    ///
    /// * `node`    - Node index.
    /// * `ray`     - The ray.
    /// * `t_min`   - Start of the parametric range.
    /// * `t_max`   - End of the parametric range.
    /// * `nearest` - Whether the closest hit is required.
    fn intersect_node(
        &self,
        node: u32,
        ray: &Ray,
        t_min: Float,
        t_max: Float,
        nearest: bool,
    ) -> Option<(Float, u32)> {
        match &self.nodes[node as usize] {
            KdNode::Leaf { prims } => {
                let mut best: Option<(Float, u32)> = None;
                for &id in prims {
                    if let Some(t) = self.primitives[id as usize].intersect(ray) {
                        if t < t_min - KD_EPSILON || t > t_max + KD_EPSILON {
                            continue;
                        }
                        if !nearest {
                            return Some((t, id));
                        }
                        if best.map_or(true, |(bt, _)| t < bt) {
                            best = Some((t, id));
                        }
                    }
                }
                best
            }
            KdNode::Interior {
                axis,
                split,
                above_child,
            } => {
                let below_first =
                    ray.o[*axis] < *split || (ray.o[*axis] == *split && ray.d[*axis] <= 0.0);
                let (near, far) = if below_first {
                    (node + 1, *above_child)
                } else {
                    (*above_child, node + 1)
                };

                let d = ray.d[*axis];
                if d == 0.0 {
                    // Parallel to the split plane; the ray never leaves the
                    // near child.
                    return self.intersect_node(near, ray, t_min, t_max, nearest);
                }

                let t_plane = (*split - ray.o[*axis]) / d;
                if t_plane > t_max || t_plane <= 0.0 {
                    self.intersect_node(near, ray, t_min, t_max, nearest)
                } else if t_plane < t_min {
                    self.intersect_node(far, ray, t_min, t_max, nearest)
                } else {
                    let near_max = min(t_plane + KD_EPSILON, t_max);
                    if let Some(hit) = self.intersect_node(near, ray, t_min, near_max, nearest) {
                        Some(hit)
                    } else {
                        let far_min = max(t_plane - KD_EPSILON, t_min);
                        self.intersect_node(far, ray, far_min, t_max, nearest)
                    }
                }
            }
        }
    }
}

impl Default for KdTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Partitioning for KdTree {
    fn build(&mut self, primitives: Vec<ArcPrimitive>) {
        self.bounds = primitives
            .iter()
            .fold(Bounds3f::EMPTY, |b, p| b.union(&p.world_bound()));
        self.primitives = primitives;
        self.nodes.clear();

        if self.primitives.is_empty() {
            self.nodes.push(KdNode::Leaf { prims: vec![] });
            return;
        }

        // Initial sorted event lists over the full primitive set.
        let ids: Vec<u32> = (0..self.primitives.len() as u32).collect();
        let bounds = self.bounds;
        let events = build_events(&ids, |id| {
            self.primitives[id as usize]
                .clipped_bound(&bounds)
                .unwrap_or_else(|| self.primitives[id as usize].world_bound())
        });

        let mut builder = Builder {
            primitives: &self.primitives,
            costs: self.costs,
            nodes: vec![],
        };
        builder.build_node(bounds, ids, events, 0, BAD_SPLIT_BUDGET);

        info!(
            "Built kd-tree: {} primitives, {} nodes",
            self.primitives.len(),
            builder.nodes.len()
        );
        self.nodes = builder.nodes;
    }

    fn intersect(
        &self,
        ray: &Ray,
        t_min: Float,
        t_max: Float,
        nearest: bool,
    ) -> Option<(Float, ArcPrimitive)> {
        if self.nodes.is_empty() || self.primitives.is_empty() {
            return None;
        }

        // Clip the search to the ray's overlap with the tree extent.
        let (t0, t1) = self.bounds.intersect(ray, t_min, t_max)?;
        self.intersect_node(0, ray, t0, t1, nearest)
            .map(|(t, id)| (t, Arc::clone(&self.primitives[id as usize])))
    }

    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }
}

/// Generate the 3 per-axis sorted event lists for the given primitives.
///
/// * `ids`      - Indices of the primitives to include.
/// * `bound_of` - Clipped bounds accessor.
fn build_events<F>(ids: &[u32], bound_of: F) -> [Vec<SahEvent>; 3]
where
    F: Fn(u32) -> Bounds3f,
{
    let mut events: [Vec<SahEvent>; 3] = [
        Vec::with_capacity(2 * ids.len()),
        Vec::with_capacity(2 * ids.len()),
        Vec::with_capacity(2 * ids.len()),
    ];
    for &id in ids {
        let b = bound_of(id);
        for axis in Axis::all() {
            for ev in SahEvent::for_bounds(id, &b, axis).into_iter().flatten() {
                events[axis as usize].push(ev);
            }
        }
    }
    for evs in events.iter_mut() {
        evs.sort_by_key(|e| e.sort_key());
    }
    events
}

/// Which child (or children) of a split a primitive belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Membership {
    None,
    Below,
    Above,
    Both,
}

/// Recursive tree construction state.
struct Builder<'a> {
    /// The primitives.
    primitives: &'a [ArcPrimitive],

    /// Calibrated SAH cost constants.
    costs: SahCosts,

    /// Nodes built so far.
    nodes: Vec<KdNode>,
}

impl<'a> Builder<'a> {
    /// Build the node for the given region and return its index. Consumes
    /// the region's primitive ids and its 3 sorted event lists.
    ///
    /// * `node_bounds` - The region covered by the node.
    /// * `ids`         - Primitives overlapping the region.
    /// * `events`      - Sorted per-axis event lists for `ids`.
    /// * `depth`       - Current depth.
    /// * `bad_splits`  - Remaining bad-split budget.
    fn build_node(
        &mut self,
        node_bounds: Bounds3f,
        ids: Vec<u32>,
        events: [Vec<SahEvent>; 3],
        depth: usize,
        bad_splits: u32,
    ) -> u32 {
        let node_idx = self.nodes.len() as u32;
        self.nodes.push(KdNode::Leaf { prims: vec![] });

        let n = ids.len();
        if n <= MIN_PRIMS || depth >= MAX_DEPTH {
            self.nodes[node_idx as usize] = KdNode::Leaf { prims: ids };
            return node_idx;
        }

        // Sweep all 3 axes for the cheapest split.
        let best = self.best_split(&node_bounds, n, &events);
        let leaf_cost = self.costs.tri * n as Float * node_bounds.surface_area();

        let mut bad_splits = bad_splits;
        let split = match best {
            None => {
                self.nodes[node_idx as usize] = KdNode::Leaf { prims: ids };
                return node_idx;
            }
            Some(split) => {
                let step = self.costs.trav + 2.0 * self.costs.bbox;
                if split.cost + step > leaf_cost {
                    // The split does not pay for itself; allow a bounded
                    // number of forced attempts before settling for a leaf.
                    if bad_splits == 0 {
                        self.nodes[node_idx as usize] = KdNode::Leaf { prims: ids };
                        return node_idx;
                    }
                    bad_splits -= 1;
                }
                split
            }
        };

        let mut below_bounds = node_bounds;
        below_bounds.p_max[split.axis] = split.t;
        let mut above_bounds = node_bounds;
        above_bounds.p_min[split.axis] = split.t;

        // Classify primitives against the split. Straddlers are tested with
        // a clipped-bound membership query against each half independently
        // and may end up in both children.
        let mut membership = vec![Membership::None; self.primitives.len()];
        let mut below_ids = Vec::with_capacity(n);
        let mut above_ids = Vec::with_capacity(n);
        let mut below_clipped: Vec<(u32, Bounds3f)> = vec![];
        let mut above_clipped: Vec<(u32, Bounds3f)> = vec![];

        for &id in &ids {
            let prim = &self.primitives[id as usize];
            let b = match prim.clipped_bound(&node_bounds) {
                Some(b) => b,
                None => continue,
            };
            let (lo, hi) = (b.p_min[split.axis], b.p_max[split.axis]);

            let m = if lo == hi && lo == split.t {
                match split.planar_side {
                    PlanarSide::Below => Membership::Below,
                    PlanarSide::Above => Membership::Above,
                }
            } else if hi <= split.t {
                Membership::Below
            } else if lo >= split.t {
                Membership::Above
            } else {
                // The tight clipped bound crosses the plane, so geometry
                // exists on both sides and both half clips succeed.
                if let Some(cb) = prim.clipped_bound(&below_bounds) {
                    below_clipped.push((id, cb));
                }
                if let Some(ca) = prim.clipped_bound(&above_bounds) {
                    above_clipped.push((id, ca));
                }
                Membership::Both
            };
            membership[id as usize] = m;

            if m == Membership::Below || m == Membership::Both {
                below_ids.push(id);
            }
            if m == Membership::Above || m == Membership::Both {
                above_ids.push(id);
            }
        }

        // Child event lists: inherited sorted sub-lists for one-sided
        // primitives, merged (not re-sorted) with fresh events from the
        // clipped straddlers.
        let below_events =
            child_events(&events, &membership, Membership::Below, &below_clipped);
        let above_events =
            child_events(&events, &membership, Membership::Above, &above_clipped);

        let below_idx = self.build_node(below_bounds, below_ids, below_events, depth + 1, bad_splits);
        debug_assert!(below_idx == node_idx + 1);
        let above_idx = self.build_node(above_bounds, above_ids, above_events, depth + 1, bad_splits);

        self.nodes[node_idx as usize] = KdNode::Interior {
            axis: split.axis,
            split: split.t,
            above_child: above_idx,
        };
        node_idx
    }

    /// Sweep each axis' event list left to right, maintaining counts of
    /// primitives fully below, fully above, and planar at the sweep
    /// position, and return the minimum-cost split.
    ///
    /// * `node_bounds` - The region covered by the node.
    /// * `n`           - Number of primitives in the region.
    /// * `events`      - Sorted per-axis event lists.
    fn best_split(
        &self,
        node_bounds: &Bounds3f,
        n: usize,
        events: &[Vec<SahEvent>; 3],
    ) -> Option<SplitPlane> {
        let mut best: Option<SplitPlane> = None;
        let d = node_bounds.diagonal();

        for axis in Axis::all() {
            let evs = &events[axis as usize];
            let oa0 = axis.next();
            let oa1 = oa0.next();
            let cap_area = d[oa0] * d[oa1];
            let lateral = d[oa0] + d[oa1];

            let mut n_below = 0usize;
            let mut n_above = n;
            let mut i = 0usize;
            while i < evs.len() {
                let t = evs[i].t;
                let (mut ends, mut planars, mut starts) = (0usize, 0usize, 0usize);
                while i < evs.len() && evs[i].t == t {
                    match evs[i].kind {
                        EventKind::End => ends += 1,
                        EventKind::Planar => planars += 1,
                        EventKind::Start => starts += 1,
                    }
                    i += 1;
                }

                // Primitives ending or lying at the plane are no longer
                // above it.
                n_above -= ends + planars;

                if t > node_bounds.p_min[axis] && t < node_bounds.p_max[axis] {
                    let below_area =
                        2.0 * (cap_area + (t - node_bounds.p_min[axis]) * lateral);
                    let above_area =
                        2.0 * (cap_area + (node_bounds.p_max[axis] - t) * lateral);

                    for (planar_side, nb, na) in [
                        (PlanarSide::Below, n_below + planars, n_above),
                        (PlanarSide::Above, n_below, n_above + planars),
                    ] {
                        let cost =
                            self.costs.tri * (nb as Float * below_area + na as Float * above_area);
                        if best.as_ref().map_or(true, |b| cost < b.cost) {
                            best = Some(SplitPlane {
                                axis,
                                t,
                                planar_side,
                                cost,
                            });
                        }
                    }
                }

                n_below += starts + planars;
            }
            debug_assert!(n_below == n && n_above == 0);
        }

        best
    }
}

/// Assemble a child's per-axis event lists by filtering the parent's sorted
/// lists down to one-sided primitives and merging in the freshly generated
/// (sorted) events of the clipped straddlers.
///
/// * `events`     - The parent's sorted per-axis event lists.
/// * `membership` - Per-primitive split classification.
/// * `side`       - Which child is being assembled.
/// * `clipped`    - Straddler ids with their child-clipped bounds.
fn child_events(
    events: &[Vec<SahEvent>; 3],
    membership: &[Membership],
    side: Membership,
    clipped: &[(u32, Bounds3f)],
) -> [Vec<SahEvent>; 3] {
    let mut out: [Vec<SahEvent>; 3] = [vec![], vec![], vec![]];

    for axis in Axis::all() {
        let kept = events[axis as usize]
            .iter()
            .filter(|e| membership[e.prim as usize] == side)
            .copied();

        let mut fresh: Vec<SahEvent> = clipped
            .iter()
            .flat_map(|(id, b)| SahEvent::for_bounds(*id, b, axis).into_iter().flatten())
            .collect();
        fresh.sort_by_key(|e| e.sort_key());

        out[axis as usize] = kept
            .merge_by(fresh, |a, b| a.sort_key() <= b.sort_key())
            .collect();
    }

    out
}
