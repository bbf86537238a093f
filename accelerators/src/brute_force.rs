//! Brute-force partitioning.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::primitive::{ArcPrimitive, Partitioning, Primitive};
use std::sync::Arc;

/// Linear-scan reference implementation of the partitioning contract. Used
/// to validate the kd-tree; also the sane choice for tiny scenes.
#[derive(Default)]
pub struct BruteForce {
    /// The primitives.
    primitives: Vec<ArcPrimitive>,

    /// Bounding box over all primitives.
    bounds: Bounds3f,
}

impl BruteForce {
    /// Create an empty `BruteForce` partitioning.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Partitioning for BruteForce {
    fn build(&mut self, primitives: Vec<ArcPrimitive>) {
        self.bounds = primitives
            .iter()
            .fold(Bounds3f::EMPTY, |b, p| b.union(&p.world_bound()));
        self.primitives = primitives;
    }

    fn intersect(
        &self,
        ray: &Ray,
        t_min: Float,
        t_max: Float,
        nearest: bool,
    ) -> Option<(Float, ArcPrimitive)> {
        let mut best: Option<(Float, ArcPrimitive)> = None;

        for prim in &self.primitives {
            if let Some(t) = prim.intersect(ray) {
                if t < t_min || t > t_max {
                    continue;
                }
                if !nearest {
                    return Some((t, Arc::clone(prim)));
                }
                if best.as_ref().map_or(true, |(bt, _)| t < *bt) {
                    best = Some((t, Arc::clone(prim)));
                }
            }
        }

        best
    }

    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }
}
