//! Materials.

use bitflags::bitflags;
use crate::common::*;
use crate::geometry::*;
use crate::interaction::IntersectionInfo;
use crate::rng::Rng;
use crate::spectrum::Spectrum;
use std::sync::Arc;

bitflags! {
    /// Tags the BRDF lobe a sample was drawn from. Connections re-evaluate
    /// the vertex's BRDF restricted to the recorded component.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ScatterComponent: u8 {
        const DIFFUSE = 1 << 0;
        const SPECULAR = 1 << 1;
    }
}

/// An outgoing-direction sample drawn from a material.
#[derive(Clone)]
pub struct ScatterSample {
    /// BRDF value for the sampled direction.
    pub color: Spectrum,

    /// The outgoing ray, with its origin offset off the surface.
    pub ray: Ray,

    /// Solid-angle pdf of the sampled direction.
    pub pdf: Float,

    /// Solid-angle pdf of sampling the incoming direction from the outgoing
    /// one (used for MIS bookkeeping).
    pub rpdf: Float,

    /// Whether the direction was deterministically forced (Dirac lobe).
    pub specular: bool,

    /// The lobe the sample came from.
    pub component: ScatterComponent,
}

/// The opaque sampler/evaluator capability consumed by the integrator.
/// The `adjoint` flag marks importance transport (light sub-paths) so
/// implementations can apply the non-symmetric shading-normal correction.
pub trait Material: Send + Sync {
    /// Sample an outgoing direction at the interaction, or `None` if the
    /// configuration admits no scattering.
    ///
    /// * `info`    - The surface interaction.
    /// * `rng`     - Random source.
    /// * `adjoint` - True when tracing from a light.
    fn sample(&self, info: &IntersectionInfo, rng: &mut Rng, adjoint: bool) -> Option<ScatterSample>;

    /// Evaluate the BRDF toward `wo`, restricted to the given component.
    ///
    /// * `info`      - The surface interaction.
    /// * `wo`        - The outgoing direction.
    /// * `component` - The lobe to evaluate.
    fn brdf(&self, info: &IntersectionInfo, wo: Vector3f, component: ScatterComponent) -> Spectrum;

    /// Returns the solid-angle pdf of sampling `wo` at the interaction,
    /// restricted to the given component.
    ///
    /// * `info`      - The surface interaction.
    /// * `wo`        - The outgoing direction.
    /// * `adjoint`   - True when tracing from a light.
    /// * `component` - The lobe to evaluate.
    fn pdf(&self, info: &IntersectionInfo, wo: Vector3f, adjoint: bool, component: ScatterComponent) -> Float;
}

/// Atomic reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material>;
