//! Path vertices.

use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::material::{ScatterComponent, ScatterSample};
use bidir_core::spectrum::Spectrum;

/// What a path vertex sits on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VertexKind {
    /// The camera aperture point (first eye vertex).
    Camera,

    /// A point on the selected light's surface (first light vertex, or the
    /// terminal vertex of an eye path that hit the light).
    Light,

    /// A scattering surface.
    Surface,
}

/// How a sub-path walk ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Terminal {
    /// The extension ray left the scene.
    Escaped,

    /// Eye path only: hit a light that is not this pixel's selected light.
    WrongLight,

    /// Eye path only: hit the selected light; an `s = 0` sample was
    /// recorded as the path's terminal vertex.
    DirectLightHit,

    /// The surface returned no scatter sample (or a black one); the vertex
    /// is kept for pdf bookkeeping but the walk stops.
    Absorbed,

    /// The roulette draw failed.
    RouletteKilled,
}

/// One vertex of a light or eye sub-path. All vertices of a pixel's two
/// sub-paths live in per-pixel vectors that are dropped when the pixel's
/// accumulation completes; nothing borrows them past that point.
pub(crate) struct PathVertex {
    /// What the vertex sits on.
    pub(crate) kind: VertexKind,

    /// World position.
    pub(crate) p: Point3f,

    /// Shading normal (meaningless for camera vertices).
    pub(crate) ns: Normal3f,

    /// Geometric normal (meaningless for camera vertices).
    pub(crate) ng: Normal3f,

    /// Full interaction detail for surface vertices.
    pub(crate) info: Option<IntersectionInfo>,

    /// The material sample that produced `ray`, when scattering happened.
    pub(crate) sample: Option<ScatterSample>,

    /// The outgoing ray chosen at this vertex.
    pub(crate) ray: Ray,

    /// Unweighted path throughput accumulated up to and including this
    /// vertex, roulette compensation included.
    pub(crate) alpha: Spectrum,

    /// Area pdf of sampling this vertex from the previous one.
    pub(crate) pdf_fwd: Float,

    /// Area pdf of sampling this vertex from the next one. Filled in when
    /// the next vertex is created; the seam values are recomputed at
    /// connection time.
    pub(crate) pdf_rev: Float,

    /// Whether the outgoing direction was deterministically forced.
    pub(crate) specular: bool,

    /// Cumulative roulette survival probability of all draws up to this
    /// vertex's creation.
    pub(crate) rr: Float,
}

impl PathVertex {
    /// The BRDF lobe recorded at the vertex, or all lobes when no sample
    /// was drawn.
    pub(crate) fn component(&self) -> ScatterComponent {
        self.sample
            .as_ref()
            .map_or(ScatterComponent::all(), |s| s.component)
    }

    /// Cosine of the shading normal against a direction.
    ///
    /// * `d` - The (normalized) direction.
    pub(crate) fn cos_ns(&self, d: &Vector3f) -> Float {
        self.ns.abs_dot(d)
    }
}

/// Convert a solid-angle pdf at `from` into an area pdf at the surface
/// point `to` with geometric normal `to_ng`. Degenerate (coincident)
/// configurations convert to zero density.
///
/// * `angle_pdf` - The solid-angle pdf.
/// * `from`      - The point the direction was sampled at.
/// * `to`        - The sampled surface point.
/// * `to_ng`     - Geometric normal at `to`.
pub(crate) fn convert_density(
    angle_pdf: Float,
    from: &Point3f,
    to: &Point3f,
    to_ng: &Normal3f,
) -> Float {
    let d = *to - *from;
    let dist_sq = d.length_squared();
    if dist_sq <= 0.0 {
        return 0.0;
    }
    let w = d / dist_sq.sqrt();
    angle_pdf * to_ng.abs_dot(&w) / dist_sq
}

/// Map a zero pdf to one so delta-distributed vertices can participate in
/// pdf-ratio products without poisoning them; the ratio terms adjacent to
/// such vertices are skipped outright by the caller.
///
/// * `pdf` - The pdf.
#[inline(always)]
pub(crate) fn remap0(pdf: Float) -> Float {
    if pdf == 0.0 {
        1.0
    } else {
        pdf
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use super::*;

    #[test]
    fn density_conversion_applies_cosine_over_distance_squared() {
        let from = Point3f::new(0.0, 0.0, 0.0);
        let to = Point3f::new(0.0, 0.0, 2.0);
        let n = Normal3f::new(0.0, 0.0, -1.0);
        // Head-on at distance 2: cos = 1, d^2 = 4.
        assert!(approx_eq!(
            Float,
            convert_density(1.0, &from, &to, &n),
            0.25,
            epsilon = 1e-6
        ));

        // Grazing normal: zero density.
        let grazing = Normal3f::new(1.0, 0.0, 0.0);
        assert!(approx_eq!(
            Float,
            convert_density(1.0, &from, &to, &grazing),
            0.0,
            epsilon = 1e-6
        ));
    }

    #[test]
    fn remap0_preserves_nonzero() {
        assert_eq!(remap0(0.0), 1.0);
        assert_eq!(remap0(0.25), 0.25);
    }
}
