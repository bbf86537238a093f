//! Sub-path construction.

use bidir_core::camera::{ArcCamera, Camera};
use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::interaction::IntersectionInfo;
use bidir_core::light::{ArcLight, Light};
use bidir_core::material::{Material, ScatterComponent, ScatterSample};
use bidir_core::primitive::Primitive;
use bidir_core::rng::Rng;
use bidir_core::scene::{Scene, SceneSurface};
use bidir_core::spectrum::Spectrum;
use std::sync::Arc;
use super::vertex::*;

/// Number of leading vertices exempt from roulette.
const ALWAYS_KEPT: usize = 3;

/// Shared inputs of one pixel's two walks.
pub(crate) struct WalkContext<'a> {
    /// The scene.
    pub(crate) scene: &'a Scene,

    /// The light selected for this pixel sample.
    pub(crate) light: &'a ArcLight,

    /// Probability mass the light was selected with.
    pub(crate) pick_p: Float,

    /// Roulette continuation probability past the always-kept prefix.
    pub(crate) rr: Float,
}

/// Build the eye sub-path for a pixel. The returned terminal tells whether
/// the path's last vertex is a direct hit on the selected light (the
/// `s = 0` strategy's sample).
///
/// * `ctx`    - Walk context.
/// * `camera` - The camera.
/// * `x`      - Pixel x-coordinate.
/// * `y`      - Pixel y-coordinate.
/// * `rng`    - Random source.
pub(crate) fn eye_walk(
    ctx: &WalkContext,
    camera: &ArcCamera,
    x: usize,
    y: usize,
    rng: &mut Rng,
) -> (Vec<PathVertex>, Terminal) {
    let u = rng.uniform_2d();
    let lens = camera.sample_aperture(u.x, u.y);
    let ray = camera.ray_from_pixel(x, y, rng.uniform_2d(), lens);

    let n = Normal3f::from(ray.d);
    let mut path = vec![PathVertex {
        kind: VertexKind::Camera,
        p: ray.o,
        ns: n,
        ng: n,
        info: None,
        sample: None,
        ray,
        alpha: Spectrum::ONE,
        pdf_fwd: 1.0,
        pdf_rev: 1.0,
        specular: false,
        rr: 1.0,
    }];

    let terminal = extend(ctx, Some(camera), &mut path, rng, false);
    (path, terminal)
}

/// Build the light sub-path for a pixel, starting from an emitted-ray
/// sample on the selected light.
///
/// * `ctx` - Walk context.
/// * `rng` - Random source.
pub(crate) fn light_walk(ctx: &WalkContext, rng: &mut Rng) -> (Vec<PathVertex>, Terminal) {
    let ls = ctx.light.sample_ray(rng);
    let origin_pdf = ls.area_pdf * ctx.pick_p;
    if origin_pdf <= 0.0 || ls.angle_pdf <= 0.0 {
        return (vec![], Terminal::Absorbed);
    }

    // Emission folded into a pseudo scatter sample makes the extension
    // step below uniform across vertex kinds.
    let origin_info = IntersectionInfo {
        p: ls.ray.o,
        ns: ls.normal,
        ng: ls.normal,
        dir: ls.ray.d,
        uv: Point2f::default(),
        material: None,
    };
    let sample = ScatterSample {
        color: ls.color,
        ray: ls.ray,
        pdf: ls.angle_pdf,
        rpdf: 0.0,
        specular: false,
        component: ScatterComponent::all(),
    };

    let mut path = vec![PathVertex {
        kind: VertexKind::Light,
        p: ls.ray.o,
        ns: ls.normal,
        ng: ls.normal,
        info: Some(origin_info),
        sample: Some(sample),
        ray: ls.ray,
        alpha: Spectrum::splat(1.0 / origin_pdf),
        pdf_fwd: origin_pdf,
        pdf_rev: 0.0,
        specular: false,
        rr: 1.0,
    }];

    let terminal = extend(ctx, None, &mut path, rng, true);
    (path, terminal)
}

/// Extend the path one scene intersection at a time until a terminal state
/// is reached. `adjoint` marks importance transport (light sub-paths).
///
/// * `ctx`     - Walk context.
/// * `camera`  - The camera, for eye paths.
/// * `path`    - The path, holding its initial vertex.
/// * `rng`     - Random source.
/// * `adjoint` - True when tracing from the light.
fn extend(
    ctx: &WalkContext,
    camera: Option<&ArcCamera>,
    path: &mut Vec<PathVertex>,
    rng: &mut Rng,
    adjoint: bool,
) -> Terminal {
    let mut pending_rr = 1.0;

    loop {
        let prev = path.last().expect("walk started without an initial vertex");
        let hit = match ctx.scene.intersect(&prev.ray) {
            Some(hit) => hit,
            None => return Terminal::Escaped,
        };

        let d = prev.ray.d;
        match hit.surface {
            SceneSurface::Light(light) => {
                if adjoint {
                    // A light path running into an emitter has nowhere to
                    // scatter; the emitter just occludes it.
                    return Terminal::Absorbed;
                }
                if !Arc::ptr_eq(&light, ctx.light) {
                    return Terminal::WrongLight;
                }
                let info = match light.intersection_info(&prev.ray) {
                    Some(info) => info,
                    None => return Terminal::Escaped,
                };
                let (pdf_fwd, alpha, rr) = extension_values(prev, camera, &info, pending_rr);
                let ray = Ray::new(info.p, d);
                path.push(PathVertex {
                    kind: VertexKind::Light,
                    p: info.p,
                    ns: info.ns,
                    ng: info.ng,
                    info: Some(info),
                    sample: None,
                    ray,
                    alpha,
                    pdf_fwd,
                    pdf_rev: 0.0,
                    specular: false,
                    rr,
                });
                return Terminal::DirectLightHit;
            }

            SceneSurface::Primitive(prim) => {
                let info = match prim.intersection_info(&prev.ray) {
                    Some(info) => info,
                    None => return Terminal::Escaped,
                };
                let (pdf_fwd, alpha, rr) = extension_values(prev, camera, &info, pending_rr);

                let sample = info
                    .material
                    .as_ref()
                    .map(Arc::clone)
                    .and_then(|mat| mat.sample(&info, rng, adjoint));

                // The previous vertex's reverse density becomes known once
                // this vertex has a scatter sample.
                if let Some(s) = &sample {
                    let idx = path.len() - 1;
                    if path[idx].kind != VertexKind::Camera {
                        path[idx].pdf_rev =
                            convert_density(s.rpdf, &info.p, &path[idx].p, &path[idx].ng);
                    }
                }

                let dead = sample.as_ref().map_or(true, |s| s.color.is_black());
                let ray = sample.as_ref().map_or(Ray::new(info.p, d), |s| s.ray);
                let specular = sample.as_ref().map_or(false, |s| s.specular);

                path.push(PathVertex {
                    kind: VertexKind::Surface,
                    p: info.p,
                    ns: info.ns,
                    ng: info.ng,
                    info: Some(info),
                    sample,
                    ray,
                    alpha,
                    pdf_fwd,
                    pdf_rev: 0.0,
                    specular,
                    rr,
                });

                if dead {
                    return Terminal::Absorbed;
                }
            }
        }

        // Roulette: the leading vertices always survive, every extension
        // after that must win a draw whose survival probability is repaid
        // through the next vertex's alpha.
        if path.len() >= ALWAYS_KEPT {
            if rng.uniform_float() >= ctx.rr {
                return Terminal::RouletteKilled;
            }
            pending_rr = ctx.rr;
        } else {
            pending_rr = 1.0;
        }
    }
}

/// Forward area pdf, accumulated throughput, and cumulative roulette
/// survival for a vertex freshly created at `info` by extending `prev`.
///
/// * `prev`       - The vertex extended from.
/// * `camera`     - The camera, for eye paths.
/// * `info`       - The new vertex's interaction.
/// * `pending_rr` - Survival probability of the roulette draw that allowed
///                  the extension.
fn extension_values(
    prev: &PathVertex,
    camera: Option<&ArcCamera>,
    info: &IntersectionInfo,
    pending_rr: Float,
) -> (Float, Spectrum, Float) {
    let d = prev.ray.d;
    let (dir_pdf, factor) = match prev.kind {
        VertexKind::Camera => {
            let dir_pdf = camera
                .map(|cam| cam.pdf_we(&prev.ray).1)
                .unwrap_or_default();
            // Pinhole per-pixel importance and its pdf cancel exactly.
            (dir_pdf, Spectrum::ONE)
        }
        _ => {
            let s = prev
                .sample
                .as_ref()
                .expect("extended from a vertex without a scatter sample");
            (s.pdf, s.color * prev.cos_ns(&d) / s.pdf)
        }
    };

    let pdf_fwd = convert_density(dir_pdf, &prev.p, &info.p, &info.ng);
    let alpha = prev.alpha * factor / pending_rr;
    (pdf_fwd, alpha, prev.rr * pending_rr)
}
