//! Connection evaluation and MIS weighting.

use bidir_core::camera::{ArcCamera, Camera};
use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::light::{ArcLight, Light};
use bidir_core::material::Material;
use bidir_core::scene::Scene;
use bidir_core::spectrum::Spectrum;
use super::vertex::*;

/// Relative shrink applied to shadow-segment lengths. The spawn offset moves
/// the far endpoint's own surface up to `SHADOW_EPSILON / cos` into the
/// tested range, which an absolute epsilon cannot cover at grazing angles.
const SHADOW_SHRINK: Float = 1.0 - 1e-3;

/// An evaluated, visibility-checked connection: its unweighted contribution
/// and, for connections landing on the camera, the pixel it projects to.
pub(crate) struct Connection {
    /// Unweighted Monte-Carlo contribution.
    pub(crate) color: Spectrum,

    /// Overriding target pixel for `t = 1` samples.
    pub(crate) pixel: Option<(usize, usize)>,
}

/// Shading-normal transport asymmetry factor for evaluating a light-side
/// vertex's BRDF toward a connection direction (Veach 5.19). Identity when
/// shading and geometric normals agree.
///
/// * `v`  - The vertex.
/// * `wo` - The connection direction leaving the vertex.
fn adjoint_factor(v: &PathVertex, wo: &Vector3f) -> Float {
    let wi = -v.ray.d;
    let wi = match &v.info {
        Some(info) => -info.dir,
        None => wi,
    };
    let den = v.ng.abs_dot(&wi) * v.ns.abs_dot(wo);
    if den <= 0.0 {
        return 0.0;
    }
    v.ns.abs_dot(&wi) * v.ng.abs_dot(wo) / den
}

/// Evaluate the unweighted contribution of connecting light vertex `s - 1`
/// to eye vertex `t - 1`, including the visibility test over the connecting
/// segment. `s = 0` reads the direct-hit sample recorded as the eye path's
/// terminal vertex; it has no explicit segment, so no shadow ray is traced.
///
/// Returns `None` for zero or occluded contributions.
///
/// * `scene`      - The scene.
/// * `camera`     - The camera.
/// * `light`      - The pixel's selected light.
/// * `light_path` - The light sub-path.
/// * `eye_path`   - The eye sub-path.
/// * `s`          - Number of light vertices used.
/// * `t`          - Number of eye vertices used.
pub(crate) fn eval_path(
    scene: &Scene,
    camera: &ArcCamera,
    light: &ArcLight,
    light_path: &[PathVertex],
    eye_path: &[PathVertex],
    s: usize,
    t: usize,
) -> Option<Connection> {
    if s == 0 {
        let z = &eye_path[t - 1];
        let info = z.info.as_ref()?;
        // Emission is one-sided: the hit must face the incoming ray.
        if info.ns.dot(&info.dir) >= 0.0 {
            return None;
        }
        let color = z.alpha * light.intensity();
        return (!color.is_black()).then_some(Connection { color, pixel: None });
    }

    let zl = &light_path[s - 1];
    let ze = &eye_path[t - 1];
    if zl.specular || ze.specular {
        return None;
    }

    let seg = ze.p - zl.p;
    let dist_sq = seg.length_squared();
    if dist_sq <= MACHINE_EPSILON {
        return None;
    }
    let dist = dist_sq.sqrt();
    let dir = seg / dist;

    // Scattering (or emission) toward the eye side.
    let f_light = if s == 1 {
        if zl.ns.dot(&dir) <= 0.0 {
            return None;
        }
        light.intensity()
    } else {
        let info = zl.info.as_ref()?;
        let mat = info.material.as_ref()?;
        mat.brdf(info, dir, zl.component()) * adjoint_factor(zl, &dir)
    };
    if f_light.is_black() {
        return None;
    }

    if t == 1 {
        // Land on the camera: project the connection through the lens and
        // route it to whatever pixel it falls in.
        let cam_ray = Ray::new(ze.p, -dir);
        let (px, py) = camera.pixel_from_ray(&cam_ray)?;
        let we = camera.we(&cam_ray);
        if we <= 0.0 {
            return None;
        }
        // we = 1 / (A cos^4), dir pdf = 1 / (A cos^3); the quotient
        // recovers the camera cosine exactly.
        let cos_cam = camera.pdf_we(&cam_ray).1 / we;
        let g = cos_cam * zl.cos_ns(&dir) / dist_sq;

        let shadow = Ray::new(ze.p, -dir);
        if scene.intersect_within(&shadow, dist * SHADOW_SHRINK) {
            return None;
        }

        let color = zl.alpha * f_light * g * we;
        return (!color.is_black()).then_some(Connection {
            color,
            pixel: Some((px, py)),
        });
    }

    let f_eye = {
        let info = ze.info.as_ref()?;
        let mat = info.material.as_ref()?;
        mat.brdf(info, -dir, ze.component())
    };
    if f_eye.is_black() {
        return None;
    }

    let g = zl.cos_ns(&dir) * ze.cos_ns(&dir) / dist_sq;

    let shadow = zl.info.as_ref()?.spawn_ray(dir);
    if scene.intersect_within(&shadow, dist * SHADOW_SHRINK) {
        return None;
    }

    let color = zl.alpha * f_light * g * f_eye * ze.alpha;
    (!color.is_black()).then_some(Connection { color, pixel: None })
}

/// The power-heuristic MIS weight of the `(s, t)` decomposition of the
/// realized full path: `1 / (1 + sum of squared density ratios)` over every
/// alternative decomposition of the same path, with specular vertices
/// excluded from connecting (their terms are skipped, not zeroed).
///
/// * `camera`     - The camera.
/// * `light`      - The pixel's selected light.
/// * `pick_p`     - Probability mass the light was selected with.
/// * `light_path` - The light sub-path.
/// * `eye_path`   - The eye sub-path.
/// * `s`          - Number of light vertices used.
/// * `t`          - Number of eye vertices used.
pub(crate) fn weigh_path(
    camera: &ArcCamera,
    light: &ArcLight,
    pick_p: Float,
    light_path: &[PathVertex],
    eye_path: &[PathVertex],
    s: usize,
    t: usize,
) -> Float {
    let n = s + t;
    if n <= 1 {
        return 1.0;
    }

    // Assemble the full path's per-vertex densities, light end first.
    // `fwd[i]` is the area pdf of sampling vertex i while walking from the
    // light, `rev[i]` while walking from the eye.
    let mut fwd = vec![0.0; n];
    let mut rev = vec![0.0; n];
    let mut spec = vec![false; n];

    for (j, v) in light_path.iter().take(s).enumerate() {
        fwd[j] = v.pdf_fwd;
        rev[j] = v.pdf_rev;
        spec[j] = v.specular;
    }
    for (j, v) in eye_path.iter().take(t).enumerate() {
        let i = n - 1 - j;
        fwd[i] = v.pdf_rev;
        rev[i] = v.pdf_fwd;
        spec[i] = v.specular;
    }

    if s == 0 {
        // The whole path was sampled from the eye; reconstruct what the
        // light walk's densities at the light end would have been.
        let z0 = &eye_path[t - 1];
        fwd[0] = pick_p / light.area();
        if n >= 2 {
            let z1 = &eye_path[t - 2];
            let w = (z1.p - z0.p).normalize();
            if let Some(info) = &z0.info {
                fwd[1] = convert_density(light.pdf(info, w), &z0.p, &z1.p, &z1.ng);
            }
        }
    } else {
        // Recompute the two densities crossing the connection seam.
        let zl = &light_path[s - 1];
        let ze = &eye_path[t - 1];
        let dir = (ze.p - zl.p).normalize();

        rev[s - 1] = if t == 1 {
            let cam_ray = Ray::new(ze.p, -dir);
            convert_density(camera.pdf_we(&cam_ray).1, &ze.p, &zl.p, &zl.ng)
        } else {
            let pdf_w = ze
                .info
                .as_ref()
                .zip(ze.info.as_ref().and_then(|i| i.material.as_ref()))
                .map_or(0.0, |(info, mat)| {
                    mat.pdf(info, -dir, false, ze.component())
                });
            convert_density(pdf_w, &ze.p, &zl.p, &zl.ng)
        };

        fwd[s] = if s == 1 {
            let pdf_w = zl.info.as_ref().map_or(0.0, |info| light.pdf(info, dir));
            convert_density(pdf_w, &zl.p, &ze.p, &ze.ng)
        } else {
            let pdf_w = zl
                .info
                .as_ref()
                .zip(zl.info.as_ref().and_then(|i| i.material.as_ref()))
                .map_or(0.0, |(info, mat)| mat.pdf(info, dir, true, zl.component()));
            convert_density(pdf_w, &zl.p, &ze.p, &ze.ng)
        };
    }

    // The direct-hit strategy's realized density carries the eye walk's
    // cumulative roulette survival; alternatives are measured against it.
    let rr_norm = if s == 0 { eye_path[t - 1].rr } else { 1.0 };

    let mut sum = 0.0;

    // Alternatives with more light vertices: slide the seam toward the eye.
    let mut r = 1.0;
    for j in s..=n.saturating_sub(2) {
        r *= remap0(fwd[j]) / remap0(rev[j]);
        if !spec[j] && !spec[j + 1] {
            let ratio = r / rr_norm;
            sum += ratio * ratio;
        }
    }

    // Alternatives with fewer light vertices: slide the seam toward the
    // light; `s' = 0` is the eye path hitting the light directly.
    let mut r = 1.0;
    for j in (0..s).rev() {
        r *= remap0(rev[j]) / remap0(fwd[j]);
        let connectable = if j == 0 {
            !spec[0]
        } else {
            !spec[j] && !spec[j - 1]
        };
        if connectable {
            let ratio = r / rr_norm;
            sum += ratio * ratio;
        }
    }

    1.0 / (1.0 + sum)
}
