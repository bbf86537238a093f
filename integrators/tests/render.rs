//! End-to-end render tests against analytically known radiance.

use bidir_accelerators::KdTree;
use bidir_cameras::PinholeCamera;
use bidir_core::camera::{ArcCamera, Camera};
use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::light::ArcLight;
use bidir_core::material::ArcMaterial;
use bidir_core::scene::{Scene, SceneBuilder};
use bidir_core::spectrum::Spectrum;
use bidir_integrators::{BdptIntegrator, RouletteMode};
use bidir_lights::DiffuseAreaLight;
use bidir_materials::Matte;
use bidir_shapes::Quad;
use std::sync::Arc;

const WIDTH: usize = 32;
const HEIGHT: usize = 24;
const ALBEDO: Float = 0.6;
const RADIANCE: Float = 10.0;

/// A 4x4 diffuse floor under a 1x1 area light panel. The light's back is
/// unlit and its front absorbs, so the floor receives direct illumination
/// only and its outgoing radiance has a closed form.
fn two_patch_scene() -> (Scene, ArcLight) {
    let mat: ArcMaterial = Arc::new(Matte::new(Spectrum::splat(ALBEDO)));
    let light: ArcLight = Arc::new(DiffuseAreaLight::new(
        Point3f::new(-0.5, 2.0, -0.5),
        Vector3f::new(1.0, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
        Spectrum::splat(RADIANCE),
    ));

    let mut builder = SceneBuilder::new();
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(-2.0, 0.0, -2.0),
        Vector3f::new(0.0, 0.0, 4.0),
        Vector3f::new(4.0, 0.0, 0.0),
        Arc::clone(&mat),
    )));
    builder.add_light(Arc::clone(&light));
    (builder.build(Box::new(KdTree::new())), light)
}

fn test_camera() -> ArcCamera {
    Arc::new(PinholeCamera::new(
        Point3f::new(0.0, 0.8, -2.2),
        Point3f::new(0.0, 0.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        1.0,
        WIDTH,
        HEIGHT,
    ))
}

/// Irradiance at a floor point from the light panel, by deterministic
/// quadrature of the form-factor integral.
fn quadrature_irradiance(p: Point3f) -> Float {
    let grid = 64;
    let cell = 1.0 / grid as Float;
    let da = cell * cell;
    let mut e = 0.0;
    for i in 0..grid {
        for j in 0..grid {
            let q = Point3f::new(
                -0.5 + (i as Float + 0.5) * cell,
                2.0,
                -0.5 + (j as Float + 0.5) * cell,
            );
            let d = q - p;
            let r_sq = d.length_squared();
            let r = r_sq.sqrt();
            let cos_floor = d.y / r;
            let cos_light = d.y / r; // panel faces straight down
            e += RADIANCE * cos_floor * cos_light / r_sq * da;
        }
    }
    e
}

#[test]
fn converges_to_analytic_direct_illumination() {
    let (scene, _light) = two_patch_scene();
    let camera = test_camera();

    // Where the probed pixel's center ray lands on the floor.
    let probe = (WIDTH / 2, HEIGHT / 2);
    let ray = camera.ray_from_pixel(probe.0, probe.1, Point2f::new(0.5, 0.5), Point2f::default());
    let t = -ray.o.y / ray.d.y;
    assert!(t > 0.0, "probe ray must reach the floor");
    let hit = ray.at(t);

    let expected = ALBEDO * INV_PI * quadrature_irradiance(hit);
    assert!(expected > 0.0);

    let frames = 100;
    let integrator = BdptIntegrator::new(camera, frames, RouletteMode::Fixed(0.7));
    integrator.render(&scene);

    let (film, rendered) = integrator.snapshot();
    assert_eq!(rendered, frames);

    let value = film.pixel(probe.0, probe.1).y() / frames as Float;
    let rel_err = (value - expected).abs() / expected;
    assert!(
        rel_err < 0.3,
        "pixel estimate {value} vs analytic {expected} (rel err {rel_err})"
    );
}

#[test]
fn adaptive_roulette_also_converges() {
    let (scene, _light) = two_patch_scene();
    let camera = test_camera();

    let probe = (WIDTH / 2, HEIGHT / 2);
    let ray = camera.ray_from_pixel(probe.0, probe.1, Point2f::new(0.5, 0.5), Point2f::default());
    let hit = ray.at(-ray.o.y / ray.d.y);
    let expected = ALBEDO * INV_PI * quadrature_irradiance(hit);

    let frames = 100;
    let integrator = BdptIntegrator::new(camera, frames, RouletteMode::Adaptive);
    integrator.render(&scene);

    let (film, rendered) = integrator.snapshot();
    assert_eq!(rendered, frames);

    let value = film.pixel(probe.0, probe.1).y() / frames as Float;
    let rel_err = (value - expected).abs() / expected;
    assert!(
        rel_err < 0.35,
        "pixel estimate {value} vs analytic {expected} (rel err {rel_err})"
    );
}

#[test]
fn stop_before_render_merges_nothing() {
    let (scene, _light) = two_patch_scene();
    let integrator = BdptIntegrator::new(test_camera(), 1000, RouletteMode::default());
    integrator.stop();
    integrator.render(&scene);

    let (_, frames) = integrator.snapshot();
    assert_eq!(frames, 0);
    assert_eq!(integrator.frames_rendered(), 0);
}
