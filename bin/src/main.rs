//! Command-line renderer for the built-in box scene.

#[macro_use]
extern crate log;

use bidir_accelerators::KdTree;
use bidir_cameras::PinholeCamera;
use bidir_core::camera::ArcCamera;
use bidir_core::common::*;
use bidir_core::geometry::*;
use bidir_core::material::ArcMaterial;
use bidir_core::scene::{Scene, SceneBuilder};
use bidir_core::spectrum::Spectrum;
use bidir_integrators::{BdptIntegrator, RouletteMode};
use bidir_lights::DiffuseAreaLight;
use bidir_materials::{Matte, Mirror};
use bidir_shapes::{Cuboid, Quad, Sphere};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about = "Bidirectional path tracer")]
struct Args {
    /// Image width in pixels.
    #[arg(long, default_value_t = 512)]
    width: usize,

    /// Image height in pixels.
    #[arg(long, default_value_t = 384)]
    height: usize,

    /// Number of frames to accumulate.
    #[arg(short, long, default_value_t = 128)]
    frames: usize,

    /// Output PNG path.
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Fixed roulette continuation probability.
    #[arg(long, default_value_t = 0.7)]
    roulette: Float,

    /// Calibrate the continuation probability per pixel instead.
    #[arg(long)]
    adaptive: bool,

    /// Worker threads; 0 means one per hardware thread.
    #[arg(long, default_value_t = 0)]
    workers: usize,
}

/// A box open toward the camera: colored side walls, a mirror sphere, a
/// matte block, and a light panel just below the ceiling.
fn build_scene() -> Scene {
    let white: ArcMaterial = Arc::new(Matte::new(Spectrum::splat(0.73)));
    let red: ArcMaterial = Arc::new(Matte::new(Spectrum::new(0.63, 0.065, 0.05)));
    let green: ArcMaterial = Arc::new(Matte::new(Spectrum::new(0.14, 0.45, 0.09)));
    let mirror: ArcMaterial = Arc::new(Mirror::new(Spectrum::splat(0.9)));

    let mut builder = SceneBuilder::new();

    // Floor.
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(-1.4, 0.0, -1.4),
        Vector3f::new(0.0, 0.0, 2.8),
        Vector3f::new(2.8, 0.0, 0.0),
        Arc::clone(&white),
    )));
    // Ceiling.
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(-1.4, 2.8, -1.4),
        Vector3f::new(2.8, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 2.8),
        Arc::clone(&white),
    )));
    // Back wall.
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(-1.4, 0.0, 1.4),
        Vector3f::new(0.0, 2.8, 0.0),
        Vector3f::new(2.8, 0.0, 0.0),
        Arc::clone(&white),
    )));
    // Left wall.
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(-1.4, 0.0, -1.4),
        Vector3f::new(0.0, 2.8, 0.0),
        Vector3f::new(0.0, 0.0, 2.8),
        red,
    )));
    // Right wall.
    builder.add_primitive(Arc::new(Quad::new(
        Point3f::new(1.4, 0.0, -1.4),
        Vector3f::new(0.0, 0.0, 2.8),
        Vector3f::new(0.0, 2.8, 0.0),
        green,
    )));

    builder.add_primitive(Arc::new(Sphere::new(
        Point3f::new(-0.6, 0.5, 0.4),
        0.5,
        mirror,
    )));
    builder.add_primitive(Arc::new(Cuboid::new(
        Bounds3f::new(Point3f::new(0.15, 0.0, -0.2), Point3f::new(0.95, 1.0, 0.6)),
        white,
    )));

    builder.add_light(Arc::new(DiffuseAreaLight::new(
        Point3f::new(-0.45, 2.79, -0.45),
        Vector3f::new(0.9, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 0.9),
        Spectrum::splat(12.0),
    )));

    builder.build(Box::new(KdTree::new()))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let scene = build_scene();
    let camera: ArcCamera = Arc::new(PinholeCamera::new(
        Point3f::new(0.0, 1.4, -4.4),
        Point3f::new(0.0, 1.4, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        PI / 4.0,
        args.width,
        args.height,
    ));

    let mode = if args.adaptive {
        RouletteMode::Adaptive
    } else {
        RouletteMode::Fixed(clamp(args.roulette, 0.05, 1.0))
    };
    let mut integrator = BdptIntegrator::new(camera, args.frames, mode);
    if args.workers > 0 {
        integrator = integrator.with_workers(args.workers);
    }

    let bar = ProgressBar::new(args.frames as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} frames")
    {
        bar.set_style(style);
    }

    thread::scope(|scope| {
        let handle = scope.spawn(|| integrator.render(&scene));
        while !handle.is_finished() {
            bar.set_position(integrator.frames_rendered() as u64);
            thread::sleep(Duration::from_millis(200));
        }
    });
    bar.finish();

    let (film, frames) = integrator.snapshot();
    if frames == 0 {
        error!("No frames rendered");
        std::process::exit(1);
    }

    let scale = 1.0 / frames as Float;
    match film.write_png(&args.output, scale) {
        Ok(()) => info!("Wrote {} ({frames} frames)", args.output.display()),
        Err(e) => {
            error!("Failed to write {}: {e}", args.output.display());
            std::process::exit(1);
        }
    }
}
