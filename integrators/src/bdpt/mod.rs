//! Bidirectional path tracing.

use bidir_core::camera::{ArcCamera, Camera};
use bidir_core::common::*;
use bidir_core::film::Film;
use bidir_core::rng::Rng;
use bidir_core::scene::Scene;
use bidir_core::spectrum::Spectrum;
use crate::roulette::{RouletteMode, RouletteStats};
use crossbeam_channel::Receiver;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

mod connect;
mod vertex;
mod walk;

use connect::*;
use vertex::Terminal;
use walk::*;

/// Sliding-window size of the per-pixel roulette calibrator.
const ROULETTE_WINDOW: usize = 64;

/// The shared accumulation state workers merge completed frames into.
struct Estimator {
    /// Samples accumulated at their own pixel (`t >= 2` plus direct hits).
    eye: Film,

    /// Samples projected through the camera (`t = 1`), which can land on
    /// any pixel.
    light: Film,

    /// Number of frames merged.
    frames: usize,
}

/// Bidirectional path-tracing renderer. Each worker repeatedly renders a
/// full frame into private buffers and merges it into the shared estimator;
/// the two per-frame images stay separate until a snapshot sums them.
pub struct BdptIntegrator {
    /// The camera.
    camera: ArcCamera,

    /// Image width in pixels.
    width: usize,

    /// Image height in pixels.
    height: usize,

    /// Total frames to render.
    frames: usize,

    /// Worker count.
    workers: usize,

    /// Roulette policy.
    roulette_mode: RouletteMode,

    /// Cooperative cancellation flag, polled between pixels.
    stopping: AtomicBool,

    /// Per-pixel roulette calibration windows, shared across workers.
    stats: Vec<Mutex<RouletteStats>>,

    /// The shared estimator.
    estimator: Mutex<Estimator>,
}

impl BdptIntegrator {
    /// Create a new `BdptIntegrator` with one worker per hardware thread.
    ///
    /// * `camera`        - The camera.
    /// * `frames`        - Total frames to render.
    /// * `roulette_mode` - Roulette policy.
    pub fn new(camera: ArcCamera, frames: usize, roulette_mode: RouletteMode) -> Self {
        let (width, height) = camera.resolution();
        let stats = (0..width * height)
            .map(|_| Mutex::new(RouletteStats::new(ROULETTE_WINDOW)))
            .collect();
        Self {
            camera,
            width,
            height,
            frames,
            workers: num_cpus::get(),
            roulette_mode,
            stopping: AtomicBool::new(false),
            stats,
            estimator: Mutex::new(Estimator {
                eye: Film::new(width, height),
                light: Film::new(width, height),
                frames: 0,
            }),
        }
    }

    /// Override the worker count.
    ///
    /// * `workers` - Number of render threads, at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Render all frames, blocking until they are merged or `stop` is
    /// observed.
    ///
    /// * `scene` - The scene.
    pub fn render(&self, scene: &Scene) {
        let (tx, rx) = crossbeam_channel::unbounded();
        for frame in 0..self.frames {
            let _ = tx.send(frame);
        }
        drop(tx);

        info!(
            "Rendering {} frames at {}x{} with {} workers",
            self.frames, self.width, self.height, self.workers
        );

        thread::scope(|scope| {
            for worker in 0..self.workers {
                let rx = rx.clone();
                scope.spawn(move || self.render_loop(scene, worker, rx));
            }
        });
    }

    /// Request cancellation. Workers abandon their in-progress frames
    /// without merging them.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Number of frames merged so far.
    pub fn frames_rendered(&self) -> usize {
        self.estimator.lock().unwrap().frames
    }

    /// The combined (eye plus light image) accumulation and the number of
    /// frames it holds. Taken under the merge lock, so it never shows a
    /// partially merged frame.
    pub fn snapshot(&self) -> (Film, usize) {
        let estimator = self.estimator.lock().unwrap();
        let mut combined = estimator.eye.clone();
        combined.merge(&estimator.light);
        (combined, estimator.frames)
    }

    /// One worker's render loop: pull frame indices until the queue drains
    /// or cancellation is observed.
    ///
    /// * `scene`  - The scene.
    /// * `worker` - Worker index (for logging).
    /// * `rx`     - Frame-index queue.
    fn render_loop(&self, scene: &Scene, worker: usize, rx: Receiver<usize>) {
        for frame in rx.iter() {
            match self.render_frame(scene, frame) {
                Some((eye, light)) => {
                    let mut estimator = self.estimator.lock().unwrap();
                    estimator.eye.merge(&eye);
                    estimator.light.merge(&light);
                    estimator.frames += 1;
                    debug!("Worker {worker} merged frame {frame}");
                }
                None => {
                    info!("Worker {worker} abandoning frame {frame}");
                    break;
                }
            }
        }
    }

    /// Render one full frame into private buffers, or `None` if
    /// cancellation interrupted it (partial frames are discarded).
    ///
    /// * `scene` - The scene.
    /// * `frame` - Frame index, which seeds the per-pixel generators.
    fn render_frame(&self, scene: &Scene, frame: usize) -> Option<(Film, Film)> {
        let mut eye_film = Film::new(self.width, self.height);
        let mut light_film = Film::new(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_stopping() {
                    return None;
                }
                let pixel = y * self.width + x;
                let mut rng = Rng::new((frame * self.width * self.height + pixel) as u64);
                self.render_pixel(scene, x, y, &mut rng, &mut eye_film, &mut light_film);
            }
        }

        Some((eye_film, light_film))
    }

    /// Build one pixel sample's two sub-paths, evaluate every connection
    /// strategy, and accumulate the weighted contributions. All vertices
    /// live only for the duration of this call.
    ///
    /// * `scene`      - The scene.
    /// * `x`          - Pixel x-coordinate.
    /// * `y`          - Pixel y-coordinate.
    /// * `rng`        - This pixel sample's random source.
    /// * `eye_film`   - The frame's eye image.
    /// * `light_film` - The frame's light image.
    fn render_pixel(
        &self,
        scene: &Scene,
        x: usize,
        y: usize,
        rng: &mut Rng,
        eye_film: &mut Film,
        light_film: &mut Film,
    ) {
        let (light, pick_p) = match scene.pick_light(rng.uniform_float()) {
            Some(picked) => picked,
            None => return,
        };

        let pixel = y * self.width + x;
        let rr = match self.roulette_mode {
            RouletteMode::Fixed(p) => p,
            RouletteMode::Adaptive => self.stats[pixel].lock().unwrap().threshold(),
        };

        let ctx = WalkContext {
            scene,
            light: &light,
            pick_p,
            rr,
        };
        let (eye_path, terminal) = eye_walk(&ctx, &self.camera, x, y, rng);
        let (light_path, _) = light_walk(&ctx, rng);

        let mut rays = (eye_path.len() + light_path.len()) as u32;
        let mut pixel_sum = Spectrum::ZERO;

        // The terminal light vertex only serves the s = 0 strategy; it is
        // not a connectable surface.
        let eye_surface_len = if terminal == Terminal::DirectLightHit {
            eye_path.len() - 1
        } else {
            eye_path.len()
        };

        if terminal == Terminal::DirectLightHit {
            let t = eye_path.len();
            if let Some(c) = eval_path(scene, &self.camera, &light, &light_path, &eye_path, 0, t) {
                let w = weigh_path(&self.camera, &light, pick_p, &light_path, &eye_path, 0, t);
                eye_film.add_color(x, y, c.color * w);
                pixel_sum += c.color * w;
            }
        }

        for s in 1..=light_path.len() {
            for t in 1..=eye_surface_len {
                rays += 1;
                let c =
                    match eval_path(scene, &self.camera, &light, &light_path, &eye_path, s, t) {
                        Some(c) => c,
                        None => continue,
                    };
                let w = weigh_path(&self.camera, &light, pick_p, &light_path, &eye_path, s, t);
                match c.pixel {
                    Some((px, py)) => {
                        // The camera importance is normalized over the full
                        // film area, which already folds in the one light
                        // path traced per pixel; no extra scale.
                        light_film.add_color(px, py, c.color * w);
                    }
                    None => {
                        eye_film.add_color(x, y, c.color * w);
                        pixel_sum += c.color * w;
                    }
                }
            }
        }

        self.stats[pixel]
            .lock()
            .unwrap()
            .add_sample(pixel_sum.y(), rays);
    }
}

#[cfg(test)]
mod tests {
    use bidir_accelerators::BruteForce;
    use bidir_cameras::PinholeCamera;
    use bidir_core::geometry::*;
    use bidir_core::interaction::IntersectionInfo;
    use bidir_core::light::{ArcLight, Light};
    use bidir_core::material::{ArcMaterial, ScatterComponent, ScatterSample};
    use bidir_core::sampling::cosine_hemisphere_pdf;
    use bidir_core::scene::SceneBuilder;
    use bidir_lights::DiffuseAreaLight;
    use bidir_materials::Matte;
    use bidir_shapes::Quad;
    use float_cmp::approx_eq;
    use std::sync::Arc;
    use super::*;
    use super::vertex::{convert_density, PathVertex, VertexKind};

    fn camera() -> ArcCamera {
        Arc::new(PinholeCamera::new(
            Point3f::new(0.0, 1.0, -4.0),
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            PI / 3.0,
            64,
            48,
        ))
    }

    /// 2x2 quad at y = 3 emitting downward.
    fn area_light() -> ArcLight {
        Arc::new(DiffuseAreaLight::new(
            Point3f::new(-1.0, 3.0, -1.0),
            Vector3f::new(2.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.0, 2.0),
            Spectrum::splat(5.0),
        ))
    }

    fn surface_vertex(
        p: Point3f,
        n: Normal3f,
        dir_in: Vector3f,
        mat: &ArcMaterial,
        sample: Option<ScatterSample>,
        pdf_fwd: Float,
        pdf_rev: Float,
    ) -> PathVertex {
        let ray = sample.as_ref().map_or(Ray::new(p, dir_in), |s| s.ray);
        PathVertex {
            kind: VertexKind::Surface,
            p,
            ns: n,
            ng: n,
            info: Some(IntersectionInfo {
                p,
                ns: n,
                ng: n,
                dir: dir_in,
                uv: Point2f::default(),
                material: Some(Arc::clone(mat)),
            }),
            sample,
            ray,
            alpha: Spectrum::ONE,
            pdf_fwd,
            pdf_rev,
            specular: false,
            rr: 1.0,
        }
    }

    fn camera_vertex(p: Point3f, d: Vector3f) -> PathVertex {
        let n = Normal3f::from(d);
        PathVertex {
            kind: VertexKind::Camera,
            p,
            ns: n,
            ng: n,
            info: None,
            sample: None,
            ray: Ray::new(p, d),
            alpha: Spectrum::ONE,
            pdf_fwd: 1.0,
            pdf_rev: 1.0,
            specular: false,
            rr: 1.0,
        }
    }

    fn light_vertex(
        p: Point3f,
        n: Normal3f,
        dir: Vector3f,
        sample: Option<ScatterSample>,
        pdf_fwd: Float,
        pdf_rev: Float,
        kind_ray: Ray,
    ) -> PathVertex {
        PathVertex {
            kind: VertexKind::Light,
            p,
            ns: n,
            ng: n,
            info: Some(IntersectionInfo {
                p,
                ns: n,
                ng: n,
                dir,
                uv: Point2f::default(),
                material: None,
            }),
            sample,
            ray: kind_ray,
            alpha: Spectrum::ONE,
            pdf_fwd,
            pdf_rev,
            specular: false,
            rr: 1.0,
        }
    }

    fn scatter(pdf: Float, rpdf: Float, ray: Ray) -> ScatterSample {
        ScatterSample {
            color: Spectrum::splat(INV_PI * 0.6),
            ray,
            pdf,
            rpdf,
            specular: false,
            component: ScatterComponent::DIFFUSE,
        }
    }

    /// Every decomposition of the same realized 3-vertex path
    /// (light point, diffuse floor point, camera) must have MIS weights
    /// summing to one.
    #[test]
    fn mis_weights_sum_to_one_over_decompositions() {
        let cam = camera();
        let light = area_light();
        let mat: ArcMaterial = Arc::new(Matte::new(Spectrum::splat(0.6)));

        let c = Point3f::new(0.0, 1.0, -4.0);
        let p0 = Point3f::new(0.2, 3.0, 0.3); // on the light
        let p1 = Point3f::new(0.0, 0.0, 0.0); // on the floor
        let nl = Normal3f::new(0.0, -1.0, 0.0);
        let nf = Normal3f::new(0.0, 1.0, 0.0);

        let d01 = (p1 - p0).normalize(); // light -> floor
        let dcam = (p1 - c).normalize(); // camera -> floor
        let d12 = -dcam; // floor -> camera

        // Densities along the path, computed once from the same models the
        // integrator consults.
        let a_l = 1.0 / light.area(); // pick probability is 1
        let origin_info = IntersectionInfo {
            p: p0,
            ns: nl,
            ng: nl,
            dir: d01,
            uv: Point2f::default(),
            material: None,
        };
        let pl_e = light.pdf(&origin_info, d01);
        let pm_l = cosine_hemisphere_pdf(nf.abs_dot(&-d01)); // floor toward light
        let pm_c = cosine_hemisphere_pdf(nf.abs_dot(&d12)); // floor toward camera
        let pw = cam.pdf_we(&Ray::new(c, dcam)).1;

        let fwd1 = convert_density(pl_e, &p0, &p1, &nf);
        let rev1 = convert_density(pw, &c, &p1, &nf);
        let rev0 = convert_density(pm_l, &p1, &p0, &nl);

        let e0 = || camera_vertex(c, dcam);

        // (s = 2, t = 1): full light walk connected to the camera.
        let w21 = {
            let l0 = light_vertex(
                p0,
                nl,
                d01,
                Some(ScatterSample {
                    color: light.intensity(),
                    ray: Ray::new(p0, d01),
                    pdf: pl_e,
                    rpdf: 0.0,
                    specular: false,
                    component: ScatterComponent::all(),
                }),
                a_l,
                rev0,
                Ray::new(p0, d01),
            );
            let l1 = surface_vertex(
                p1,
                nf,
                d01,
                &mat,
                Some(scatter(pm_c, pm_l, Ray::new(p1, d12))),
                fwd1,
                0.0,
            );
            weigh_path(&cam, &light, 1.0, &[l0, l1], &[e0()], 2, 1)
        };

        // (s = 1, t = 2): light origin connected to the eye's floor vertex.
        let w12 = {
            let l0 = light_vertex(
                p0,
                nl,
                d01,
                Some(ScatterSample {
                    color: light.intensity(),
                    ray: Ray::new(p0, d01),
                    pdf: pl_e,
                    rpdf: 0.0,
                    specular: false,
                    component: ScatterComponent::all(),
                }),
                a_l,
                0.0,
                Ray::new(p0, d01),
            );
            let e1 = surface_vertex(
                p1,
                nf,
                dcam,
                &mat,
                Some(scatter(pm_l, pm_c, Ray::new(p1, -d01))),
                rev1,
                0.0,
            );
            weigh_path(&cam, &light, 1.0, &[l0], &[e0(), e1], 1, 2)
        };

        // (s = 0, t = 3): the eye path hit the light directly.
        let w03 = {
            let e1 = surface_vertex(
                p1,
                nf,
                dcam,
                &mat,
                Some(scatter(pm_l, pm_c, Ray::new(p1, -d01))),
                rev1,
                0.0,
            );
            let z0 = light_vertex(
                p0,
                nl,
                -d01,
                None,
                rev0,
                0.0,
                Ray::new(p0, -d01),
            );
            weigh_path(&cam, &light, 1.0, &[], &[e0(), e1, z0], 0, 3)
        };

        assert!(w21 > 0.0 && w12 > 0.0 && w03 > 0.0);
        assert!(
            approx_eq!(Float, w21 + w12 + w03, 1.0, epsilon = 1e-3),
            "weights {w21} + {w12} + {w03} = {}",
            w21 + w12 + w03
        );
    }

    /// The 2-vertex path (camera looking straight at the light) has exactly
    /// 2 decompositions; their weights are complementary.
    #[test]
    fn mis_weights_sum_to_one_for_direct_view() {
        let cam = camera();
        let light = area_light();

        let c = Point3f::new(0.0, 1.0, -4.0);
        let p0 = Point3f::new(0.3, 3.0, 0.1);
        let nl = Normal3f::new(0.0, -1.0, 0.0);
        let dc0 = (p0 - c).normalize();

        let a_l = 1.0 / light.area();
        let q = convert_density(cam.pdf_we(&Ray::new(c, dc0)).1, &c, &p0, &nl);

        let e0 = || camera_vertex(c, dc0);

        let w02 = {
            let z0 = light_vertex(p0, nl, dc0, None, q, 0.0, Ray::new(p0, dc0));
            weigh_path(&cam, &light, 1.0, &[], &[e0(), z0], 0, 2)
        };
        let w11 = {
            let l0 = light_vertex(
                p0,
                nl,
                dc0,
                Some(ScatterSample {
                    color: light.intensity(),
                    ray: Ray::new(p0, -dc0),
                    pdf: INV_PI,
                    rpdf: 0.0,
                    specular: false,
                    component: ScatterComponent::all(),
                }),
                a_l,
                0.0,
                Ray::new(p0, -dc0),
            );
            weigh_path(&cam, &light, 1.0, &[l0], &[e0()], 1, 1)
        };

        assert!(approx_eq!(Float, w02 + w11, 1.0, epsilon = 1e-4));
    }

    /// A floor and ceiling facing each other, lit by a small panel just
    /// below the ceiling, so light walks can bounce several times.
    fn enclosed_scene() -> (Scene, ArcLight) {
        let mat: ArcMaterial = Arc::new(Matte::new(Spectrum::splat(0.8)));
        let light: ArcLight = Arc::new(DiffuseAreaLight::new(
            Point3f::new(-0.5, 2.4, -0.5),
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.0, 1.0),
            Spectrum::splat(5.0),
        ));
        let mut builder = SceneBuilder::new();
        builder.add_primitive(Arc::new(Quad::new(
            Point3f::new(-3.0, 0.0, -3.0),
            Vector3f::new(0.0, 0.0, 6.0),
            Vector3f::new(6.0, 0.0, 0.0),
            Arc::clone(&mat),
        )));
        builder.add_primitive(Arc::new(Quad::new(
            Point3f::new(-3.0, 2.5, -3.0),
            Vector3f::new(6.0, 0.0, 0.0),
            Vector3f::new(0.0, 0.0, 6.0),
            Arc::clone(&mat),
        )));
        builder.add_light(Arc::clone(&light));
        (builder.build(Box::new(BruteForce::new())), light)
    }

    /// A light-to-floor connection whose segment meets the endpoints at a
    /// grazing angle must not be occluded by the endpoint surfaces
    /// themselves: the spawn offset shifts where the far surface is hit,
    /// and the shadow range has to tolerate that shift.
    #[test]
    fn connection_shadow_test_excludes_endpoint_surfaces() {
        let (scene, light) = enclosed_scene();
        let cam = camera();
        let mat: ArcMaterial = Arc::new(Matte::new(Spectrum::splat(0.8)));

        let p0 = Point3f::new(0.2, 2.4, 0.1); // on the light panel
        let p1 = Point3f::new(2.0, 0.0, 1.5); // on the floor, well off axis
        let nl = Normal3f::new(0.0, -1.0, 0.0);
        let nf = Normal3f::new(0.0, 1.0, 0.0);

        let c = Point3f::new(0.0, 1.0, -4.0);
        let d01 = (p1 - p0).normalize();
        let dcam = (p1 - c).normalize();

        let l0 = light_vertex(
            p0,
            nl,
            d01,
            None,
            1.0 / light.area(),
            0.0,
            Ray::new(p0, d01),
        );
        let e1 = surface_vertex(
            p1,
            nf,
            dcam,
            &mat,
            Some(scatter(INV_PI, INV_PI, Ray::new(p1, -d01))),
            1.0,
            0.0,
        );
        let eye_path = [camera_vertex(c, dcam), e1];

        let conn = eval_path(&scene, &cam, &light, &[l0], &eye_path, 1, 2)
            .expect("unoccluded connection rejected");
        assert!(!conn.color.is_black());
    }

    #[test]
    fn eye_walk_in_empty_scene_escapes() {
        let builder = SceneBuilder::new();
        let scene = builder.build(Box::new(BruteForce::new()));
        let light = area_light();
        let cam = camera();
        let ctx = WalkContext {
            scene: &scene,
            light: &light,
            pick_p: 1.0,
            rr: 0.7,
        };
        let mut rng = Rng::new(1);
        let (path, terminal) = eye_walk(&ctx, &cam, 32, 24, &mut rng);
        assert_eq!(path.len(), 1);
        assert_eq!(terminal, Terminal::Escaped);
    }

    /// The walker's throughput bookkeeping must make the estimate
    /// independent of the roulette continuation probability: the mean
    /// compensated throughput at a fixed depth agrees across two very
    /// different continuation probabilities.
    #[test]
    fn roulette_compensation_keeps_throughput_unbiased() {
        let (scene, light) = enclosed_scene();

        let mean_alpha_at_depth_4 = |rr: Float, seed_base: u64| -> Float {
            let ctx = WalkContext {
                scene: &scene,
                light: &light,
                pick_p: 1.0,
                rr,
            };
            let walks = 8000;
            let mut sum = 0.0;
            for i in 0..walks {
                let mut rng = Rng::new(seed_base + i);
                let (path, _) = light_walk(&ctx, &mut rng);
                if path.len() >= 4 {
                    sum += path[3].alpha.y();
                }
            }
            sum / walks as Float
        };

        let low = mean_alpha_at_depth_4(0.4, 1);
        let high = mean_alpha_at_depth_4(0.9, 100_000);
        assert!(low > 0.0 && high > 0.0);
        let ratio = low / high;
        assert!(
            (0.75..=1.25).contains(&ratio),
            "compensated throughput diverged: {low} vs {high}"
        );
    }
}
