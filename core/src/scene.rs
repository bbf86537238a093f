//! Scene

use crate::common::*;
use crate::geometry::*;
use crate::light::{ArcLight, Light};
use crate::primitive::{ArcPrimitive, Partitioning};
use std::sync::Arc;

/// What a scene ray query hit: a model primitive or a light surface. The two
/// are mutually exclusive.
#[derive(Clone)]
pub enum SceneSurface {
    Primitive(ArcPrimitive),
    Light(ArcLight),
}

/// The result of a scene intersection query.
#[derive(Clone)]
pub struct SceneHit {
    /// Parametric distance of the hit.
    pub t: Float,

    /// The surface that was hit.
    pub surface: SceneSurface,
}

/// Collects primitives and lights during scene setup. Registration is only
/// possible through the builder; `build` freezes the set into a `Scene` that
/// renderers can share immutably.
#[derive(Default)]
pub struct SceneBuilder {
    primitives: Vec<ArcPrimitive>,
    lights: Vec<ArcLight>,
}

impl SceneBuilder {
    /// Create an empty `SceneBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model primitive.
    ///
    /// * `primitive` - The primitive.
    pub fn add_primitive(&mut self, primitive: ArcPrimitive) -> &mut Self {
        self.primitives.push(primitive);
        self
    }

    /// Register a light.
    ///
    /// * `light` - The light.
    pub fn add_light(&mut self, light: ArcLight) -> &mut Self {
        self.lights.push(light);
        self
    }

    /// Freeze the collected geometry into a `Scene`, building the given
    /// partitioning structure over the model primitives.
    ///
    /// * `partitioning` - The acceleration structure to build.
    pub fn build(self, mut partitioning: Box<dyn Partitioning>) -> Scene {
        info!(
            "Building scene: {} primitives, {} lights",
            self.primitives.len(),
            self.lights.len()
        );
        partitioning.build(self.primitives);
        Scene {
            partitioning,
            lights: self.lights,
        }
    }
}

/// A frozen scene: the partitioning structure over the model primitives plus
/// the light set, combined into a single intersection surface.
pub struct Scene {
    partitioning: Box<dyn Partitioning>,
    lights: Vec<ArcLight>,
}

impl Scene {
    /// Returns the registered lights.
    pub fn lights(&self) -> &[ArcLight] {
        &self.lights
    }

    /// Returns the bounding box of the scene's model geometry.
    pub fn world_bound(&self) -> Bounds3f {
        self.partitioning.world_bound()
    }

    /// Returns the globally closest hit along the ray over both the model
    /// primitives and the light surfaces, or `None`. The ray direction must
    /// be normalized.
    ///
    /// * `ray` - The ray.
    pub fn intersect(&self, ray: &Ray) -> Option<SceneHit> {
        let mut hit = self
            .partitioning
            .intersect(ray, SHADOW_EPSILON, INFINITY, true)
            .map(|(t, prim)| SceneHit {
                t,
                surface: SceneSurface::Primitive(prim),
            });

        for light in &self.lights {
            if let Some(t) = light.intersect(ray) {
                if t > SHADOW_EPSILON && hit.as_ref().map_or(true, |h| t < h.t) {
                    hit = Some(SceneHit {
                        t,
                        surface: SceneSurface::Light(Arc::clone(light)),
                    });
                }
            }
        }

        hit
    }

    /// Shadow query: returns `true` if anything occludes the ray strictly
    /// inside `(0, t_max)`. Early-exits on the first hit found; the verdict
    /// always matches what the nearest-hit query would imply. The ray
    /// direction must be normalized so `t_max` is a distance.
    ///
    /// * `ray`   - The ray.
    /// * `t_max` - Length of the segment to test.
    pub fn intersect_within(&self, ray: &Ray, t_max: Float) -> bool {
        let t_far = t_max - SHADOW_EPSILON;
        if t_far <= SHADOW_EPSILON {
            return false;
        }

        if self
            .partitioning
            .intersect(ray, SHADOW_EPSILON, t_far, false)
            .is_some()
        {
            return true;
        }

        self.lights.iter().any(|light| {
            light
                .intersect(ray)
                .map_or(false, |t| t > SHADOW_EPSILON && t < t_far)
        })
    }

    /// Discrete light selection, uniform over the light set. Returns the
    /// chosen light and the probability mass it was chosen with, or `None`
    /// for a scene without lights.
    ///
    /// * `u` - A uniform random value in `[0, 1)`.
    pub fn pick_light(&self, u: Float) -> Option<(ArcLight, Float)> {
        let n = self.lights.len();
        if n == 0 {
            return None;
        }
        let idx = min((u * n as Float) as usize, n - 1);
        Some((Arc::clone(&self.lights[idx]), 1.0 / n as Float))
    }

    /// Returns the probability mass `pick_light` assigns to any single light.
    pub fn light_pick_probability(&self) -> Float {
        if self.lights.is_empty() {
            0.0
        } else {
            1.0 / self.lights.len() as Float
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interaction::IntersectionInfo;
    use crate::light::LightSample;
    use crate::primitive::Primitive;
    use crate::rng::Rng;
    use crate::spectrum::Spectrum;
    use super::*;

    /// Minimal linear-scan partitioning for scene-facade tests.
    struct ScanPartitioning {
        primitives: Vec<ArcPrimitive>,
    }

    impl Partitioning for ScanPartitioning {
        fn build(&mut self, primitives: Vec<ArcPrimitive>) {
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
                    if t >= t_min && t <= t_max && best.as_ref().map_or(true, |(bt, _)| t < *bt) {
                        best = Some((t, Arc::clone(prim)));
                        if !nearest {
                            break;
                        }
                    }
                }
            }
            best
        }

        fn world_bound(&self) -> Bounds3f {
            self.primitives
                .iter()
                .fold(Bounds3f::EMPTY, |b, p| b.union(&p.world_bound()))
        }
    }

    /// An infinite plane `z = const` facing +Z.
    struct PlaneZ {
        z: Float,
    }

    impl Primitive for PlaneZ {
        fn world_bound(&self) -> Bounds3f {
            Bounds3f::new(
                Point3f::new(-100.0, -100.0, self.z),
                Point3f::new(100.0, 100.0, self.z),
            )
        }

        fn clipped_bound(&self, clip: &Bounds3f) -> Option<Bounds3f> {
            self.world_bound().overlap(clip)
        }

        fn intersect(&self, ray: &Ray) -> Option<Float> {
            if ray.d.z == 0.0 {
                return None;
            }
            let t = (self.z - ray.o.z) / ray.d.z;
            (t > 0.0).then_some(t)
        }

        fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
            let t = self.intersect(ray)?;
            Some(IntersectionInfo {
                p: ray.at(t),
                ns: Normal3f::new(0.0, 0.0, 1.0),
                ng: Normal3f::new(0.0, 0.0, 1.0),
                dir: ray.d,
                uv: Point2f::default(),
                material: None,
            })
        }
    }

    /// A light occupying the plane `z = const`, for facade routing tests.
    struct PlaneLight {
        z: Float,
    }

    impl Light for PlaneLight {
        fn sample_ray(&self, _rng: &mut Rng) -> LightSample {
            LightSample {
                ray: Ray::new(
                    Point3f::new(0.0, 0.0, self.z),
                    Vector3f::new(0.0, 0.0, 1.0),
                ),
                color: Spectrum::ONE,
                normal: Normal3f::new(0.0, 0.0, 1.0),
                area_pdf: 1.0,
                angle_pdf: INV_PI,
            }
        }

        fn intersect(&self, ray: &Ray) -> Option<Float> {
            if ray.d.z == 0.0 {
                return None;
            }
            let t = (self.z - ray.o.z) / ray.d.z;
            (t > 0.0).then_some(t)
        }

        fn intersection_info(&self, ray: &Ray) -> Option<IntersectionInfo> {
            let t = Light::intersect(self, ray)?;
            Some(IntersectionInfo {
                p: ray.at(t),
                ns: Normal3f::new(0.0, 0.0, 1.0),
                ng: Normal3f::new(0.0, 0.0, 1.0),
                dir: ray.d,
                uv: Point2f::default(),
                material: None,
            })
        }

        fn pdf(&self, _info: &IntersectionInfo, _wo: Vector3f) -> Float {
            INV_PI
        }

        fn area(&self) -> Float {
            1.0
        }

        fn intensity(&self) -> Spectrum {
            Spectrum::ONE
        }
    }

    fn test_scene(prim_z: Float, light_z: Float) -> Scene {
        let mut builder = SceneBuilder::new();
        builder.add_primitive(Arc::new(PlaneZ { z: prim_z }));
        builder.add_light(Arc::new(PlaneLight { z: light_z }));
        builder.build(Box::new(ScanPartitioning { primitives: vec![] }))
    }

    #[test]
    fn closest_surface_wins_between_primitives_and_lights() {
        let scene = test_scene(2.0, 5.0);
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0));
        let hit = scene.intersect(&ray).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(matches!(hit.surface, SceneSurface::Primitive(_)));

        let scene = test_scene(5.0, 2.0);
        let hit = scene.intersect(&ray).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(matches!(hit.surface, SceneSurface::Light(_)));
    }

    #[test]
    fn shadow_query_matches_nearest_hit_verdict() {
        let scene = test_scene(2.0, 5.0);
        let ray = Ray::new(Point3f::default(), Vector3f::new(0.0, 0.0, 1.0));
        assert!(scene.intersect_within(&ray, 3.0));
        assert!(!scene.intersect_within(&ray, 1.5));
        // The light plane at z=5 occludes longer segments too.
        assert!(scene.intersect_within(&ray, 6.0));
    }

    #[test]
    fn pick_light_returns_uniform_probability() {
        let scene = test_scene(2.0, 5.0);
        let (light, p) = scene.pick_light(0.3).unwrap();
        assert_eq!(p, 1.0);
        assert!((light.area() - 1.0).abs() < 1e-6);
    }
}
