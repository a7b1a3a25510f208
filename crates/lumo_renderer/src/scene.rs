//! Scene container, light sampling and the path tracing integrator.
//!
//! Implements Monte Carlo path tracing with:
//! - Next event estimation (one area-sampled light point per bounce)
//! - Russian Roulette termination, unbiased by dividing by the survival
//!   probability
//! - BRDF importance sampling for the indirect bounce

use crate::{
    gen_f32, Bvh, Color, ConfigError, EmissionMode, Intersection, LightSample, Primitive,
    RenderConfig,
};
use lumo_math::Ray;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;

/// Primitives of a scene plus the acceleration structure built over them.
pub struct Scene {
    objects: Vec<Arc<dyn Primitive>>,
    bvh: Option<Bvh>,
    config: RenderConfig,
}

impl Scene {
    /// Create an empty scene with a validated configuration.
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            objects: Vec::new(),
            bvh: None,
            config,
        })
    }

    /// Add a primitive. Discards any previously built BVH.
    pub fn add<P: Primitive + 'static>(&mut self, primitive: P) {
        self.add_shared(Arc::new(primitive));
    }

    /// Add an already shared primitive. Discards any previously built BVH.
    pub fn add_shared(&mut self, primitive: Arc<dyn Primitive>) {
        self.objects.push(primitive);
        self.bvh = None;
    }

    /// Build the acceleration structure over the current objects.
    pub fn build_bvh(&mut self) {
        let start = Instant::now();
        let bvh = Bvh::new(
            self.objects.clone(),
            self.config.max_prims_in_node,
            self.config.split_method,
        );
        log::info!(
            "Scene BVH ready: {} objects, {} emitters, depth {} ({:?})",
            self.objects.len(),
            self.objects.iter().filter(|o| o.has_emit()).count(),
            bvh.depth(),
            start.elapsed()
        );
        self.bvh = Some(bvh);
    }

    pub fn is_built(&self) -> bool {
        self.bvh.is_some()
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn objects(&self) -> &[Arc<dyn Primitive>] {
        &self.objects
    }

    /// Nearest hit along `ray`. Reports no hit until [`Scene::build_bvh`] runs.
    pub fn intersect(&self, ray: &Ray) -> Intersection<'_> {
        self.bvh
            .as_ref()
            .map_or_else(Intersection::default, |bvh| bvh.intersect(ray))
    }

    /// Total surface area of all emissive objects.
    pub fn emissive_area(&self) -> f32 {
        self.objects
            .iter()
            .filter(|o| o.has_emit())
            .map(|o| o.area())
            .sum()
    }

    /// Pick an emitter with probability proportional to its area and draw a
    /// point on it.
    ///
    /// The pdf of the result is with respect to area over the whole emissive
    /// set. Returns `None` when there is no emissive area to sample.
    pub fn sample_light(&self, rng: &mut dyn RngCore) -> Option<LightSample> {
        let total = self.emissive_area();
        // Also rejects NaN
        if !(total > 0.0) {
            return None;
        }

        let p = gen_f32(rng) * total;
        let mut running = 0.0;
        let mut chosen = None;
        for (index, object) in self.objects.iter().enumerate() {
            if !object.has_emit() || object.area() <= 0.0 {
                continue;
            }
            running += object.area();
            chosen = Some(index);
            if p <= running {
                break;
            }
        }

        // Rounding can leave `p` past the final running sum; the last emitter absorbs it
        let emitter = chosen?;
        let object = &self.objects[emitter];
        let sample = object.sample(rng);
        Some(LightSample {
            coords: sample.coords,
            normal: sample.normal,
            emit: sample.emit,
            pdf: sample.pdf * object.area() / total,
            emitter,
        })
    }

    /// Estimate the radiance arriving at the origin of `ray`.
    ///
    /// `depth` counts the bounces taken so far (0 for camera rays).
    pub fn cast_ray(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        if let Some(max_depth) = self.config.max_depth {
            if depth > max_depth {
                return Color::ZERO;
            }
        }

        let isect = self.intersect(ray);
        let Some(material) = isect.material.filter(|_| isect.happened) else {
            return self.config.background;
        };

        if isect.is_emissive() {
            return match self.config.emission_mode {
                EmissionMode::Constant(value) => value,
                EmissionMode::Surface => isect.emit,
            };
        }

        let p = isect.coords;
        let n = isect.normal;
        let wo = -ray.direction();

        // Direct lighting
        let mut l_dir = Color::ZERO;
        if let Some(light) = self.sample_light(rng) {
            let to_light = light.coords - p;
            let dist2 = to_light.length_squared();
            if dist2 > 0.0 && light.pdf > 0.0 {
                let ws = to_light / dist2.sqrt();
                let shadow = self.intersect(&Ray::new(p, ws));
                let unoccluded = shadow.happened
                    && (shadow.coords - light.coords).length() < self.config.shadow_epsilon;
                if unoccluded {
                    l_dir = light.emit
                        * material.eval(wo, ws, n)
                        * ws.dot(n)
                        * (-ws).dot(light.normal)
                        / (dist2 * light.pdf);
                }
            }
        }

        // Indirect lighting
        let mut l_indir = Color::ZERO;
        let survive = self.config.russian_roulette;
        if gen_f32(rng) < survive {
            let wi = material.sample(wo, n, rng);
            let pdf = material.pdf(wi, wo, n);
            if pdf > 0.0 && pdf.is_finite() {
                let incoming = self.cast_ray(&Ray::new(p, wi), depth + 1, rng);
                l_indir = incoming * material.eval(wi, wo, n) * wi.dot(n) / (pdf * survive);
            }
        }

        l_dir + l_indir
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            bvh: None,
            config: RenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffuseLight, Lambertian, Material, Sphere, Triangle};
    use lumo_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Color::splat(0.5)))
    }

    fn light(le: f32) -> Arc<dyn Material> {
        Arc::new(DiffuseLight::new(Color::splat(le)))
    }

    /// Large floor at y = 0 facing up, unit square light at y = 1 facing down.
    fn floor_and_light(config: RenderConfig) -> Scene {
        let mut scene = Scene::new(config).expect("valid config");
        scene.add(Triangle::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 20.0),
            Vec3::new(10.0, 0.0, -10.0),
            grey(),
        ));
        scene.add(Triangle::new(
            Vec3::new(-0.5, 1.0, -0.5),
            Vec3::new(0.5, 1.0, -0.5),
            Vec3::new(0.5, 1.0, 0.5),
            light(8.0),
        ));
        scene.add(Triangle::new(
            Vec3::new(-0.5, 1.0, -0.5),
            Vec3::new(0.5, 1.0, 0.5),
            Vec3::new(-0.5, 1.0, 0.5),
            light(8.0),
        ));
        scene
    }

    fn direct_only() -> RenderConfig {
        RenderConfig {
            russian_roulette: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_scene_returns_background() {
        let config = RenderConfig {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let mut scene = Scene::new(config).expect("valid config");
        scene.build_bvh();

        let mut rng = StdRng::seed_from_u64(42);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(scene.cast_ray(&ray, 0, &mut rng), Color::new(0.1, 0.2, 0.3));
        assert!(scene.sample_light(&mut rng).is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RenderConfig {
            russian_roulette: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            Scene::new(config),
            Err(ConfigError::RussianRoulette(_))
        ));
    }

    #[test]
    fn test_adding_discards_bvh() {
        let mut scene = floor_and_light(direct_only());
        assert!(!scene.is_built());

        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Y);
        assert!(!scene.intersect(&ray).happened);

        scene.build_bvh();
        assert!(scene.is_built());
        assert!(scene.intersect(&ray).happened);

        scene.add(Sphere::new(Vec3::new(5.0, 5.0, 5.0), 1.0, grey()));
        assert!(!scene.is_built());
    }

    #[test]
    fn test_direct_emitter_hit() {
        let mut scene = floor_and_light(direct_only());
        scene.build_bvh();
        let mut rng = StdRng::seed_from_u64(1);

        // Looking up at the light from below
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
        assert_eq!(scene.cast_ray(&ray, 0, &mut rng), Color::ONE);

        let config = RenderConfig {
            emission_mode: EmissionMode::Surface,
            ..direct_only()
        };
        let mut scene = floor_and_light(config);
        scene.build_bvh();
        assert_eq!(scene.cast_ray(&ray, 0, &mut rng), Color::splat(8.0));
    }

    #[test]
    fn test_light_pdf_covers_emissive_set() {
        let mut scene = floor_and_light(direct_only());
        scene.build_bvh();
        assert!((scene.emissive_area() - 1.0).abs() < 1e-6);

        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let sample = scene.sample_light(&mut rng).expect("scene has a light");
            assert!(sample.emitter == 1 || sample.emitter == 2);
            assert!((sample.pdf - 1.0).abs() < 1e-5);
            assert!((sample.coords.y - 1.0).abs() < 1e-6);
            assert_eq!(sample.emit, Color::splat(8.0));
            assert_eq!(sample.normal, -Vec3::Y);
        }
    }

    #[test]
    fn test_floor_under_light_is_lit() {
        let mut scene = floor_and_light(direct_only());
        scene.build_bvh();

        let mut rng = StdRng::seed_from_u64(3);
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Y);
        let color = scene.cast_ray(&ray, 0, &mut rng);
        assert!(color.x > 0.0);
        assert_eq!(color.x, color.y);
    }

    #[test]
    fn test_occluded_light_gives_no_direct_term() {
        let mut scene = floor_and_light(direct_only());
        // Faces down, so camera rays from above pass through it
        scene.add(Triangle::new(
            Vec3::new(-5.0, 0.5, -5.0),
            Vec3::new(5.0, 0.5, -5.0),
            Vec3::new(0.0, 0.5, 5.0),
            grey(),
        ));
        scene.build_bvh();

        let mut rng = StdRng::seed_from_u64(4);
        let ray = Ray::new(Vec3::new(0.0, 0.25, 0.0), -Vec3::Y);
        for _ in 0..50 {
            assert_eq!(scene.cast_ray(&ray, 0, &mut rng), Color::ZERO);
        }
    }

    #[test]
    fn test_max_depth_cuts_paths() {
        let config = RenderConfig {
            max_depth: Some(2),
            russian_roulette: 1.0,
            ..Default::default()
        };
        let mut scene = floor_and_light(config);
        scene.build_bvh();

        let mut rng = StdRng::seed_from_u64(5);
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Y);
        assert_eq!(scene.cast_ray(&ray, 3, &mut rng), Color::ZERO);
        assert!(scene.cast_ray(&ray, 0, &mut rng).x > 0.0);
    }
}
