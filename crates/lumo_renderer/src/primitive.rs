//! Primitive trait and the records produced by ray and light queries.

use crate::{Color, Material};
use lumo_math::{Bounds3, Ray, Vec2, Vec3};
use rand::RngCore;

/// Hits closer than this to the ray origin are ignored (self-intersection).
pub(crate) const RAY_EPSILON: f32 = 1e-4;

/// Result of an exact ray-primitive test: where along the ray, which
/// sub-element (triangle index for meshes) and its barycentric coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub distance: f32,
    pub index: usize,
    pub uv: Vec2,
}

/// Record of the nearest ray-scene intersection.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    pub happened: bool,
    /// Ray parameter of the hit, `+inf` when nothing was hit
    pub distance: f32,
    /// Point of intersection
    pub coords: Vec3,
    /// Geometric surface normal at the intersection (unit length)
    pub normal: Vec3,
    /// Barycentric coordinates on the hit triangle
    pub uv: Vec2,
    /// Radiance emitted by the surface, zero for non-emissive surfaces
    pub emit: Color,
    /// Material at the intersection point
    pub material: Option<&'a dyn Material>,
    /// Index of the hit primitive in the list the BVH was built from
    pub primitive: Option<usize>,
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self {
            happened: false,
            distance: f32::INFINITY,
            coords: Vec3::ZERO,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            emit: Color::ZERO,
            material: None,
            primitive: None,
        }
    }
}

impl<'a> Intersection<'a> {
    /// A hit at `distance` along `ray` on a surface with the given normal and material.
    pub fn hit(ray: &Ray, hit: SurfaceHit, normal: Vec3, material: &'a dyn Material) -> Self {
        Self {
            happened: true,
            distance: hit.distance,
            coords: ray.at(hit.distance),
            normal,
            uv: hit.uv,
            emit: material.emission(),
            material: Some(material),
            primitive: None,
        }
    }

    pub fn is_emissive(&self) -> bool {
        self.emit.length_squared() > 0.0
    }
}

/// A point drawn on a primitive's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub coords: Vec3,
    pub normal: Vec3,
    pub emit: Color,
    /// Area-measure probability density of `coords`
    pub pdf: f32,
}

/// A point drawn on one of the scene's emitters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub coords: Vec3,
    pub normal: Vec3,
    pub emit: Color,
    /// Area-measure density over the whole emissive set
    pub pdf: f32,
    /// Index of the selected emitter in the scene's object list
    pub emitter: usize,
}

/// Geometry that can be placed in a scene and queried by rays.
pub trait Primitive: Send + Sync {
    fn bounds(&self) -> Bounds3;

    fn area(&self) -> f32;

    fn has_emit(&self) -> bool;

    /// Draw a point uniformly over the surface.
    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample;

    /// Exact ray test returning only distance, element index and barycentrics.
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit>;

    /// Full intersection record, or the default "no hit" record.
    fn intersection(&self, ray: &Ray) -> Intersection<'_>;

    /// Diffuse texture color at surface coordinates `st`.
    fn eval_diffuse_color(&self, _st: Vec2) -> Color {
        Color::splat(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiffuseLight, Lambertian};

    #[test]
    fn test_default_is_a_miss() {
        let isect = Intersection::default();
        assert!(!isect.happened);
        assert_eq!(isect.distance, f32::INFINITY);
        assert!(isect.material.is_none());
        assert!(!isect.is_emissive());
    }

    #[test]
    fn test_hit_record_takes_emission_from_material() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = SurfaceHit {
            distance: 2.0,
            index: 0,
            uv: Vec2::new(0.25, 0.5),
        };

        let light = DiffuseLight::new(Color::splat(3.0));
        let isect = Intersection::hit(&ray, hit, -Vec3::Z, &light);
        assert!(isect.happened);
        assert_eq!(isect.coords, Vec3::new(0.0, 0.0, 2.0));
        assert!(isect.is_emissive());

        let diffuse = Lambertian::new(Color::ONE);
        let isect = Intersection::hit(&ray, hit, -Vec3::Z, &diffuse);
        assert!(!isect.is_emissive());
        assert_eq!(isect.uv, Vec2::new(0.25, 0.5));
    }
}
