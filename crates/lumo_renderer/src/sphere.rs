//! Sphere primitive for ray tracing.

use crate::primitive::RAY_EPSILON;
use crate::{gen_f32, Intersection, Material, Primitive, SurfaceHit, SurfaceSample};
use lumo_math::{Bounds3, Ray, Vec2, Vec3};
use rand::RngCore;
use std::f32::consts::PI;
use std::sync::Arc;

/// A sphere primitive.
#[derive(Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<dyn Material>,
    bbox: Bounds3,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Bounds3::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn sphere_uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

impl Primitive for Sphere {
    fn bounds(&self) -> Bounds3 {
        self.bbox
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    fn has_emit(&self) -> bool {
        self.material.has_emission()
    }

    /// Uniform point over the whole sphere, `pdf = 1 / area`.
    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let z = 1.0 - 2.0 * gen_f32(rng);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * gen_f32(rng);
        let normal = Vec3::new(r * phi.cos(), r * phi.sin(), z);

        SurfaceSample {
            coords: self.center + self.radius * normal,
            normal,
            emit: self.material.emission(),
            pdf: 1.0 / self.area(),
        }
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in front of the origin
        let mut root = (h - sqrtd) / a;
        if root <= RAY_EPSILON {
            root = (h + sqrtd) / a;
            if root <= RAY_EPSILON {
                return None;
            }
        }

        let outward = (ray.at(root) - self.center) / self.radius;
        Some(SurfaceHit {
            distance: root,
            index: 0,
            uv: Self::sphere_uv(outward),
        })
    }

    fn intersection(&self, ray: &Ray) -> Intersection<'_> {
        match self.intersect(ray) {
            Some(hit) => {
                let normal = (ray.at(hit.distance) - self.center).normalize();
                Intersection::hit(ray, hit, normal, self.material.as_ref())
            }
            None => Intersection::default(),
        }
    }
}
