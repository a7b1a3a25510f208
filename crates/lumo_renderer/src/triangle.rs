//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::primitive::RAY_EPSILON;
use crate::{gen_f32, Intersection, Material, Primitive, SurfaceHit, SurfaceSample};
use lumo_math::{Bounds3, Ray, Vec2, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Padding applied to triangle bounds so axis-aligned triangles do not
/// produce zero-thickness boxes.
const BOUNDS_PADDING: f32 = 0.0001;

/// A single-sided triangle primitive.
///
/// The front face is the one whose normal `(v1 - v0) × (v2 - v1)` points
/// against the incoming ray; rays arriving from behind pass through.
#[derive(Clone)]
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Edges from v0
    e1: Vec3,
    e2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    area: f32,
    material: Arc<dyn Material>,
    bbox: Bounds3,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Arc<dyn Material>) -> Self {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let cross = e1.cross(e2);

        let bbox = Bounds3::from_points(v0, v1).union_point(v2);
        let padding = Vec3::splat(BOUNDS_PADDING);

        Self {
            v0,
            v1,
            v2,
            e1,
            e2,
            normal: cross.normalize_or_zero(),
            area: cross.length() * 0.5,
            material,
            bbox: Bounds3 {
                p_min: bbox.p_min - padding,
                p_max: bbox.p_max + padding,
            },
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }
}

impl Primitive for Triangle {
    fn bounds(&self) -> Bounds3 {
        self.bbox
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn has_emit(&self) -> bool {
        self.material.has_emission()
    }

    /// Uniform point on the triangle, `pdf = 1 / area`.
    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        let x = gen_f32(rng).sqrt();
        let y = gen_f32(rng);
        let coords = self.v0 * (1.0 - x) + self.v1 * (x * (1.0 - y)) + self.v2 * (x * y);

        SurfaceSample {
            coords,
            normal: self.normal,
            emit: self.material.emission(),
            pdf: 1.0 / self.area,
        }
    }

    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        // Back faces are not hit
        if ray.direction().dot(self.normal) > 0.0 {
            return None;
        }

        let pvec = ray.direction().cross(self.e2);
        let det = self.e1.dot(pvec);

        // Ray is parallel to triangle
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.v0;
        let u = tvec.dot(pvec) * inv_det;

        // Check if intersection is outside triangle (u parameter)
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(self.e1);
        let v = ray.direction().dot(qvec) * inv_det;

        // Check if intersection is outside triangle (v parameter)
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = self.e2.dot(qvec) * inv_det;
        if t <= RAY_EPSILON {
            return None;
        }

        Some(SurfaceHit {
            distance: t,
            index: 0,
            uv: Vec2::new(u, v),
        })
    }

    fn intersection(&self, ray: &Ray) -> Intersection<'_> {
        match self.intersect(ray) {
            Some(hit) => Intersection::hit(ray, hit, self.normal, self.material.as_ref()),
            None => Intersection::default(),
        }
    }
}
