//! Material trait for surface scattering.

use crate::gen_f32;
use lumo_math::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// Color type alias (linear RGB radiance or reflectance)
pub type Color = Vec3;

/// Trait for materials that describe how light interacts with surfaces.
///
/// Directions are unit vectors pointing away from the surface.
pub trait Material: Send + Sync {
    /// BRDF value for light arriving from `wi` and leaving towards `wo`.
    ///
    /// Zero when `wi` lies below the surface around `n`.
    fn eval(&self, wo: Vec3, wi: Vec3, n: Vec3) -> Color;

    /// Importance-sample an incident direction for outgoing direction `wo`.
    fn sample(&self, wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3;

    /// Solid-angle density of [`Material::sample`] producing `wi`.
    fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emission(&self) -> Color {
        Color::ZERO
    }

    fn has_emission(&self) -> bool {
        self.emission().length_squared() > 0.0
    }
}

/// Hemisphere sampling strategy of a diffuse surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HemisphereSampling {
    /// Every direction of the hemisphere is equally likely, pdf `1 / 2π`.
    #[default]
    Uniform,
    /// Directions proportional to `cos θ`, pdf `cos θ / π`.
    Cosine,
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
    emit: Color,
    sampling: HemisphereSampling,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo,
            emit: Color::ZERO,
            sampling: HemisphereSampling::default(),
        }
    }

    /// Make the surface emit `emit` in addition to reflecting.
    pub fn with_emission(mut self, emit: Color) -> Self {
        self.emit = emit;
        self
    }

    /// Switch the strategy used to pick bounce directions.
    pub fn with_sampling(mut self, sampling: HemisphereSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }
}

impl Material for Lambertian {
    fn eval(&self, _wo: Vec3, wi: Vec3, n: Vec3) -> Color {
        if n.dot(wi) > 0.0 {
            self.albedo / PI
        } else {
            Color::ZERO
        }
    }

    fn sample(&self, _wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let local = match self.sampling {
            HemisphereSampling::Uniform => uniform_hemisphere(gen_f32(rng), gen_f32(rng)),
            HemisphereSampling::Cosine => cosine_hemisphere(gen_f32(rng), gen_f32(rng)),
        };
        to_world(local, n)
    }

    fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        if wo.dot(n) <= 0.0 {
            return 0.0;
        }
        match self.sampling {
            HemisphereSampling::Uniform => 0.5 / PI,
            HemisphereSampling::Cosine => wi.dot(n).max(0.0) / PI,
        }
    }

    fn emission(&self) -> Color {
        self.emit
    }
}

/// Diffuse light emitter.
///
/// Emits the same radiance everywhere and reflects nothing.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn eval(&self, _wo: Vec3, _wi: Vec3, _n: Vec3) -> Color {
        Color::ZERO
    }

    fn sample(&self, _wo: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        to_world(uniform_hemisphere(gen_f32(rng), gen_f32(rng)), n)
    }

    fn pdf(&self, _wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        if wo.dot(n) > 0.0 {
            0.5 / PI
        } else {
            0.0
        }
    }

    fn emission(&self) -> Color {
        self.emit
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Uniformly distributed direction on the +Z hemisphere.
#[inline]
fn uniform_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let z = (1.0 - 2.0 * u1).abs();
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine-weighted direction on the +Z hemisphere (Malley's method).
#[inline]
fn cosine_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let z = (1.0 - u1).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Rotate a direction from the local frame (+Z = normal) into world space.
#[inline]
pub(crate) fn to_world(local: Vec3, n: Vec3) -> Vec3 {
    let (b, c) = n.any_orthonormal_pair();
    local.x * b + local.y * c + local.z * n
}
