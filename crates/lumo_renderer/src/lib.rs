//! Lumo renderer - CPU path tracing.
//!
//! A bounding volume hierarchy for nearest-hit ray queries and a recursive
//! Monte Carlo integrator (next event estimation plus Russian Roulette)
//! built on top of it.

mod bvh;
mod camera;
mod config;
mod material;
mod mesh;
mod primitive;
mod renderer;
mod scene;
mod sphere;
mod triangle;

pub use bvh::{Bvh, SplitMethod, MAX_PRIMS_IN_NODE_LIMIT};
pub use camera::Camera;
pub use config::{ConfigError, EmissionMode, RenderConfig};
pub use material::{Color, DiffuseLight, HemisphereSampling, Lambertian, Material};
pub use mesh::{MeshError, MeshResult, MeshTriangle};
pub use primitive::{Intersection, LightSample, Primitive, SurfaceHit, SurfaceSample};
pub use renderer::{color_to_rgb8, render, Framebuffer, RenderError, DEFAULT_GAMMA};
pub use scene::Scene;
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export common math types from lumo_math
pub use lumo_math::{Bounds3, Ray, Vec2, Vec3};

use rand::{Rng, RngCore};

/// Uniform random float in `[0, 1)` drawn from the caller's generator.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
