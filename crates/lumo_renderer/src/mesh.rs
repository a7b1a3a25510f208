//! Indexed triangle meshes.
//!
//! A mesh is a single primitive for the scene, backed by its own BVH over
//! its triangles.

use crate::{
    Bvh, Color, Intersection, Material, Primitive, SplitMethod, SurfaceHit, SurfaceSample,
    Triangle,
};
use lumo_math::{Bounds3, Ray, Vec2, Vec3};
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;

/// Errors for vertex and index buffers that do not describe a triangle mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no triangles")]
    Empty,

    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    #[error("expected {expected} texture coordinates, found {found}")]
    StCountMismatch { expected: usize, found: usize },
}

/// Result type for mesh construction.
pub type MeshResult<T> = Result<T, MeshError>;

/// A triangle mesh sharing one material.
pub struct MeshTriangle {
    indices: Vec<[u32; 3]>,
    st: Option<Vec<Vec2>>,
    area: f32,
    material: Arc<dyn Material>,
    bvh: Bvh,
}

impl MeshTriangle {
    /// Build a mesh from a vertex buffer and a flat triangle index buffer.
    ///
    /// `st` holds optional per-vertex texture coordinates and must match the
    /// vertex count when present.
    pub fn new(
        vertices: &[Vec3],
        indices: &[u32],
        st: Option<&[Vec2]>,
        material: Arc<dyn Material>,
    ) -> MeshResult<Self> {
        if indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertex_count: vertices.len(),
            });
        }
        if let Some(st) = st {
            if st.len() != vertices.len() {
                return Err(MeshError::StCountMismatch {
                    expected: vertices.len(),
                    found: st.len(),
                });
            }
        }

        let faces: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let triangles: Vec<Arc<dyn Primitive>> = faces
            .iter()
            .map(|&[a, b, c]| {
                Arc::new(Triangle::new(
                    vertices[a as usize],
                    vertices[b as usize],
                    vertices[c as usize],
                    material.clone(),
                )) as Arc<dyn Primitive>
            })
            .collect();
        let area = triangles.iter().map(|t| t.area()).sum();

        log::debug!("Building mesh with {} triangles", triangles.len());
        let bvh = Bvh::new(triangles, 1, SplitMethod::Naive);

        Ok(Self {
            indices: faces,
            st: st.map(<[Vec2]>::to_vec),
            area,
            material,
            bvh,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    /// Interpolated texture coordinates at barycentrics `uv` on triangle
    /// `index`, or `None` when the mesh carries no coordinates.
    pub fn texture_coords(&self, index: usize, uv: Vec2) -> Option<Vec2> {
        let st = self.st.as_ref()?;
        let [a, b, c] = *self.indices.get(index)?;
        let (st0, st1, st2) = (st[a as usize], st[b as usize], st[c as usize]);
        Some(st0 * (1.0 - uv.x - uv.y) + st1 * uv.x + st2 * uv.y)
    }
}

impl Primitive for MeshTriangle {
    fn bounds(&self) -> Bounds3 {
        self.bvh.bounds()
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn has_emit(&self) -> bool {
        self.material.has_emission()
    }

    /// Area-proportional triangle choice through the internal BVH,
    /// `pdf = 1 / area` of the whole mesh.
    fn sample(&self, rng: &mut dyn RngCore) -> SurfaceSample {
        self.bvh.sample(rng).unwrap_or(SurfaceSample {
            coords: self.bounds().centroid(),
            normal: Vec3::ZERO,
            emit: self.material.emission(),
            pdf: 0.0,
        })
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let isect = self.bvh.intersect(ray);
        isect.primitive.map(|index| SurfaceHit {
            distance: isect.distance,
            index,
            uv: isect.uv,
        })
    }

    fn intersection(&self, ray: &Ray) -> Intersection<'_> {
        self.bvh.intersect(ray)
    }

    /// Checkerboard of two colors, five checks per unit of `st`.
    fn eval_diffuse_color(&self, st: Vec2) -> Color {
        let scale = 5.0;
        let pattern = ((st.x * scale) % 1.0 > 0.5) ^ ((st.y * scale) % 1.0 > 0.5);
        if pattern {
            Color::new(0.937, 0.937, 0.231)
        } else {
            Color::new(0.815, 0.235, 0.031)
        }
    }
}
