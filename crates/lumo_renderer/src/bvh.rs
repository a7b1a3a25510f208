//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree built by recursive median splitting, queried with a
//! slab test at every node. The tree is built once and never modified;
//! changing the primitive set means building a new `Bvh`.

use crate::{gen_f32, Intersection, Primitive, SurfaceSample};
use lumo_math::{Bounds3, Ray, Vec3};
use rand::RngCore;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound for the leaf size knob.
pub const MAX_PRIMS_IN_NODE_LIMIT: usize = 255;

/// How a set of primitives is partitioned into two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMethod {
    /// Sort by centroid along the widest centroid axis and cut at the median.
    #[default]
    Naive,
}

/// BVH node - either a branch with two children or a leaf with one primitive.
enum BvhNode {
    /// Internal node with two children.
    Branch {
        bounds: Bounds3,
        area: f32,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
    /// Leaf node referring to a primitive by index.
    Leaf {
        bounds: Bounds3,
        area: f32,
        primitive: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> Bounds3 {
        match self {
            BvhNode::Branch { bounds, .. } | BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    /// Total surface area of the primitives below this node.
    fn area(&self) -> f32 {
        match self {
            BvhNode::Branch { area, .. } | BvhNode::Leaf { area, .. } => *area,
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }
}

/// Per-primitive data cached for construction.
struct BuildInfo {
    bounds: Bounds3,
    centroid: Vec3,
    area: f32,
}

/// Bounding volume hierarchy over a list of shared primitives.
pub struct Bvh {
    primitives: Vec<Arc<dyn Primitive>>,
    root: Option<Box<BvhNode>>,
    max_prims_in_node: usize,
    split_method: SplitMethod,
}

impl Bvh {
    /// Build a BVH over `primitives`.
    ///
    /// An empty list produces a tree without a root that never reports a hit.
    pub fn new(
        primitives: Vec<Arc<dyn Primitive>>,
        max_prims_in_node: usize,
        split_method: SplitMethod,
    ) -> Self {
        let start = Instant::now();
        let mut bvh = Self {
            primitives,
            root: None,
            max_prims_in_node: max_prims_in_node.min(MAX_PRIMS_IN_NODE_LIMIT),
            split_method,
        };
        if bvh.primitives.is_empty() {
            return bvh;
        }

        let info: Vec<BuildInfo> = bvh
            .primitives
            .iter()
            .map(|p| {
                let bounds = p.bounds();
                BuildInfo {
                    bounds,
                    centroid: bounds.centroid(),
                    area: p.area(),
                }
            })
            .collect();
        let mut indices: Vec<usize> = (0..info.len()).collect();

        let root = bvh.build(&info, &mut indices);
        log::info!(
            "BVH built: {} primitives, {} nodes, depth {} in {:?}",
            bvh.primitives.len(),
            root.node_count(),
            root.depth(),
            start.elapsed()
        );
        bvh.root = Some(Box::new(root));
        bvh
    }

    /// Recursive median-split construction over a slice of primitive indices.
    fn build(&self, info: &[BuildInfo], indices: &mut [usize]) -> BvhNode {
        match indices {
            [single] => {
                let item = &info[*single];
                BvhNode::Leaf {
                    bounds: item.bounds,
                    area: item.area,
                    primitive: *single,
                }
            }
            [a, b] => {
                let left = self.build(info, &mut [*a]);
                let right = self.build(info, &mut [*b]);
                Self::branch(left, right)
            }
            _ => match self.split_method {
                SplitMethod::Naive => self.median_split(info, indices),
            },
        }
    }

    fn median_split(&self, info: &[BuildInfo], indices: &mut [usize]) -> BvhNode {
        let centroid_bounds = indices
            .iter()
            .fold(Bounds3::EMPTY, |acc, &i| acc.union_point(info[i].centroid));
        let axis = centroid_bounds.max_extent();

        // Stable, so equal centroids keep their input order
        indices.sort_by(|&a, &b| {
            info[a].centroid[axis]
                .partial_cmp(&info[b].centroid[axis])
                .unwrap_or(Ordering::Equal)
        });

        let mid = indices.len() / 2;
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(info, left_indices);
        let right = self.build(info, right_indices);
        Self::branch(left, right)
    }

    fn branch(left: BvhNode, right: BvhNode) -> BvhNode {
        BvhNode::Branch {
            bounds: left.bounds().union(&right.bounds()),
            area: left.area() + right.area(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Nearest intersection of `ray` with any primitive in the tree.
    pub fn intersect(&self, ray: &Ray) -> Intersection<'_> {
        match &self.root {
            Some(root) => self.node_intersection(root, ray),
            None => Intersection::default(),
        }
    }

    fn node_intersection(&self, node: &BvhNode, ray: &Ray) -> Intersection<'_> {
        if !node
            .bounds()
            .intersect_p(ray, ray.inv_direction, ray.dir_is_neg)
        {
            return Intersection::default();
        }

        match node {
            BvhNode::Leaf { primitive, .. } => {
                let mut isect = self.primitives[*primitive].intersection(ray);
                if isect.happened {
                    isect.primitive = Some(*primitive);
                }
                isect
            }
            BvhNode::Branch { left, right, .. } => {
                // Both subtrees are always visited; the closer hit wins
                let hit1 = self.node_intersection(left, ray);
                let hit2 = self.node_intersection(right, ray);
                if hit1.distance < hit2.distance {
                    hit1
                } else {
                    hit2
                }
            }
        }
    }

    /// Draw a point uniformly over the union of all primitive surfaces.
    ///
    /// Descends the tree choosing children in proportion to their area.
    /// The pdf is with respect to area over the whole tree.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<SurfaceSample> {
        let root = self.root.as_deref()?;
        let total = root.area();
        if total <= 0.0 {
            return None;
        }

        let mut p = gen_f32(rng) * total;
        let mut node = root;
        loop {
            match node {
                BvhNode::Branch { left, right, .. } => {
                    if p < left.area() {
                        node = left.as_ref();
                    } else {
                        p -= left.area();
                        node = right.as_ref();
                    }
                }
                BvhNode::Leaf { primitive, area, .. } => {
                    let mut sample = self.primitives[*primitive].sample(rng);
                    sample.pdf *= *area / total;
                    return Some(sample);
                }
            }
        }
    }

    /// Bounds of the whole tree, empty when there is no root.
    pub fn bounds(&self) -> Bounds3 {
        self.root.as_ref().map_or(Bounds3::EMPTY, |root| root.bounds())
    }

    /// Total surface area of all primitives.
    pub fn area(&self) -> f32 {
        self.root.as_ref().map_or(0.0, |root| root.area())
    }

    /// Number of levels, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.depth())
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.node_count())
    }

    pub fn primitives(&self) -> &[Arc<dyn Primitive>] {
        &self.primitives
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn max_prims_in_node(&self) -> usize {
        self.max_prims_in_node
    }

    pub fn split_method(&self) -> SplitMethod {
        self.split_method
    }
}
