//! Differential correctness tests for the BVH.
//!
//! Compares `Bvh::intersect` against a linear scan over the same primitives
//! for scenes of every size class, then checks the tree stays shallow.

use lumo_renderer::{
    Bvh, Color, Lambertian, Material, Primitive, Ray, SplitMethod, Sphere, Triangle, Vec3,
};
use rand::prelude::*;
use std::sync::Arc;

// ────────────────── helpers ──────────────────

fn random_vec(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

/// Mix of small triangles and spheres scattered through a cube.
fn random_primitives(count: usize, seed: u64) -> Vec<Arc<dyn Primitive>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let material: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.5)));

    (0..count)
        .map(|i| {
            let center = random_vec(&mut rng, 10.0);
            if i % 3 == 0 {
                let radius = rng.gen_range(0.2..1.0);
                Arc::new(Sphere::new(center, radius, material.clone())) as Arc<dyn Primitive>
            } else {
                Arc::new(Triangle::new(
                    center + random_vec(&mut rng, 1.5),
                    center + random_vec(&mut rng, 1.5),
                    center + random_vec(&mut rng, 1.5),
                    material.clone(),
                ))
            }
        })
        .collect()
}

/// Rays from outside the cube aimed at random points inside it, plus a few
/// axis-aligned ones.
fn random_rays(count: usize, seed: u64) -> Vec<Ray> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rays: Vec<Ray> = (0..count)
        .map(|_| {
            let origin = random_vec(&mut rng, 1.0).normalize_or_zero() * 25.0 + Vec3::X;
            let target = random_vec(&mut rng, 8.0);
            Ray::new(origin, target - origin)
        })
        .collect();

    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        for offset in [-3.0, 0.0, 4.5] {
            let origin = -axis * 30.0 + axis.any_orthonormal_vector() * offset;
            rays.push(Ray::new(origin, axis));
            rays.push(Ray::new(-origin, -axis));
        }
    }
    rays
}

/// Nearest hit found by testing every primitive: (distance, index).
fn brute_force(primitives: &[Arc<dyn Primitive>], ray: &Ray) -> Option<(f32, usize)> {
    primitives
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.intersect(ray).map(|hit| (hit.distance, i)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

fn assert_matches_brute_force(count: usize, max_prims_in_node: usize) {
    let primitives = random_primitives(count, 7 + count as u64);
    let bvh = Bvh::new(primitives.clone(), max_prims_in_node, SplitMethod::Naive);

    let mut hits = 0;
    for ray in random_rays(500, 99) {
        let isect = bvh.intersect(&ray);
        match brute_force(&primitives, &ray) {
            None => {
                assert!(!isect.happened, "BVH hit where brute force missed");
                assert_eq!(isect.distance, f32::INFINITY);
            }
            Some((distance, index)) => {
                hits += 1;
                assert!(isect.happened, "BVH missed where brute force hit");
                assert!(
                    (isect.distance - distance).abs() < 1e-4,
                    "distance {} vs brute force {distance}",
                    isect.distance
                );
                // Ties may legitimately resolve to another primitive at the same distance
                let reported = isect.primitive.expect("hit is stamped with its primitive");
                if reported != index {
                    let other = primitives[reported]
                        .intersect(&ray)
                        .expect("reported primitive is hit");
                    assert!((other.distance - distance).abs() < 1e-4);
                }
            }
        }
    }

    if count > 20 {
        assert!(hits > 20, "only {hits} rays hit anything");
    }
}

// ────────────────── tests ──────────────────

#[test]
fn empty_bvh_never_hits() {
    let bvh = Bvh::new(Vec::new(), 1, SplitMethod::Naive);
    for ray in random_rays(50, 1) {
        let isect = bvh.intersect(&ray);
        assert!(!isect.happened);
        assert!(isect.primitive.is_none());
    }
}

#[test]
fn matches_brute_force_for_every_size_class() {
    for count in [1, 2, 3, 17, 300] {
        assert_matches_brute_force(count, 1);
    }
}

#[test]
fn leaf_size_knob_does_not_change_results() {
    for max_prims in [4, 255, 1000] {
        assert_matches_brute_force(64, max_prims);
    }
}

#[test]
fn bounds_enclose_every_primitive() {
    let primitives = random_primitives(100, 3);
    let bvh = Bvh::new(primitives.clone(), 1, SplitMethod::Naive);
    let root = bvh.bounds();
    for p in &primitives {
        let b = p.bounds();
        assert!(root.contains(b.p_min) && root.contains(b.p_max));
    }
    assert_eq!(bvh.primitives().len(), 100);
}

#[test]
fn tree_height_is_logarithmic() {
    for count in [2usize, 10, 100, 1000] {
        let bvh = Bvh::new(random_primitives(count, 11), 1, SplitMethod::Naive);
        let limit = (count as f64).log2().ceil() as usize + 1;
        assert!(
            bvh.depth() <= limit,
            "{count} primitives: depth {} exceeds {limit}",
            bvh.depth()
        );
        // Full binary tree with one primitive per leaf
        assert_eq!(bvh.node_count(), 2 * count - 1);
    }
}
