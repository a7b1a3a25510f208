//! Procedural Cornell box.
//!
//! Room spans roughly 0..556 on x and z and 0..548.8 on y, viewed from -z.
//! Every quad is wound so its front face points at the visible side.

use lumo_math::Vec3;
use lumo_renderer::{Color, Lambertian, Material, MeshError, MeshTriangle, Scene};
use std::sync::Arc;

/// Camera placement matching the box layout: (look_from, look_at, vertical fov).
pub const CAMERA: (Vec3, Vec3, f32) = (
    Vec3::new(278.0, 273.0, -800.0),
    Vec3::new(278.0, 273.0, 0.0),
    40.0,
);

/// Center of the room, used to orient walls inwards.
const ROOM_CENTER: Vec3 = Vec3::new(278.0, 274.4, 279.6);

/// Accumulates quads into one indexed mesh.
#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    /// Add a planar quad whose front face points towards `target`.
    fn quad_facing(&mut self, corners: [Vec3; 4], target: Vec3) -> &mut Self {
        let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        let ordered = if normal.dot(target - corners[0]) >= 0.0 {
            corners
        } else {
            [corners[3], corners[2], corners[1], corners[0]]
        };

        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&ordered);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self
    }

    /// Add a prism given its top face; side faces drop to y = 0 and every face
    /// points away from the prism's center.
    fn block(&mut self, top: [Vec3; 4]) -> &mut Self {
        let height = top[0].y;
        let center = top.iter().copied().sum::<Vec3>() / 4.0 - Vec3::new(0.0, height / 2.0, 0.0);
        let outward = |face: [Vec3; 4]| {
            let face_center = face.iter().copied().sum::<Vec3>() / 4.0;
            2.0 * face_center - center
        };

        self.quad_facing(top, outward(top));
        for i in 0..4 {
            let a = top[i];
            let b = top[(i + 1) % 4];
            let side = [
                Vec3::new(a.x, 0.0, a.z),
                a,
                b,
                Vec3::new(b.x, 0.0, b.z),
            ];
            self.quad_facing(side, outward(side));
        }
        self
    }

    fn build(&self, material: Arc<dyn Material>) -> Result<MeshTriangle, MeshError> {
        MeshTriangle::new(&self.vertices, &self.indices, None, material)
    }
}

/// Add the Cornell box objects to `scene`. The BVH is left unbuilt.
pub fn populate(scene: &mut Scene) -> Result<(), MeshError> {
    let red: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.63, 0.065, 0.05)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.14, 0.45, 0.091)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.725, 0.71, 0.68)));
    let light: Arc<dyn Material> = Arc::new(
        Lambertian::new(Color::splat(0.65)).with_emission(
            8.0 * Color::new(0.747 + 0.058, 0.747 + 0.258, 0.747)
                + 15.6 * Color::new(0.740 + 0.287, 0.740 + 0.160, 0.740)
                + 18.4 * Color::new(0.737 + 0.642, 0.737 + 0.159, 0.737),
        ),
    );

    let floor = MeshBuilder::default()
        .quad_facing(
            [
                Vec3::new(552.8, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 559.2),
                Vec3::new(549.6, 0.0, 559.2),
            ],
            ROOM_CENTER,
        )
        .build(white.clone())?;

    let shell = MeshBuilder::default()
        // Ceiling
        .quad_facing(
            [
                Vec3::new(556.0, 548.8, 0.0),
                Vec3::new(556.0, 548.8, 559.2),
                Vec3::new(0.0, 548.8, 559.2),
                Vec3::new(0.0, 548.8, 0.0),
            ],
            ROOM_CENTER,
        )
        // Back wall
        .quad_facing(
            [
                Vec3::new(549.6, 0.0, 559.2),
                Vec3::new(0.0, 0.0, 559.2),
                Vec3::new(0.0, 548.8, 559.2),
                Vec3::new(556.0, 548.8, 559.2),
            ],
            ROOM_CENTER,
        )
        .build(white.clone())?;

    let left = MeshBuilder::default()
        .quad_facing(
            [
                Vec3::new(552.8, 0.0, 0.0),
                Vec3::new(549.6, 0.0, 559.2),
                Vec3::new(556.0, 548.8, 559.2),
                Vec3::new(556.0, 548.8, 0.0),
            ],
            ROOM_CENTER,
        )
        .build(red)?;

    let right = MeshBuilder::default()
        .quad_facing(
            [
                Vec3::new(0.0, 0.0, 559.2),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 548.8, 0.0),
                Vec3::new(0.0, 548.8, 559.2),
            ],
            ROOM_CENTER,
        )
        .build(green)?;

    let short_block = MeshBuilder::default()
        .block([
            Vec3::new(130.0, 165.0, 65.0),
            Vec3::new(82.0, 165.0, 225.0),
            Vec3::new(240.0, 165.0, 272.0),
            Vec3::new(290.0, 165.0, 114.0),
        ])
        .build(white.clone())?;

    let tall_block = MeshBuilder::default()
        .block([
            Vec3::new(423.0, 330.0, 247.0),
            Vec3::new(265.0, 330.0, 296.0),
            Vec3::new(314.0, 330.0, 456.0),
            Vec3::new(472.0, 330.0, 406.0),
        ])
        .build(white)?;

    // Just below the ceiling so the two never overlap
    let lamp = MeshBuilder::default()
        .quad_facing(
            [
                Vec3::new(343.0, 548.7, 227.0),
                Vec3::new(343.0, 548.7, 332.0),
                Vec3::new(213.0, 548.7, 332.0),
                Vec3::new(213.0, 548.7, 227.0),
            ],
            ROOM_CENTER,
        )
        .build(light)?;

    for mesh in [floor, shell, left, right, short_block, tall_block, lamp] {
        scene.add(mesh);
    }
    log::info!("Cornell box: {} objects", scene.objects().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumo_renderer::{Primitive, Ray, RenderConfig};

    fn cornell() -> Scene {
        let mut scene = Scene::new(RenderConfig::default()).expect("valid config");
        populate(&mut scene).expect("valid meshes");
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_quad_faces_target() {
        let mut builder = MeshBuilder::default();
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        builder.quad_facing(corners, Vec3::new(0.5, 1.0, 0.5));
        builder.quad_facing(corners, Vec3::new(0.5, -1.0, 0.5));
        assert_eq!(builder.indices.len(), 12);

        let up = builder.vertices[0..4].to_vec();
        let n = (up[1] - up[0]).cross(up[2] - up[0]);
        assert!(n.y > 0.0);
        let down = builder.vertices[4..8].to_vec();
        let n = (down[1] - down[0]).cross(down[2] - down[0]);
        assert!(n.y < 0.0);
    }

    #[test]
    fn test_single_light() {
        let scene = cornell();
        let emitters: Vec<_> = scene.objects().iter().filter(|o| o.has_emit()).collect();
        assert_eq!(emitters.len(), 1);
        assert!((scene.emissive_area() - 130.0 * 105.0).abs() < 1.0);
    }

    #[test]
    fn test_walls_visible_from_inside() {
        let scene = cornell();
        let center = ROOM_CENTER;
        // Floor, ceiling, both side walls and the back wall
        for dir in [-Vec3::Y, Vec3::Y, Vec3::X, -Vec3::X, Vec3::Z] {
            let ray = Ray::new(center + Vec3::new(0.0, 100.0, -200.0), dir);
            assert!(scene.intersect(&ray).happened, "no surface along {dir}");
        }
    }

    #[test]
    fn test_camera_sees_into_box() {
        let scene = cornell();
        let (from, at, _) = CAMERA;
        let ray = Ray::new(from, at - from);
        let isect = scene.intersect(&ray);
        assert!(isect.happened);
        // First surface is inside the room, not the outside of the back wall
        assert!(isect.coords.z > 0.0 && isect.coords.z <= 559.3);
    }

    #[test]
    fn test_block_faces_point_outward() {
        let scene = cornell();
        // Horizontal ray towards the short block from the room's front
        let ray = Ray::new(Vec3::new(185.0, 80.0, -10.0), Vec3::Z);
        let isect = scene.intersect(&ray);
        assert!(isect.happened);
        assert!(isect.normal.z < 0.0);
        assert!(isect.coords.z > 60.0 && isect.coords.z < 230.0);
    }
}
