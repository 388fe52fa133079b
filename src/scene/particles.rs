use glam::Vec3;

use super::graph::{Geometry, Mesh, Node, NodeId, Scene};
use super::material::Material;

pub const PARTICLE_COUNT: usize = 2000;

const PARTICLE_COLOR: u32 = 0x888888;

/// Closed-form swirl positions around the model. Deterministic: identical
/// `center`/`size` reproduce bit-identical output.
pub fn swirl_positions(center: Vec3, size: Vec3, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = i as f32 * 0.2;
            let radius = 0.1 + 0.5 * (angle * 0.1).sin();
            let y = size.y * 0.5 * (angle * 0.05).cos() - 0.5 * size.y;
            Vec3::new(
                center.x + radius * angle.cos(),
                center.y + y,
                center.z + radius * angle.sin(),
            )
        })
        .collect()
}

/// Builds the particle field as a point-cloud node under the scene root and
/// returns its id. Positions are fixed at construction; only the node's
/// rotation animates afterwards.
pub fn build_field(scene: &mut Scene, center: Vec3, size: Vec3, count: usize) -> NodeId {
    let mesh = Mesh {
        geometry: Geometry::Points {
            positions: swirl_positions(center, size, count),
        },
        material: Material::from_hex(PARTICLE_COLOR, false),
    };
    let root = scene.root();
    scene.add_node(root, Node::with_mesh("Particles", mesh))
}
