use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use scene_viewer::scene::particles::swirl_positions;
use scene_viewer::scene::{Geometry, Material, Mesh, Node, Scene};

/// Deterministic pseudo-random vertex cloud, seeded by index so runs are
/// comparable.
fn vertex_cloud(count: usize, seed: u32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let x = ((i as u32).wrapping_mul(2654435761).wrapping_add(seed) % 1000) as f32;
            let y = ((i as u32).wrapping_mul(40503).wrapping_add(seed) % 1000) as f32;
            let z = ((i as u32).wrapping_mul(9973).wrapping_add(seed) % 1000) as f32;
            Vec3::new(x, y, z) / 100.0 - Vec3::splat(5.0)
        })
        .collect()
}

fn scene_with_meshes(mesh_count: usize, verts_per_mesh: usize) -> Scene {
    let mut scene = Scene::new();
    let root = scene.root();
    let mut parent = root;
    for i in 0..mesh_count {
        let positions = vertex_cloud(verts_per_mesh, i as u32);
        let indices = (0..positions.len() as u32).collect();
        let node = Node::with_mesh(
            format!("mesh-{}", i),
            Mesh {
                geometry: Geometry::Triangles { positions, indices },
                material: Material::default(),
            },
        );
        // Chain half the nodes to exercise deep world-transform walks.
        let id = scene.add_node(parent, node);
        if i % 2 == 0 {
            parent = id;
        }
    }
    scene
}

fn bench_world_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_bounds");
    for mesh_count in [4usize, 32, 128] {
        let scene = scene_with_meshes(mesh_count, 512);
        group.bench_with_input(
            BenchmarkId::from_parameter(mesh_count),
            &scene,
            |b, scene| {
                b.iter(|| black_box(scene.compute_bounds(scene.root())));
            },
        );
    }
    group.finish();
}

fn bench_particle_construction(c: &mut Criterion) {
    let center = Vec3::new(0.0, 1.0, 0.0);
    let size = Vec3::new(2.0, 3.0, 2.0);

    c.bench_function("swirl_positions_2000", |b| {
        b.iter(|| black_box(swirl_positions(black_box(center), black_box(size), 2000)));
    });
}

criterion_group!(benches, bench_world_bounds, bench_particle_construction);
criterion_main!(benches);
