use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{bail, Context, Result};
use glam::{EulerRot, Quat, Vec3};

use crate::scene::Transform;

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Asset hierarchy as delivered by the loader: immutable once loaded, names
/// and transforms preserved, primitives merged per node.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub name: String,
    pub roots: Vec<LoadedNode>,
}

#[derive(Clone, Debug)]
pub struct LoadedNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<LoadedMesh>,
    pub children: Vec<LoadedNode>,
}

#[derive(Clone, Debug)]
pub struct LoadedMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl LoadedModel {
    pub fn node_count(&self) -> usize {
        fn count(node: &LoadedNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }
}

/// Loads a `.glb`/`.gltf` file into a [`LoadedModel`].
///
/// Decoder concern handled up front: assets that require Draco-compressed
/// geometry are rejected with a descriptive error instead of producing an
/// empty hierarchy.
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel> {
    let path = path.as_ref();
    log::info!("loading model: {:?}", path);

    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("failed to load glTF file: {:?}", path))?;

    if document
        .extensions_required()
        .any(|ext| ext == DRACO_EXTENSION)
    {
        bail!(
            "{:?} requires {}, which this loader does not decode",
            path,
            DRACO_EXTENSION
        );
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF file contains no scene")?;

    let roots = scene
        .nodes()
        .map(|node| convert_node(&node, &buffers))
        .collect::<Result<Vec<_>>>()?;

    let model = LoadedModel {
        name: scene.name().unwrap_or("Model").to_string(),
        roots,
    };
    log::info!(
        "loaded {:?}: {} nodes, {} meshes",
        model.name,
        model.node_count(),
        document.meshes().count()
    );
    Ok(model)
}

/// Runs the import on a background thread; the result arrives over the
/// returned channel (success or failure, the two-armed continuation).
pub fn spawn_load(path: PathBuf) -> Receiver<Result<LoadedModel>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // A dropped receiver means the session went away first; nothing to do.
        let _ = tx.send(load_model(&path));
    });
    rx
}

fn convert_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Result<LoadedNode> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let (rx, ry, rz) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
    let transform = Transform {
        translation: Vec3::from_array(translation),
        rotation: Vec3::new(rx, ry, rz),
        scale: Vec3::from_array(scale),
    };

    let mesh = node
        .mesh()
        .map(|mesh| convert_mesh(&mesh, buffers))
        .transpose()?;

    let children = node
        .children()
        .map(|child| convert_node(&child, buffers))
        .collect::<Result<Vec<_>>>()?;

    Ok(LoadedNode {
        name: node.name().unwrap_or_default().to_string(),
        transform,
        mesh,
        children,
    })
}

fn convert_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<LoadedMesh> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let base = positions.len() as u32;

        let prim_positions = reader
            .read_positions()
            .context("mesh primitive has no positions")?;
        positions.extend(prim_positions.map(Vec3::from_array));

        match reader.read_indices() {
            Some(prim_indices) => indices.extend(prim_indices.into_u32().map(|i| base + i)),
            // No indices: the primitive is already a triangle list.
            None => indices.extend(base..positions.len() as u32),
        }
    }

    Ok(LoadedMesh { positions, indices })
}
