pub mod gltf;

pub use gltf::{spawn_load, LoadedMesh, LoadedModel, LoadedNode};
