pub mod graph;
pub mod material;
pub mod particles;

pub use graph::{Geometry, Mesh, Node, NodeId, Scene, Transform};
pub use material::{material_for, Material};
