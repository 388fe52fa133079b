use glam::{EulerRot, Mat4, Quat, Vec3};

use super::material::Material;
use crate::math::Aabb;

/// Index into the scene's node arena. Ids stay valid for the scene's
/// lifetime; nodes are never removed, only reparented.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Local TRS transform. Rotation is kept as XYZ Euler angles in radians so
/// time-driven animation can write a single axis directly.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Debug)]
pub enum Geometry {
    Triangles { positions: Vec<Vec3>, indices: Vec<u32> },
    Points { positions: Vec<Vec3> },
}

impl Geometry {
    pub fn positions(&self) -> &[Vec3] {
        match self {
            Geometry::Triangles { positions, .. } => positions,
            Geometry::Points { positions } => positions,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::new(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Tree of renderable nodes backed by an arena. The root node is synthetic
/// and carries no geometry.
pub struct Scene {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        let root = Node::new("Root");
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn add_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Preorder walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.nodes[current.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// First node with this exact name, in preorder from the root.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.nodes[id.0].name == name)
    }

    /// Moves `child` under `new_parent`, preserving its local transform.
    /// A move that would make a node its own ancestor is skipped.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        if child == new_parent || self.descendants(child).contains(&new_parent) {
            return;
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(child);
    }

    /// Inserts an empty transform node between `parent` and `child`, giving
    /// `child` a rotation origin independent of `parent`'s mesh.
    pub fn insert_pivot(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let pivot = self.add_node(parent, Node::new("Pivot"));
        self.reparent(child, pivot);
        pivot
    }

    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            chain.push(node_id);
            current = self.nodes[node_id.0].parent;
        }
        chain
            .iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, node_id| {
                world * self.nodes[node_id.0].transform.matrix()
            })
    }

    /// World-space bounding box over all mesh geometry at or below `id`.
    /// Only meaningful once the subtree is attached under the root.
    pub fn compute_bounds(&self, id: NodeId) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        for node_id in self.descendants(id) {
            let Some(mesh) = &self.nodes[node_id.0].mesh else {
                continue;
            };
            let world = self.world_transform(node_id);
            let node_bounds = Aabb::from_points(
                mesh.geometry
                    .positions()
                    .iter()
                    .map(|&p| world.transform_point3(p)),
            );
            bounds = match (bounds, node_bounds) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            };
        }
        bounds
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::Material;

    fn triangle_mesh(positions: Vec<Vec3>) -> Mesh {
        let indices = (0..positions.len() as u32).collect();
        Mesh {
            geometry: Geometry::Triangles { positions, indices },
            material: Material::default(),
        }
    }

    fn unit_quad() -> Vec<Vec3> {
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn add_and_find_by_name() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::new("Me"));
        scene.add_node(a, Node::new("String"));

        assert_eq!(scene.find_by_name("Me"), Some(a));
        assert!(scene.find_by_name("String").is_some());
        assert!(scene.find_by_name("string").is_none());
    }

    #[test]
    fn reparent_moves_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::new("a"));
        let b = scene.add_node(root, Node::new("b"));

        scene.reparent(b, a);

        assert_eq!(scene.parent_of(b), Some(a));
        assert_eq!(scene.children_of(a), &[b]);
        assert_eq!(scene.children_of(root), &[a]);
    }

    #[test]
    fn reparent_refuses_cycle() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::new("a"));
        let b = scene.add_node(a, Node::new("b"));

        scene.reparent(a, b);

        assert_eq!(scene.parent_of(a), Some(root));
        assert_eq!(scene.parent_of(b), Some(a));
    }

    #[test]
    fn insert_pivot_rewires_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.root();
        let me = scene.add_node(root, Node::new("Me"));
        let string = scene.add_node(root, Node::new("String"));

        let pivot = scene.insert_pivot(me, string);

        assert_eq!(scene.parent_of(pivot), Some(me));
        assert_eq!(scene.parent_of(string), Some(pivot));
        assert_eq!(scene.node(pivot).name, "Pivot");
        assert!(scene.node(pivot).mesh.is_none());
    }

    #[test]
    fn world_transform_accumulates_down_the_chain() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::new("a"));
        scene.node_mut(a).transform.translation = Vec3::new(1.0, 0.0, 0.0);
        let b = scene.add_node(a, Node::new("b"));
        scene.node_mut(b).transform.translation = Vec3::new(0.0, 2.0, 0.0);

        let world = scene.world_transform(b);
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn world_transform_applies_parent_rotation_to_child() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::new("a"));
        scene.node_mut(a).transform.rotation.y = std::f32::consts::FRAC_PI_2;
        let b = scene.add_node(a, Node::new("b"));
        scene.node_mut(b).transform.translation = Vec3::new(1.0, 0.0, 0.0);

        let origin = scene.world_transform(b).transform_point3(Vec3::ZERO);
        // +X rotated a quarter turn about +Y lands on -Z.
        assert!((origin - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn compute_bounds_covers_translated_meshes() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, Node::with_mesh("a", triangle_mesh(unit_quad())));
        scene.node_mut(a).transform.translation = Vec3::new(2.0, 0.0, 0.0);
        scene.add_node(root, Node::with_mesh("b", triangle_mesh(unit_quad())));

        let bounds = scene.compute_bounds(root).unwrap();
        assert!((bounds.min - Vec3::new(-0.5, -0.5, 0.0)).length() < 1e-6);
        assert!((bounds.max - Vec3::new(2.5, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn compute_bounds_without_meshes_is_none() {
        let mut scene = Scene::new();
        let root = scene.root();
        scene.add_node(root, Node::new("empty"));
        assert!(scene.compute_bounds(root).is_none());
    }
}
