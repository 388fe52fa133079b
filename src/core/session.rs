use anyhow::Result;

use crate::camera::Camera;
use crate::config::{AnimationMode, ViewerConfig};
use crate::core::clock::Clock;
use crate::core::framing::{self, frame_camera};
use crate::core::orbit::OrbitControls;
use crate::loaders::{LoadedModel, LoadedNode};
use crate::math::Aabb;
use crate::render::RenderBackend;
use crate::scene::particles;
use crate::scene::{material_for, Geometry, Mesh, Node, NodeId, Scene};

/// Whether the asset hierarchy has arrived. The tick path pattern-matches
/// on this instead of probing individual node references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

const PIVOT_PARENT: &str = "Me";
const PIVOT_CHILD: &str = "String";

/// The viewer's whole mutable state: scene graph, camera, orbit controls,
/// clock, and the node ids cached at load time. The load-completion handler
/// writes those ids once; every later tick reads them.
pub struct ViewerSession {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    orbit: OrbitControls,
    clock: Clock,
    state: LoadState,
    model_root: Option<NodeId>,
    pivot: Option<NodeId>,
    particles: Option<NodeId>,
    running: bool,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let camera = Camera::new(width.max(1) as f32 / height.max(1) as f32);
        let mut orbit = OrbitControls::new();
        orbit.sync(&camera);

        Self {
            config,
            scene: Scene::new(),
            camera,
            orbit,
            clock: Clock::new(),
            state: LoadState::Loading,
            model_root: None,
            pivot: None,
            particles: None,
            running: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn pivot(&self) -> Option<NodeId> {
        self.pivot
    }

    pub fn model_root(&self) -> Option<NodeId> {
        self.model_root
    }

    pub fn particle_field(&self) -> Option<NodeId> {
        self.particles
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the animation loop; elapsed time counts from here.
    pub fn start(&mut self) {
        self.clock.reset();
        self.running = true;
    }

    /// Deterministically halts the loop; `tick` becomes a no-op.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Accepts the loader's delivered result, either arm.
    pub fn handle_load_result(&mut self, result: Result<LoadedModel>) {
        match result {
            Ok(model) => self.on_model_loaded(model),
            Err(err) => {
                let message = format!("{:#}", err);
                log::error!("model load failed: {}", message);
                self.state = LoadState::Failed(message);
            }
        }
    }

    /// Load-completion handler. Runs once; everything that derives placement
    /// from geometry happens here, strictly after the hierarchy is attached
    /// so world transforms are valid.
    pub fn on_model_loaded(&mut self, model: LoadedModel) {
        let root = self.attach_model(model);

        self.assign_materials(root);
        self.wire_pivot();

        let Some(bounds) = self.scene.compute_bounds(root) else {
            log::warn!("loaded model has no geometry; keeping default framing");
            self.model_root = Some(root);
            self.state = LoadState::Ready;
            return;
        };
        self.place_camera_and_model(root, &bounds);

        if self.config.mode == AnimationMode::ParticleSwirl {
            self.particles = Some(particles::build_field(
                &mut self.scene,
                bounds.center(),
                bounds.size(),
                self.config.tuning.particle_count,
            ));
        }

        self.model_root = Some(root);
        self.state = LoadState::Ready;
        log::info!(
            "model ready: {} scene nodes, pivot: {}",
            self.scene.len(),
            self.pivot.is_some()
        );
    }

    /// Viewport change: aspect only. The render surface is resized by the
    /// backend owner.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// One frame: read the clock, advance animation and damping, draw.
    /// A failed draw is logged and the loop keeps going.
    pub fn tick(&mut self, backend: &mut dyn RenderBackend) {
        if !self.running {
            return;
        }
        let elapsed = self.clock.elapsed();
        self.step(elapsed);
        if let Err(err) = backend.draw(&self.scene, &self.camera) {
            log::error!("draw failed, continuing: {:#}", err);
        }
    }

    /// The tick minus the draw, with elapsed time injected. Rotation angles
    /// are direct functions of elapsed time, so stepping is idempotent for
    /// a given `elapsed`.
    pub fn step(&mut self, elapsed: f32) {
        if !self.running {
            return;
        }
        if self.state == LoadState::Ready {
            self.animate(elapsed);
        }
        self.orbit.update(&mut self.camera);
    }

    fn animate(&mut self, elapsed: f32) {
        match self.config.mode {
            AnimationMode::PivotWobble => {
                let tilt = self.config.tuning.pivot_tilt;
                if let Some(pivot) = self.pivot {
                    let transform = &mut self.scene.node_mut(pivot).transform;
                    transform.rotation.y = elapsed;
                    transform.rotation.z = tilt;
                }
            }
            AnimationMode::ParticleSwirl => {
                let rate = self.config.tuning.particle_spin_rate;
                if let Some(root) = self.model_root {
                    self.scene.node_mut(root).transform.rotation.y = elapsed;
                }
                if let Some(field) = self.particles {
                    self.scene.node_mut(field).transform.rotation.y = elapsed * rate;
                }
            }
        }
    }

    fn attach_model(&mut self, model: LoadedModel) -> NodeId {
        let scene_root = self.scene.root();
        let root = self.scene.add_node(scene_root, Node::new(model.name));
        for loaded in model.roots {
            self.attach_node(root, loaded);
        }
        root
    }

    fn attach_node(&mut self, parent: NodeId, loaded: LoadedNode) {
        let mut node = Node::new(loaded.name).with_transform(loaded.transform);
        if let Some(mesh) = loaded.mesh {
            node.mesh = Some(Mesh {
                geometry: Geometry::Triangles {
                    positions: mesh.positions,
                    indices: mesh.indices,
                },
                material: Default::default(),
            });
        }
        let id = self.scene.add_node(parent, node);
        for child in loaded.children {
            self.attach_node(id, child);
        }
    }

    fn assign_materials(&mut self, root: NodeId) {
        for id in self.scene.descendants(root) {
            let node = self.scene.node_mut(id);
            let Some(mesh) = node.mesh.as_mut() else {
                continue;
            };
            if let Some(material) = material_for(&node.name) {
                mesh.material = material;
            }
        }
    }

    /// Both named nodes present: decouple the child's rotation axis from
    /// the parent via a pivot. Either missing: skip silently, degraded but
    /// valid.
    fn wire_pivot(&mut self) {
        let parent = self.scene.find_by_name(PIVOT_PARENT);
        let child = self.scene.find_by_name(PIVOT_CHILD);
        if let (Some(parent), Some(child)) = (parent, child) {
            self.pivot = Some(self.scene.insert_pivot(parent, child));
        }
    }

    fn place_camera_and_model(&mut self, root: NodeId, bounds: &Aabb) {
        let tuning = &self.config.tuning;
        let drop = bounds.size().y / tuning.model_drop_divisor;

        frame_camera(
            &mut self.camera,
            bounds,
            tuning.camera_height_fraction,
            tuning.camera_distance_factor,
        );
        // Recenter on the visual middle after framing, as derived from the
        // pre-drop bounds.
        self.scene.node_mut(root).transform.translation.y -= drop;

        self.orbit.set_target(framing::ORBIT_TARGET);
        self.orbit.sync(&self.camera);
        // Force-apply once so the controls own the camera from here on.
        self.orbit.update(&mut self.camera);
    }
}
