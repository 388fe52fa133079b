use anyhow::Result;
use glam::Vec3;

use scene_viewer::config::{AnimationMode, ViewerConfig};
use scene_viewer::core::{LoadState, ViewerSession};
use scene_viewer::loaders::{LoadedMesh, LoadedModel, LoadedNode};
use scene_viewer::render::RenderBackend;
use scene_viewer::scene::{Scene, Transform};
use scene_viewer::Camera;

struct CountingBackend {
    draws: usize,
}

impl RenderBackend for CountingBackend {
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn draw(&mut self, _scene: &Scene, _camera: &Camera) -> Result<()> {
        self.draws += 1;
        Ok(())
    }
}

fn quad(name: &str, depth: f32) -> LoadedNode {
    LoadedNode {
        name: name.into(),
        transform: Transform::IDENTITY,
        mesh: Some(LoadedMesh {
            positions: vec![
                Vec3::new(-0.5, -0.5, -depth / 2.0),
                Vec3::new(0.5, -0.5, depth / 2.0),
                Vec3::new(0.5, 0.5, depth / 2.0),
                Vec3::new(-0.5, 0.5, -depth / 2.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }),
        children: Vec::new(),
    }
}

fn model(nodes: Vec<LoadedNode>) -> LoadedModel {
    LoadedModel {
        name: "Model".into(),
        roots: nodes,
    }
}

fn running_session(mode: AnimationMode) -> ViewerSession {
    let mut session = ViewerSession::new(ViewerConfig::new(mode), 800, 600);
    session.start();
    session
}

#[test]
fn recognized_names_create_a_wired_pivot() {
    let mut session = running_session(AnimationMode::PivotWobble);
    session.on_model_loaded(model(vec![quad("Me", 0.0), quad("String", 0.0)]));

    let pivot = session.pivot().expect("pivot should be created");
    let scene = session.scene();
    let me = scene.find_by_name("Me").unwrap();
    let string = scene.find_by_name("String").unwrap();

    assert_eq!(scene.parent_of(string), Some(pivot));
    assert_eq!(scene.parent_of(pivot), Some(me));

    session.step(3.0);
    let rotation = session.scene().node(pivot).transform.rotation;
    assert_eq!(rotation.y, 3.0);
}

#[test]
fn unrecognized_names_run_degraded_forever() {
    let mut session = running_session(AnimationMode::PivotWobble);
    session.on_model_loaded(model(vec![quad("hull", 0.0), quad("mast", 0.0)]));

    assert!(session.pivot().is_none());
    assert_eq!(*session.state(), LoadState::Ready);

    let mut backend = CountingBackend { draws: 0 };
    for _ in 0..1000 {
        session.tick(&mut backend);
    }
    assert_eq!(backend.draws, 1000);
}

#[test]
fn camera_is_framed_from_the_bounding_volume() {
    let mut session = running_session(AnimationMode::PivotWobble);
    // size (1, 1, 4) around the origin.
    session.on_model_loaded(model(vec![quad("hull", 4.0)]));

    // center + (0, size.y * 0.2, size.z * 4.0)
    let expected = Vec3::new(0.0, 0.2, 16.0);
    assert!((session.camera().position - expected).length() < 1e-2);
}

#[test]
fn swirl_sessions_reproduce_identical_particle_fields() {
    let build = || {
        let mut session = running_session(AnimationMode::ParticleSwirl);
        session.on_model_loaded(model(vec![quad("hull", 2.0)]));
        let field = session.particle_field().unwrap();
        match &session.scene().node(field).mesh.as_ref().unwrap().geometry {
            scene_viewer::scene::Geometry::Points { positions } => positions.clone(),
            _ => panic!("particle field must be point geometry"),
        }
    };

    let first = build();
    let second = build();
    assert_eq!(first.len(), 2000);
    assert_eq!(first, second);
}

#[test]
fn failed_load_is_reported_and_rendering_continues() {
    let mut session = running_session(AnimationMode::PivotWobble);
    session.handle_load_result(Err(anyhow::anyhow!("asset not found")));

    match session.state() {
        LoadState::Failed(message) => assert!(message.contains("asset not found")),
        other => panic!("expected Failed, got {:?}", other),
    }

    let mut backend = CountingBackend { draws: 0 };
    for _ in 0..10 {
        session.tick(&mut backend);
    }
    assert_eq!(backend.draws, 10);
    assert!(session.is_running());
}

#[test]
fn stopping_the_session_halts_draws() {
    let mut session = running_session(AnimationMode::PivotWobble);
    session.on_model_loaded(model(vec![quad("Me", 0.0), quad("String", 0.0)]));

    let mut backend = CountingBackend { draws: 0 };
    session.tick(&mut backend);
    session.stop();
    session.tick(&mut backend);

    assert_eq!(backend.draws, 1);
}
