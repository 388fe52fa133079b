use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use scene_viewer::cli::Cli;
use scene_viewer::config::{load_tuning, Tuning, ViewerConfig};
use scene_viewer::core::{LoadState, ViewerSession};
use scene_viewer::loaders::{spawn_load, LoadedModel};
use scene_viewer::render::{RenderBackend, Renderer};

const INITIAL_WINDOW_WIDTH: u32 = 1280;
const INITIAL_WINDOW_HEIGHT: u32 = 720;
const FPS_UPDATE_INTERVAL: f32 = 1.0;
const LINE_SCROLL_STEP: f32 = 20.0;

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    session: ViewerSession,
    load_rx: Option<Receiver<Result<LoadedModel>>>,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    last_frame_time: Instant,
    frame_count: u32,
    fps: f32,
    fps_update_timer: f32,
}

impl App {
    fn new(cli: Cli, session: ViewerSession) -> Self {
        Self {
            cli,
            window: None,
            renderer: None,
            session,
            load_rx: None,
            dragging: false,
            last_cursor: None,
            last_frame_time: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            fps_update_timer: 0.0,
        }
    }

    fn update_fps(&mut self, delta: f32) {
        self.frame_count += 1;
        self.fps_update_timer += delta;

        if self.fps_update_timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.frame_count as f32 / self.fps_update_timer;
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    /// Nonblocking poll of the loader channel; the result is handed to the
    /// session exactly once, whichever arm it is.
    fn poll_load(&mut self) {
        let received = match &self.load_rx {
            Some(rx) => rx.try_recv(),
            None => return,
        };

        match received {
            Ok(result) => {
                self.load_rx = None;
                self.session.handle_load_result(result);
                if *self.session.state() == LoadState::Ready {
                    if let Some(renderer) = self.renderer.as_mut() {
                        renderer.upload_scene(self.session.scene());
                    }
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.load_rx = None;
                self.session
                    .handle_load_result(Err(anyhow!("loader thread exited without a result")));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                Window::default_attributes()
                    .with_title("Scene Viewer")
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        INITIAL_WINDOW_WIDTH,
                        INITIAL_WINDOW_HEIGHT,
                    )),
            ) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            let renderer =
                match pollster::block_on(Renderer::new(window.clone(), !self.cli.no_ui)) {
                    Ok(renderer) => renderer,
                    Err(e) => {
                        log::error!("failed to initialize renderer: {:#}", e);
                        event_loop.exit();
                        return;
                    }
                };

            let size = window.inner_size();
            self.session.handle_resize(size.width, size.height);
            self.session.start();
            self.load_rx = Some(spawn_load(self.cli.model.clone()));

            self.window = Some(window);
            self.renderer = Some(renderer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let the overlay consume the event first.
        if let Some(renderer) = self.renderer.as_mut() {
            if renderer.handle_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                self.session.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.session.handle_resize(size.width, size.height);
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state.is_pressed();
                if !self.dragging {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        self.session.orbit_mut().rotate(dx, dy);
                    }
                }
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Scroll up dollies in.
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_SCROLL_STEP,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                self.session.orbit_mut().zoom(amount);
            }
            WindowEvent::RedrawRequested => {
                self.poll_load();

                let now = Instant::now();
                let delta = now.duration_since(self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;
                self.update_fps(delta);

                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.set_status(self.fps, self.session.state());
                    self.session.tick(renderer);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.session.is_running() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let tuning = match &cli.tuning {
        Some(path) => load_tuning(path)?,
        None => Tuning::default(),
    };
    let config = ViewerConfig::new(cli.mode).with_tuning(tuning);
    let session = ViewerSession::new(config, INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, session);

    log::info!("controls: drag to orbit, scroll to zoom, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
