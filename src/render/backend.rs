use anyhow::Result;

use crate::camera::Camera;
use crate::scene::Scene;

/// Rendering collaborator seam: one-time construction happens elsewhere,
/// this is the per-resize and per-frame surface the session drives.
pub trait RenderBackend {
    /// Resize the rendering surface to match a new viewport.
    fn resize(&mut self, width: u32, height: u32);

    /// One synchronous draw of the scene graph from the camera.
    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<()>;
}
