use std::f32::consts::PI;

use glam::Vec3;

use crate::camera::Camera;

pub const DAMPING_FACTOR: f32 = 0.05;
/// Downward tilt limit.
pub const MIN_POLAR_ANGLE: f32 = PI / 2.1;
/// Upward tilt limit.
pub const MAX_POLAR_ANGLE: f32 = 2.0 * PI / 3.0;
pub const ROTATE_SENSITIVITY: f32 = 0.005;
pub const ZOOM_SENSITIVITY: f32 = 0.002;

const MIN_RADIUS: f32 = 1e-4;

/// Orbit controls: the camera moves on a sphere around a fixed target.
/// Polar angle is clamped; azimuth is unclamped for full horizontal orbit.
/// Input accumulates into pending deltas that damping bleeds into the
/// camera a fraction per frame, so `update` must run every frame whether or
/// not input arrived.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    target: Vec3,
    radius: f32,
    azimuth: f32,
    polar: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
    damping: bool,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 1.0,
            azimuth: 0.0,
            polar: PI / 2.0,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 0.0,
            damping: true,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_damping(&mut self, enabled: bool) {
        self.damping = enabled;
    }

    /// Rederives spherical state from the camera's current position, so a
    /// freshly framed camera orbits in place instead of snapping.
    pub fn sync(&mut self, camera: &Camera) {
        let offset = camera.position - self.target;
        self.radius = offset.length().max(MIN_RADIUS);
        self.polar = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
        self.azimuth = offset.x.atan2(offset.z);
    }

    /// Accumulates a drag in screen-space pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_azimuth -= dx * ROTATE_SENSITIVITY;
        self.pending_polar -= dy * ROTATE_SENSITIVITY;
    }

    /// Accumulates scroll input; positive moves the camera away.
    pub fn zoom(&mut self, delta: f32) {
        self.pending_zoom += delta * ZOOM_SENSITIVITY;
    }

    /// One damping step: folds a fraction of the pending input into the
    /// spherical state and rewrites the camera position and look-at.
    pub fn update(&mut self, camera: &mut Camera) {
        let factor = if self.damping { DAMPING_FACTOR } else { 1.0 };

        self.azimuth += self.pending_azimuth * factor;
        self.polar = (self.polar + self.pending_polar * factor)
            .clamp(MIN_POLAR_ANGLE, MAX_POLAR_ANGLE);
        self.radius = (self.radius * (1.0 + self.pending_zoom * factor))
            .clamp(camera.near, camera.far);

        self.pending_azimuth *= 1.0 - factor;
        self.pending_polar *= 1.0 - factor;
        self.pending_zoom *= 1.0 - factor;

        let offset = Vec3::new(
            self.polar.sin() * self.azimuth.sin(),
            self.polar.cos(),
            self.polar.sin() * self.azimuth.cos(),
        ) * self.radius;

        camera.position = self.target + offset;
        camera.look_at(self.target);
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}
