use glam::Vec3;

use crate::camera::Camera;
use crate::math::Aabb;

/// Fraction of the model's height the camera sits above its center (`k`).
pub const CAMERA_HEIGHT_FRACTION: f32 = 0.2;
/// Multiple of the model's depth the camera sits back from its center (`m`).
pub const CAMERA_DISTANCE_FACTOR: f32 = 4.0;
/// The model is lowered by `size.y / MODEL_DROP_DIVISOR` after framing so it
/// hangs on its visual middle rather than its geometric origin.
pub const MODEL_DROP_DIVISOR: f32 = 1000.0;
/// Orbit target near the model's local origin. Fixed offsets, not derived
/// from geometry.
pub const ORBIT_TARGET: Vec3 = Vec3::new(-0.0001, 0.05, 0.0);

/// One-time camera placement from the loaded model's bounding volume:
/// position at `center + (0, size.y * k, size.z * m)`, looking at the
/// center.
pub fn frame_camera(camera: &mut Camera, bounds: &Aabb, height_fraction: f32, distance_factor: f32) {
    let center = bounds.center();
    let size = bounds.size();
    camera.position = center
        + Vec3::new(
            0.0,
            size.y * height_fraction,
            size.z * distance_factor,
        );
    camera.look_at(center);
}
