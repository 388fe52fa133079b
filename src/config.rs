use std::f32::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::framing;
use crate::scene::particles::PARTICLE_COUNT;

/// The two animation behaviors the viewer supports. They share the framing
/// pipeline and differ only in what the tick rotates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AnimationMode {
    /// Rotate the pivot between the "Me" and "String" nodes, with a
    /// constant tilt.
    #[value(name = "wobble")]
    PivotWobble,
    /// Rotate the whole model, with a slower counter-rotating particle
    /// field around it.
    #[value(name = "swirl")]
    ParticleSwirl,
}

/// Tuning constants. Embedded defaults match the original behavior; a JSON
/// file can override individual fields for experimentation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// `k` in the camera offset `(0, size.y * k, size.z * m)`.
    pub camera_height_fraction: f32,
    /// `m` in the camera offset.
    pub camera_distance_factor: f32,
    pub model_drop_divisor: f32,
    /// Constant Z tilt applied to the pivot every frame, radians.
    pub pivot_tilt: f32,
    pub particle_count: usize,
    /// Particle-field angular velocity as a fraction of the model's.
    pub particle_spin_rate: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            camera_height_fraction: framing::CAMERA_HEIGHT_FRACTION,
            camera_distance_factor: framing::CAMERA_DISTANCE_FACTOR,
            model_drop_divisor: framing::MODEL_DROP_DIVISOR,
            pivot_tilt: PI / 50.0,
            particle_count: PARTICLE_COUNT,
            particle_spin_rate: 0.5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub mode: AnimationMode,
    pub tuning: Tuning,
}

impl ViewerConfig {
    pub fn new(mode: AnimationMode) -> Self {
        Self {
            mode,
            tuning: Tuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }
}

pub fn load_tuning(path: impl AsRef<Path>) -> Result<Tuning> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file: {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("invalid tuning file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_framing_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.camera_height_fraction, 0.2);
        assert_eq!(tuning.camera_distance_factor, 4.0);
        assert_eq!(tuning.model_drop_divisor, 1000.0);
        assert!((tuning.pivot_tilt - PI / 50.0).abs() < 1e-7);
        assert_eq!(tuning.particle_count, 2000);
        assert_eq!(tuning.particle_spin_rate, 0.5);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let tuning: Tuning =
            serde_json::from_str(r#"{"camera_distance_factor": 6.0}"#).unwrap();
        assert_eq!(tuning.camera_distance_factor, 6.0);
        assert_eq!(tuning.camera_height_fraction, 0.2);
        assert_eq!(tuning.particle_count, 2000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Tuning, _> = serde_json::from_str(r#"{"camera_speed": 1.0}"#);
        assert!(result.is_err());
    }
}
