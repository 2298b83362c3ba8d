use crate::OrbitCamera;
use glam::*;

/// Turns pointer motion into yaw/pitch changes of an [`OrbitCamera`].
#[derive(Clone, Copy, Debug)]
pub struct OrbitController {
    /// Degrees per pixel.
    sensitivity: f32,
    last: Option<Vec2>,
}

impl OrbitController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            last: None,
        }
    }

    /// Handles a pointer sample given in window coordinates (y grows
    /// downwards) and returns the applied `(yaw, pitch)` delta in degrees.
    ///
    /// The first sample after construction or [`Self::reset()`] only records
    /// the baseline and leaves the camera untouched.
    pub fn pointer_moved(
        &mut self,
        camera: &mut OrbitCamera,
        position: Vec2,
    ) -> Vec2 {
        let Some(last) = self.last.replace(position) else {
            return Vec2::ZERO;
        };

        let delta = vec2(position.x - last.x, last.y - position.y)
            * self.sensitivity;

        camera.rotate(delta.x, delta.y);

        delta
    }

    /// Forgets the baseline, e.g. after the pointer left the window.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
