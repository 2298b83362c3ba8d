use crate::Params;
use glam::*;

/// Pitch is kept within this many degrees of the horizon, so the view
/// direction never becomes parallel to the up vector.
pub const PITCH_LIMIT: f32 = 89.0;

/// Smallest distance the camera may keep from its focus point.
pub const MIN_RADIUS: f32 = 1e-3;

/// Camera orbiting a fixed focus point.
///
/// Angles are stored in degrees; yaw is unconstrained, pitch is always within
/// [`PITCH_LIMIT`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    radius: f32,
    focus: Vec3,
    up: Vec3,
}

impl OrbitCamera {
    pub fn new(yaw: f32, pitch: f32, radius: f32, focus: Vec3) -> Self {
        Self {
            yaw,
            pitch: clamp_pitch(pitch),
            radius: radius.max(MIN_RADIUS),
            focus,
            up: Vec3::Y,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn focus(&self) -> Vec3 {
        self.focus
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Turns the camera by given amount of degrees.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = clamp_pitch(self.pitch + pitch);
    }

    /// Returns `(eye_pos, view_dir)`.
    pub fn eye(&self) -> (Vec3, Vec3) {
        update_camera(self.yaw, self.pitch, self.radius, self.focus)
    }

    /// Produces this frame's uniforms.
    pub fn params(&self, light_pos: Vec3, screen_size: IVec2) -> Params {
        let (eye_pos, view_dir) = self.eye();

        Params::new(eye_pos, view_dir, self.up, light_pos, screen_size)
    }
}

/// Unit vector the camera looks along for given yaw and pitch (degrees).
pub fn front(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw_sin, yaw_cos) = yaw.to_radians().sin_cos();
    let (pitch_sin, pitch_cos) = pitch.to_radians().sin_cos();

    vec3(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos)
}

/// Places the eye `radius` units behind `focus` along [`front()`] and returns
/// `(eye_pos, view_dir)`, where `view_dir` points from the eye towards the
/// focus.
pub fn update_camera(
    yaw: f32,
    pitch: f32,
    radius: f32,
    focus: Vec3,
) -> (Vec3, Vec3) {
    let eye = focus - front(yaw, pitch) * radius;
    let dir = (focus - eye).normalize();

    (eye, dir)
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn default_view() {
        let (eye, dir) = update_camera(-90.0, 0.0, 5.0, vec3(0.0, 0.0, -5.0));

        assert!(eye.abs_diff_eq(Vec3::ZERO, EPS), "{eye}");
        assert!(dir.abs_diff_eq(Vec3::NEG_Z, EPS), "{dir}");
    }

    #[test]
    fn eye_stays_on_sphere() {
        let focus = vec3(1.0, -2.0, 3.0);

        for yaw in (-720..=720).step_by(15) {
            for pitch in (-89..=89).step_by(7) {
                let (yaw, pitch) = (yaw as f32, pitch as f32);

                for radius in [0.5, 5.0, 42.0] {
                    let (eye, dir) =
                        update_camera(yaw, pitch, radius, focus);

                    let distance = eye.distance(focus);

                    assert!(
                        (distance - radius).abs() < EPS * radius,
                        "yaw={yaw} pitch={pitch} radius={radius}: {distance}",
                    );

                    assert!((dir.length() - 1.0).abs() < EPS);

                    assert!(
                        dir.abs_diff_eq((focus - eye).normalize(), EPS)
                    );
                }
            }
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = OrbitCamera::new(0.0, 120.0, 5.0, Vec3::ZERO);

        assert_eq!(camera.pitch(), PITCH_LIMIT);

        camera.rotate(10.0, 500.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        assert_eq!(camera.yaw(), 10.0);

        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);

        camera.rotate(0.0, 30.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT + 30.0);
    }

    #[test]
    fn pitch_never_leaves_limit() {
        let mut camera = OrbitCamera::new(-90.0, 0.0, 5.0, Vec3::ZERO);
        let mut seed = 0x2545_f491_u32;

        for _ in 0..10_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;

            let delta = (seed % 400) as f32 - 200.0;

            camera.rotate(delta * 0.5, delta);

            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&camera.pitch()));
        }
    }

    #[test]
    fn view_never_flips() {
        let camera = OrbitCamera::new(30.0, 500.0, 5.0, Vec3::ZERO);
        let (_, dir) = camera.eye();

        assert!(dir.cross(camera.up()).length() > 0.01);
    }

    #[test]
    fn radius_stays_positive() {
        let camera = OrbitCamera::new(0.0, 0.0, -3.0, Vec3::ONE);

        assert_eq!(camera.radius(), MIN_RADIUS);

        let (eye, dir) = camera.eye();

        assert!(eye.is_finite());
        assert!(dir.is_normalized());
    }

    #[test]
    fn params_carry_camera() {
        let camera = OrbitCamera::new(-90.0, 0.0, 5.0, vec3(0.0, 0.0, -5.0));
        let light = vec3(3.0, 4.0, 0.0);
        let params = camera.params(light, ivec2(800, 600));

        assert!(params.camera_pos.abs_diff_eq(Vec3::ZERO, EPS));
        assert!(params.camera_dir.abs_diff_eq(Vec3::NEG_Z, EPS));
        assert_eq!(params.camera_up, Vec3::Y);
        assert_eq!(params.light_pos, light);
        assert_eq!(params.screen_size, ivec2(800, 600));
    }
}
