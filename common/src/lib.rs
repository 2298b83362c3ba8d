mod camera;
mod controller;

pub use self::camera::*;
pub use self::controller::*;
pub use glam;

use bytemuck::*;
use glam::*;

/// Uniform block consumed by the compute stage.
///
/// Mirrors `struct Params` in `shader/raymarch.wgsl`; every `vec3<f32>` there
/// is 16-byte aligned, hence the padding words.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Params {
    pub camera_pos: Vec3,
    _pad0: f32,
    pub camera_dir: Vec3,
    _pad1: f32,
    pub camera_up: Vec3,
    _pad2: f32,
    pub light_pos: Vec3,
    _pad3: f32,
    pub screen_size: IVec2,
    _pad4: [i32; 2],
}

impl Params {
    pub fn new(
        camera_pos: Vec3,
        camera_dir: Vec3,
        camera_up: Vec3,
        light_pos: Vec3,
        screen_size: IVec2,
    ) -> Self {
        Self {
            camera_pos,
            camera_dir,
            camera_up,
            light_pos,
            screen_size,
            ..Default::default()
        }
    }
}

/// Single vertex of the fullscreen quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        uv: [u, v],
    }
}

/// Two triangles covering clip space; `uv` has its origin in the top-left
/// corner, matching the row order the compute stage writes in.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(-1.0, -1.0, 0.0, 1.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(1.0, 1.0, 1.0, 0.0),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn params_match_wgsl_layout() {
        assert_eq!(mem::size_of::<Params>(), 80);

        let params = Params::new(
            vec3(1.0, 2.0, 3.0),
            vec3(0.0, 0.0, -1.0),
            Vec3::Y,
            vec3(4.0, 5.0, 6.0),
            ivec2(800, 600),
        );

        let words: &[f32] = cast_slice(bytes_of(&params));

        assert_eq!(&words[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&words[4..7], &[0.0, 0.0, -1.0]);
        assert_eq!(&words[8..11], &[0.0, 1.0, 0.0]);
        assert_eq!(&words[12..15], &[4.0, 5.0, 6.0]);

        let ints: &[i32] = cast_slice(bytes_of(&params));

        assert_eq!(&ints[16..18], &[800, 600]);
    }

    #[test]
    fn quad_covers_clip_space() {
        for v in QUAD_VERTICES {
            let [x, y] = v.position;
            let [u, w] = v.uv;

            assert_eq!(u, (x + 1.0) / 2.0);
            assert_eq!(w, (1.0 - y) / 2.0);
        }

        assert_eq!(mem::size_of::<QuadVertex>(), 16);
    }
}
