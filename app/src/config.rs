use compute_raymarch_common::glam::Vec3;
use pixels::wgpu;
use std::time::Duration;

pub const WINDOW_TITLE: &str = "Compute Shader - Test";

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// Format of the image written by the compute stage; must match the
/// `texture_storage_2d` declaration in `shader/raymarch.wgsl`.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

pub const COMPUTE_SHADER: &str = "shader/raymarch.wgsl";
pub const VERTEX_SHADER: &str = "shader/quad_vs.wgsl";
pub const FRAGMENT_SHADER: &str = "shader/quad_fs.wgsl";

/// How often the shader files are checked for modifications.
pub const SHADER_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub const CAMERA_YAW: f32 = -90.0;
pub const CAMERA_PITCH: f32 = 0.0;
pub const CAMERA_RADIUS: f32 = 5.0;
pub const CAMERA_FOCUS: Vec3 = Vec3::new(0.0, 0.0, -5.0);

/// Degrees of rotation per pixel of pointer motion.
pub const CAMERA_SENSITIVITY: f32 = 0.1;

pub const LIGHT_POS: Vec3 = Vec3::new(3.0, 4.0, 0.0);
