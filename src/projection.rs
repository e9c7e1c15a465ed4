//! World-to-screen projection of 3-D points through camera view/projection matrices.

use glam::{DVec2, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Uniform scale of the per-point model matrix.
const MODEL_SCALE: f32 = 1.0;

/// Clip-space `w` at or below this is behind (or on) the camera plane.
pub const MIN_CLIP_W: f32 = 1e-6;

/// `projection * view * model` for a point placed at `world`.
pub fn world_to_clip_matrix(world: Vec3, view: &Mat4, projection: &Mat4) -> Mat4 {
    let model =
        Mat4::from_scale_rotation_translation(Vec3::splat(MODEL_SCALE), Quat::IDENTITY, world);
    *projection * *view * model
}

/// Maps a world point to pixel coordinates (origin top left, y down).
///
/// Returns `None` when the point is off-screen, including points behind the camera
/// (clip `w` not positive) where the perspective divide is meaningless.
pub fn project(
    world: Vec3,
    view: &Mat4,
    projection: &Mat4,
    screen_width: u32,
    screen_height: u32,
) -> Option<DVec2> {
    let clip = world_to_clip_matrix(world, view, projection) * Vec4::W;
    clip_to_screen(clip, screen_width, screen_height)
}

fn clip_to_screen(clip: Vec4, screen_width: u32, screen_height: u32) -> Option<DVec2> {
    if !(clip.w > MIN_CLIP_W) {
        return None;
    }
    let ndc_x = (clip.x / clip.w) as f64;
    let ndc_y = (clip.y / clip.w) as f64;

    let width = screen_width as f64;
    let height = screen_height as f64;
    let px = width * ((ndc_x + 1.0) / 2.0);
    let py = height * ((1.0 - ndc_y) / 2.0);

    if px < 0.0 || px > width || py < 0.0 || py > height || px.is_nan() || py.is_nan() {
        None
    } else {
        Some(DVec2::new(px, py))
    }
}

/// Per-frame projector: caches `projection * view` for one camera.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    view_projection: Mat4,
    width: u32,
    height: u32,
}

impl Projector {
    pub fn new(view: &Mat4, projection: &Mat4, width: u32, height: u32) -> Projector {
        Projector {
            view_projection: *projection * *view,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn project(&self, world: Vec3) -> Option<DVec2> {
        let model =
            Mat4::from_scale_rotation_translation(Vec3::splat(MODEL_SCALE), Quat::IDENTITY, world);
        let clip = self.view_projection * model * Vec4::W;
        clip_to_screen(clip, self.width, self.height)
    }
}

/// Pinhole intrinsics in pixels, image origin top left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
}

impl CameraIntrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32, width: u32, height: u32) -> CameraIntrinsics {
        CameraIntrinsics {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
        }
    }

    /// OpenGL-style projection (camera looks down -z, y up) whose pixel mapping
    /// through [`project`] lands on `(fx * x / -z + cx, cy - fy * y / -z)`.
    pub fn projection_matrix(&self, near: f32, far: f32) -> Mat4 {
        let w = self.width as f32;
        let h = self.height as f32;
        let depth = far - near;
        Mat4::from_cols(
            Vec4::new(2.0 * self.fx / w, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * self.fy / h, 0.0, 0.0),
            Vec4::new(
                1.0 - 2.0 * self.cx / w,
                2.0 * self.cy / h - 1.0,
                -(far + near) / depth,
                -1.0,
            ),
            Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
        )
    }
}
