mod camera;
pub mod highlight;
pub mod pick;

pub use camera::{BoundedNavigator, NavigationInput};
pub use highlight::{CursorIcon, HighlightEvent, HoverHighlighter, Outline, OutlineId};
pub use pick::{PickHit, Ray, SpatialIndex};

use crate::config::CameraConfig;
use crate::scene::SurfaceId;
use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

// ========================================================================
// Pose: camera position + orientation
// ========================================================================

/// Camera placement. The camera looks down its local -Z with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    /// Falls back to the identity rotation when the configured quaternion
    /// cannot be normalized.
    pub fn from_config(config: &CameraConfig) -> Self {
        let orientation = Quat::from_array(config.initial_orientation);
        let orientation = if orientation.is_finite() && orientation.length_squared() >= 1e-6 {
            orientation
        } else {
            log::warn!(
                "Initial orientation {:?} is degenerate, using identity",
                config.initial_orientation
            );
            Quat::IDENTITY
        };
        Self::new(Vec3::from(config.initial_position), orientation)
    }

    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self::new(position, look_rotation(position, target, up))
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Rotation about the view axis, the Z angle of a YXZ decomposition.
    pub fn roll(&self) -> f32 {
        let (_, _, roll) = self.orientation.to_euler(EulerRot::YXZ);
        roll
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    /// Same position within `epsilon` and same rotation (either quaternion sign).
    pub fn approx_eq(&self, other: &Pose, epsilon: f32) -> bool {
        self.position.abs_diff_eq(other.position, epsilon)
            && 1.0 - self.orientation.dot(other.orientation).abs() <= epsilon
    }
}

/// Camera orientation looking from `eye` towards `target`.
///
/// Degenerate inputs never produce NaN: a zero view vector looks down -Z and
/// an up hint parallel to the view direction is nudged off axis.
pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let mut z = eye - target;
    if z.length_squared() == 0.0 {
        z = Vec3::Z;
    }
    z = z.normalize();
    let mut x = up.cross(z);
    if x.length_squared() == 0.0 {
        if up.z.abs() == 1.0 {
            z.x += 0.0001;
        } else {
            z.z += 0.0001;
        }
        z = z.normalize();
        x = up.cross(z);
    }
    if x.length_squared() == 0.0 {
        // Zero up hint.
        x = Vec3::X;
    }
    x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

// ========================================================================
// Projection: viewport to world rays
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_y: config.fov_deg.to_radians(),
            aspect: aspect.max(1e-3),
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Pixel position to normalized device coordinates, `y` up.
    pub fn ndc_from_pixels(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
        Vec2::new(
            (x / width.max(1.0)) * 2.0 - 1.0,
            -(y / height.max(1.0)) * 2.0 + 1.0,
        )
    }

    /// World-space ray from the camera through `ndc`.
    pub fn screen_ray(&self, pose: &Pose, ndc: Vec2) -> Ray {
        let inverse = (self.matrix() * pose.view_matrix()).inverse();
        let far = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let far = far.truncate() / far.w;
        let direction = far - pose.position;
        if !direction.is_finite() || direction.length_squared() < 1e-12 {
            return Ray::new(pose.position, pose.forward());
        }
        Ray::new(pose.position, direction)
    }
}

// ========================================================================
// Textures and the renderer seam
// ========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    Video { path: PathBuf },
    Image { path: PathBuf },
    Generated(RgbaImage),
}

impl TextureSource {
    /// Video keeps the renderer's tone mapping; stills and generated pixels
    /// are shown as authored.
    pub fn tone_mapped(&self) -> bool {
        matches!(self, TextureSource::Video { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            TextureSource::Video { path } => format!("video {}", path.display()),
            TextureSource::Image { path } => format!("image {}", path.display()),
            TextureSource::Generated(image) => {
                format!("generated {}x{}", image.width(), image.height())
            }
        }
    }
}

/// What the controller needs from a renderer.
pub trait SceneRenderer {
    fn apply_texture(
        &mut self,
        surface: SurfaceId,
        source: &TextureSource,
        emissive: f32,
        tone_mapped: bool,
    );
    fn attach_outline(&mut self, outline: &Outline);
    fn detach_outline(&mut self, surface: SurfaceId, outline: OutlineId);
    fn render(&mut self, pose: &Pose);
}

/// Renderer that keeps the bookkeeping a GPU renderer would and reports it
/// through the log.
#[derive(Debug, Default)]
pub struct LogRenderer {
    textures: HashMap<SurfaceId, (String, f32, bool)>,
    outlines: HashSet<OutlineId>,
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_outlines(&self) -> usize {
        self.outlines.len()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn texture(&self, surface: SurfaceId) -> Option<&(String, f32, bool)> {
        self.textures.get(&surface)
    }
}

impl SceneRenderer for LogRenderer {
    fn apply_texture(
        &mut self,
        surface: SurfaceId,
        source: &TextureSource,
        emissive: f32,
        tone_mapped: bool,
    ) {
        let description = source.describe();
        log::debug!(
            "texture {} on surface {} (emissive {}, tone mapped {})",
            description,
            surface.0,
            emissive,
            tone_mapped
        );
        self.textures
            .insert(surface, (description, emissive, tone_mapped));
    }

    fn attach_outline(&mut self, outline: &Outline) {
        if !self.outlines.insert(outline.id) {
            log::warn!("Outline {} attached twice.", outline.id.0);
        }
    }

    fn detach_outline(&mut self, surface: SurfaceId, outline: OutlineId) {
        if !self.outlines.remove(&outline) {
            log::debug!(
                "Outline {} on surface {} already released.",
                outline.0,
                surface.0
            );
        }
    }

    fn render(&mut self, pose: &Pose) {
        self.frames += 1;
        log::trace!(
            "frame {} at ({:.2}, {:.2}, {:.2})",
            self.frames,
            pose.position.x,
            pose.position.y,
            pose.position.z
        );
    }
}
