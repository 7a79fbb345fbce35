//! Tunables for navigation, focus transitions, textures and scene discovery.
//!
//! Every field has a default, so a config file only needs to list the values
//! it overrides.

use glam::{Quat, Vec3};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub camera: CameraConfig,
    pub movement: MovementConfig,
    pub transition: TransitionConfig,
    pub focus: FocusConfig,
    pub texture: TextureConfig,
    pub discovery: DiscoveryConfig,
    pub monitors: Vec<MonitorContent>,
    pub playlist: Vec<String>,
    pub clipboard_notes: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub initial_position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub initial_orientation: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub movement_speed: f32,
    /// Keyboard look rate in radians per second.
    pub look_speed: f32,
    /// Roll rate in radians per second.
    pub roll_speed: f32,
    pub max_roll: f32,
    pub person_height: f32,
    pub bounds_padding: f32,
    /// Radians of look per pixel of pointer drag.
    pub drag_look_sensitivity: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub monitor_distance_multiplier: f32,
    pub clipboard_vertical_offset_multiplier: f32,
    pub clipboard_lateral_offset_multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub canvas_size: u32,
    pub default_emissive: f32,
    pub video_emissive: f32,
    pub text_emissive: f32,
    /// The clipboard page is lit like paper, not like a screen.
    pub notes_emissive: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub clipboard_page_name: String,
    /// Case-insensitive fragments identifying the clipboard body among the
    /// page's ancestors.
    pub clipboard_name_hints: Vec<String>,
    pub highlight_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorContentKind {
    Video,
    Image,
    Music,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MonitorContent {
    pub index: usize,
    pub kind: MonitorContentKind,
    #[serde(default)]
    pub path: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let monitor = |index: usize, kind: MonitorContentKind, path: &str| MonitorContent {
            index,
            kind,
            path: path.to_string(),
        };
        Self {
            camera: CameraConfig::default(),
            movement: MovementConfig::default(),
            transition: TransitionConfig::default(),
            focus: FocusConfig::default(),
            texture: TextureConfig::default(),
            discovery: DiscoveryConfig::default(),
            monitors: vec![
                monitor(0, MonitorContentKind::Video, "assets/videos/Pingpong.mp4"),
                monitor(1, MonitorContentKind::Video, "assets/videos/NeoVSMerovingian.mp4"),
                monitor(2, MonitorContentKind::Image, "assets/images/QRCode.png"),
                monitor(3, MonitorContentKind::Video, "assets/videos/RonaldinhoMagic.mp4"),
                monitor(4, MonitorContentKind::Video, "assets/videos/ColoredStatic.mp4"),
                monitor(5, MonitorContentKind::Image, "assets/images/DontPress.png"),
                monitor(6, MonitorContentKind::Music, ""),
                monitor(7, MonitorContentKind::Video, "assets/videos/Static.mp4"),
                monitor(8, MonitorContentKind::Video, "assets/videos/Teamwork.mp4"),
            ],
            playlist: vec![
                "assets/music/Deftones - My Own Summer.mp3".to_string(),
                "assets/music/Ghost.mp3".to_string(),
                "assets/music/Logos.mp3".to_string(),
                "assets/music/Profissional.mp3".to_string(),
                "assets/music/Spybreak!.mp3".to_string(),
            ],
            clipboard_notes: "Project Notes\n- Polish 3D workspace\n- Refine monitor interactions\n- Record portfolio walkthrough".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 0.25,
            far: 20.0,
            initial_position: [1.11, 3.83, 8.51],
            initial_orientation: [-0.110, 0.047, 0.005, 0.993],
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            look_speed: 1.8,
            roll_speed: std::f32::consts::PI / 12.0,
            max_roll: std::f32::consts::PI / 12.0,
            person_height: 5.5,
            bounds_padding: 0.5,
            drag_look_sensitivity: 0.004,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { duration_ms: 1000 }
    }
}

impl TransitionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            monitor_distance_multiplier: 1.5,
            clipboard_vertical_offset_multiplier: 1.4,
            clipboard_lateral_offset_multiplier: 0.4,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            canvas_size: 2048,
            default_emissive: 1.5,
            video_emissive: 1.0,
            text_emissive: 1.8,
            notes_emissive: 0.0,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            clipboard_page_name: "page_page_0".to_string(),
            clipboard_name_hints: vec!["clip".to_string(), "board".to_string()],
            highlight_names: vec!["Button".to_string()],
        }
    }
}

impl ExplorerConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: ExplorerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transition.duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "transition.duration_ms must be positive".to_string(),
            ));
        }
        if self.texture.canvas_size < 64 {
            return Err(ConfigError::Invalid(format!(
                "texture.canvas_size {} is below the 64px minimum",
                self.texture.canvas_size
            )));
        }
        if !(self.movement.max_roll >= 0.0) {
            return Err(ConfigError::Invalid(
                "movement.max_roll must be non-negative".to_string(),
            ));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range {}..{} is empty",
                self.camera.near, self.camera.far
            )));
        }
        let orientation = Quat::from_array(self.camera.initial_orientation);
        if !orientation.is_finite() || orientation.length_squared() < 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "camera.initial_orientation {:?} is not a rotation",
                self.camera.initial_orientation
            )));
        }
        if !Vec3::from(self.camera.initial_position).is_finite() {
            return Err(ConfigError::Invalid(format!(
                "camera.initial_position {:?} is not finite",
                self.camera.initial_position
            )));
        }
        let music_monitors = self
            .monitors
            .iter()
            .filter(|monitor| monitor.kind == MonitorContentKind::Music)
            .count();
        if music_monitors > 1 {
            return Err(ConfigError::Invalid(format!(
                "{} monitors are marked as music players, at most one is supported",
                music_monitors
            )));
        }
        Ok(())
    }
}
