//! Media-player overlay painted onto one monitor.
//!
//! The overlay owns the playlist cursor, the play/pause flag, the button
//! hit regions and the pixels that show them. Every state change goes
//! through [`MediaPlayerOverlay::layout`] so the picture and the regions
//! always describe the same state. Playback itself happens elsewhere; the
//! overlay only emits [`MediaCommand`]s.

pub mod draw;

use crate::render::TextureSource;
use glam::Vec2;
use image::RgbaImage;
use std::path::Path;

/// Layout constants are authored against a 2048px canvas.
const REFERENCE_CANVAS: f32 = 2048.0;
const BUTTON_SIZE: f32 = 280.0;
const BUTTON_SPACING: f32 = 400.0;
const RING_WIDTH: f32 = 8.0;
const TITLE_SCALE: u32 = 14;

const BACKGROUND: u32 = 0x1a1a3e;
const SKIP_COLOR: u32 = 0x4a90e2;
const PLAY_COLOR: u32 = 0x2ecc71;
const INK: u32 = 0xffffff;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("media overlay needs at least one track")]
    EmptyPlaylist,
    #[error("media overlay canvas of {0}px is too small")]
    CanvasTooSmall(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayButton {
    Previous,
    PlayPause,
    Next,
}

impl OverlayButton {
    pub const ALL: [OverlayButton; 3] = [
        OverlayButton::Previous,
        OverlayButton::PlayPause,
        OverlayButton::Next,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OverlayButton::Previous => "previous",
            OverlayButton::PlayPause => "playpause",
            OverlayButton::Next => "next",
        }
    }
}

/// Rectangle in texture pixels, row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Edges count as inside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonRegion {
    pub button: OverlayButton,
    pub rect: Rect,
}

/// Requests for the external audio player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCommand {
    Previous,
    Next,
    /// New playlist cursor.
    Selected(usize),
    Load { index: usize, track: String },
    Play,
    Pause,
}

#[derive(Debug, Clone)]
pub struct MediaPlayerOverlay {
    tracks: Vec<String>,
    selected: usize,
    playing: bool,
    loaded: Option<usize>,
    canvas_size: u32,
    regions: Vec<ButtonRegion>,
    frame: RgbaImage,
    revision: u64,
}

impl MediaPlayerOverlay {
    pub fn new(tracks: Vec<String>, canvas_size: u32) -> Result<Self, OverlayError> {
        if tracks.is_empty() {
            return Err(OverlayError::EmptyPlaylist);
        }
        if canvas_size < 64 {
            return Err(OverlayError::CanvasTooSmall(canvas_size));
        }
        let mut overlay = Self {
            tracks,
            selected: 0,
            playing: false,
            loaded: None,
            canvas_size,
            regions: Vec::new(),
            frame: RgbaImage::new(canvas_size, canvas_size),
            revision: 0,
        };
        overlay.layout();
        Ok(overlay)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn source_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn regions(&self) -> &[ButtonRegion] {
        &self.regions
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Bumped by every [`layout`](Self::layout).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn texture(&self) -> TextureSource {
        TextureSource::Generated(self.frame.clone())
    }

    /// Track file name without directory or extension.
    pub fn title(&self) -> String {
        let track = &self.tracks[self.selected];
        Path::new(track)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| track.clone())
    }

    /// Recomputes the button regions and repaints the frame.
    pub fn layout(&mut self) {
        let size = self.canvas_size as f32;
        let ratio = size / REFERENCE_CANVAS;
        let button = BUTTON_SIZE * ratio;
        let spacing = BUTTON_SPACING * ratio;
        let center_x = size * 0.5;
        let center_y = size * 0.5;

        let centers = [
            center_x - spacing - button * 0.5,
            center_x,
            center_x + spacing + button * 0.5,
        ];
        self.regions = OverlayButton::ALL
            .iter()
            .zip(centers)
            .map(|(kind, x)| ButtonRegion {
                button: *kind,
                rect: Rect {
                    x: x - button * 0.5,
                    y: center_y - button * 0.5,
                    width: button,
                    height: button,
                },
            })
            .collect();

        self.paint(ratio);
        self.revision += 1;
    }

    fn paint(&mut self, ratio: f32) {
        let size = self.canvas_size as f32;
        draw::fill(&mut self.frame, draw::rgb(BACKGROUND));

        let title = self.title();
        let preferred = ((TITLE_SCALE as f32 * ratio).round() as u32).max(1);
        let scale = draw::fit_scale(&title, preferred, (size * 0.95) as u32);
        draw::draw_text_line(&mut self.frame, &title, size * 0.5, size * 0.3, scale, draw::rgb(INK));

        let ink = draw::rgb(INK);
        let playing = self.playing;
        for region in &self.regions {
            let (cx, cy) = region.rect.center();
            let radius = region.rect.width * 0.5;
            let color = match region.button {
                OverlayButton::PlayPause => PLAY_COLOR,
                _ => SKIP_COLOR,
            };
            draw::fill_circle(&mut self.frame, cx, cy, radius, draw::rgb(color));
            draw::stroke_circle(&mut self.frame, cx, cy, radius, RING_WIDTH * ratio, ink);

            let icon = radius * 0.4;
            match region.button {
                OverlayButton::Previous => {
                    for offset in [-icon * 0.5, icon * 0.5] {
                        let tip = cx + offset - icon * 0.5;
                        draw::fill_triangle(
                            &mut self.frame,
                            [(tip, cy), (tip + icon, cy - icon), (tip + icon, cy + icon)],
                            ink,
                        );
                    }
                }
                OverlayButton::Next => {
                    for offset in [-icon * 0.5, icon * 0.5] {
                        let tip = cx + offset + icon * 0.5;
                        draw::fill_triangle(
                            &mut self.frame,
                            [(tip, cy), (tip - icon, cy - icon), (tip - icon, cy + icon)],
                            ink,
                        );
                    }
                }
                OverlayButton::PlayPause if playing => {
                    let bar = icon * 0.45;
                    for x in [cx - icon * 0.6, cx + icon * 0.6 - bar] {
                        draw::fill_rect(&mut self.frame, x, cy - icon, bar, icon * 2.0, ink);
                    }
                }
                OverlayButton::PlayPause => {
                    draw::fill_triangle(
                        &mut self.frame,
                        [
                            (cx - icon * 0.7, cy - icon),
                            (cx - icon * 0.7, cy + icon),
                            (cx + icon, cy),
                        ],
                        ink,
                    );
                }
            }
        }
    }

    /// Button under a surface coordinate. `v` grows upward, texture rows
    /// grow downward.
    pub fn hit_test(&self, uv: Vec2) -> Option<OverlayButton> {
        let size = self.canvas_size as f32;
        let x = uv.x * size;
        let y = (1.0 - uv.y) * size;
        self.regions
            .iter()
            .find(|region| region.rect.contains(x, y))
            .map(|region| region.button)
    }

    pub fn activate(&mut self, button: OverlayButton) -> Vec<MediaCommand> {
        let count = self.tracks.len();
        let mut commands = Vec::new();
        match button {
            OverlayButton::Previous | OverlayButton::Next => {
                if button == OverlayButton::Next {
                    self.selected = (self.selected + 1) % count;
                    commands.push(MediaCommand::Next);
                } else {
                    self.selected = (self.selected + count - 1) % count;
                    commands.push(MediaCommand::Previous);
                }
                commands.push(MediaCommand::Selected(self.selected));
                commands.push(self.load_selected());
                if self.playing {
                    commands.push(MediaCommand::Play);
                }
            }
            OverlayButton::PlayPause => {
                if self.playing {
                    self.playing = false;
                    commands.push(MediaCommand::Pause);
                } else {
                    if self.loaded.is_none() {
                        commands.push(self.load_selected());
                    }
                    self.playing = true;
                    commands.push(MediaCommand::Play);
                }
            }
        }
        log::info!(
            "Media {} -> track {} '{}' ({})",
            button.name(),
            self.selected,
            self.title(),
            if self.playing { "playing" } else { "paused" }
        );
        self.layout();
        commands
    }

    /// The current track finished on its own.
    pub fn on_media_ended(&mut self) -> Vec<MediaCommand> {
        self.activate(OverlayButton::Next)
    }

    fn load_selected(&mut self) -> MediaCommand {
        self.loaded = Some(self.selected);
        MediaCommand::Load {
            index: self.selected,
            track: self.tracks[self.selected].clone(),
        }
    }
}
