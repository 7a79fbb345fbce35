//! Desk Explorer - navigation and interaction controller for a virtual desk scene
//!
//! The crate owns the first-person camera, hit-testing against interactive
//! surfaces, the focus/inspection state machine and the media-player overlay
//! drawn onto one monitor. Rendering, asset decoding and media playback are
//! collaborators reached through [`render::SceneRenderer`] and the
//! [`app::ControllerEvent`] stream.

pub mod app;
pub mod assets;
pub mod config;
pub mod render;
pub mod scene;
pub mod ui;
