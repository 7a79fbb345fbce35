pub mod focus;
mod input;
pub mod interaction;
mod timing;

pub use focus::{ClickOutcome, FocusController, FocusEvent, FocusState, Transition};
pub use interaction::{ControllerEvent, InteractionController};

use crate::assets::{self, AssetError};
use crate::config::{ConfigError, ExplorerConfig};
use crate::render::{CursorIcon, HighlightEvent, LogRenderer, Projection};
use crate::ui::OverlayError;
use glam::Vec2;
use input::{InputState, PointerDrag};
use timing::FrameTiming;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Desk Explorer";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Command line: optional config and scene files.
#[derive(Debug, Default, PartialEq)]
pub struct LaunchOptions {
    pub config: Option<PathBuf>,
    pub scene: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, AppError> {
        let mut options = LaunchOptions::default();
        while let Some(arg) = args.next() {
            let slot = match arg.as_str() {
                "--config" => &mut options.config,
                "--scene" => &mut options.scene,
                other => return Err(AppError::Usage(format!("unknown argument '{}'", other))),
            };
            let value = args
                .next()
                .ok_or_else(|| AppError::Usage(format!("{} needs a path", arg)))?;
            *slot = Some(PathBuf::from(value));
        }
        Ok(options)
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    controller: InteractionController,
    renderer: LogRenderer,
    input: InputState,
    drag: PointerDrag,
    drag_sensitivity: f32,
    mouse_pos: Option<Vec2>,
    window_size: PhysicalSize<u32>,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(controller: InteractionController, drag_sensitivity: f32) -> Self {
        let now = Instant::now();
        Self {
            window: None,
            controller,
            renderer: LogRenderer::new(),
            input: InputState::default(),
            drag: PointerDrag::default(),
            drag_sensitivity,
            mouse_pos: None,
            window_size: PhysicalSize::new(1280, 720),
            timing: FrameTiming::new(WINDOW_TITLE.to_string(), now),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: now,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.window_size = size;
        self.controller.set_viewport(size.width, size.height);
    }

    fn ndc(&self, position: Vec2) -> Vec2 {
        Projection::ndc_from_pixels(
            position.x,
            position.y,
            self.window_size.width as f32,
            self.window_size.height as f32,
        )
    }

    fn status(&self) -> String {
        match self.controller.focus_state() {
            FocusState::Free => "free roam".to_string(),
            FocusState::Transitioning(_) => "moving".to_string(),
            FocusState::Focused(surface) => {
                format!("inspecting {}", self.controller.graph().name(surface.surface))
            }
        }
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let status = self.status();
        self.timing.update(self.window.as_deref(), now, &status);
        let look = self.drag.take_look_delta(self.drag_sensitivity);
        let navigation = self.input.navigation(look);
        self.controller
            .tick(now, self.timing.frame_dt, &navigation, &mut self.renderer);
        self.dispatch_events();
    }

    fn dispatch_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                ControllerEvent::Cursor(icon) => {
                    if let Some(window) = &self.window {
                        window.set_cursor(match icon {
                            CursorIcon::Default => winit::window::CursorIcon::Default,
                            CursorIcon::Pointer => winit::window::CursorIcon::Pointer,
                        });
                    }
                }
                ControllerEvent::Media(command) => log::info!("Media request: {:?}", command),
                ControllerEvent::FreeRoam(enabled) => {
                    if !enabled {
                        self.drag.cancel();
                    }
                    log::debug!("Free roam {}", if enabled { "on" } else { "off" });
                }
                ControllerEvent::FocusChanged(state) => log::debug!("Focus state: {:?}", state),
                ControllerEvent::Highlight(HighlightEvent::Added(outline)) => {
                    log::debug!("Outline {} added", outline.id.0)
                }
                ControllerEvent::Highlight(HighlightEvent::Removed { outline, .. }) => {
                    log::debug!("Outline {} removed", outline.0)
                }
                ControllerEvent::OverlayUpdated { surface } | ControllerEvent::OverlayReleased { surface } => {
                    log::debug!("Overlay on surface {} changed", surface.0)
                }
            }
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.controller.teardown(&mut self.renderer);
        self.dispatch_events();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(self.window_size)
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                self.shutdown(event_loop);
                return;
            }
        };

        self.handle_resize(window.inner_size());
        self.controller.apply_content(&mut self.renderer);
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input.release_all();
                    self.drag.cancel();
                    self.mouse_pos = None;
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    self.shutdown(event_loop);
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                self.input.handle_key(event.physical_key, pressed);
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_pos = Some(position);
                self.drag.moved(position);
                self.controller.on_pointer_move(self.ndc(position));
                self.dispatch_events();
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
                self.drag.cancel();
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(position) = self.mouse_pos else {
                    return;
                };
                match state {
                    ElementState::Pressed => self.drag.press(position),
                    ElementState::Released => {
                        if self.drag.release() {
                            self.controller.on_click(self.ndc(position), Instant::now());
                            self.dispatch_events();
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

/// Loads config and scene, then runs the window until it is closed.
pub fn run(args: impl Iterator<Item = String>) -> Result<(), AppError> {
    let options = LaunchOptions::parse(args)?;
    let config = match &options.config {
        Some(path) => ExplorerConfig::load_from_file(path)?,
        None => ExplorerConfig::default(),
    };
    let graph = assets::load_scene(options.scene.as_deref())?;
    let drag_sensitivity = config.movement.drag_look_sensitivity;
    let controller = InteractionController::new(config, graph, 1280.0 / 720.0)?;

    log::info!("Desk Explorer");
    log::info!("   WASD to walk, arrows or drag to look, Q/E to roll, click to inspect");
    log::info!("   Press ESC or close window to exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(controller, drag_sensitivity);
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_launch_options() {
        let options = LaunchOptions::parse(args(&["--scene", "desk.json", "--config", "c.json"])).unwrap();
        assert_eq!(options.scene, Some(PathBuf::from("desk.json")));
        assert_eq!(options.config, Some(PathBuf::from("c.json")));
        assert_eq!(LaunchOptions::parse(args(&[])).unwrap(), LaunchOptions::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            LaunchOptions::parse(args(&["--scene"])),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            LaunchOptions::parse(args(&["--fullscreen"])),
            Err(AppError::Usage(_))
        ));
    }
}
