//! Pointer and frame handling for the desk scene.
//!
//! [`InteractionController`] owns the camera pose and every piece of
//! interaction state. Pointer events run picking and resolution and feed the
//! hover highlighter, the focus state machine or the media overlay. Work for
//! the renderer (outlines, overlay repaints) is queued and flushed on the
//! next [`InteractionController::tick`], right before the frame is drawn.

use super::focus::{ClickOutcome, FocusController, FocusEvent, FocusState};
use crate::assets::{self, MonitorAssignment};
use crate::config::ExplorerConfig;
use crate::render::{
    BoundedNavigator, CursorIcon, HighlightEvent, HoverHighlighter, NavigationInput, Pose,
    Projection, Ray, SceneRenderer, SpatialIndex,
};
use crate::scene::resolve::{SurfaceResolver, SurfaceRoles};
use crate::scene::{SceneGraph, SurfaceId};
use crate::ui::{MediaCommand, MediaPlayerOverlay, OverlayError};
use glam::Vec2;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    FocusChanged(FocusState),
    /// Whether free-roam input is accepted.
    FreeRoam(bool),
    Highlight(HighlightEvent),
    Cursor(CursorIcon),
    Media(MediaCommand),
    OverlayUpdated { surface: SurfaceId },
    OverlayReleased { surface: SurfaceId },
}

pub struct InteractionController {
    config: ExplorerConfig,
    graph: SceneGraph,
    roles: SurfaceRoles,
    assignments: Vec<MonitorAssignment>,
    pose: Pose,
    projection: Projection,
    navigator: BoundedNavigator,
    focus: FocusController,
    highlighter: HoverHighlighter,
    cursor: CursorIcon,
    overlay: Option<MediaPlayerOverlay>,
    pending: Vec<HighlightEvent>,
    overlay_dirty: bool,
    events: Vec<ControllerEvent>,
    running: bool,
}

impl InteractionController {
    /// Runs discovery on `graph` and sets up navigation, focus and the media
    /// overlay when a monitor is configured for music.
    pub fn new(config: ExplorerConfig, graph: SceneGraph, aspect: f32) -> Result<Self, OverlayError> {
        let discovered = assets::discover(&graph, &config.discovery);
        let mut roles = discovered.roles;
        let assignments = assets::plan_content(&mut roles, &config.monitors);

        let overlay = match roles.media_monitor {
            Some(_) => Some(MediaPlayerOverlay::new(
                config.playlist.clone(),
                config.texture.canvas_size,
            )?),
            None => None,
        };

        let mut navigator = BoundedNavigator::new(&config.movement);
        navigator.set_bounds(discovered.bounds);
        let mut pose = Pose::from_config(&config.camera);
        navigator.constrain(&mut pose);

        Ok(Self {
            projection: Projection::from_config(&config.camera, aspect),
            focus: FocusController::new(&config.transition, &config.focus),
            config,
            graph,
            roles,
            assignments,
            pose,
            navigator,
            highlighter: HoverHighlighter::new(),
            cursor: CursorIcon::Default,
            overlay,
            pending: Vec::new(),
            overlay_dirty: false,
            events: Vec::new(),
            running: true,
        })
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn roles(&self) -> &SurfaceRoles {
        &self.roles
    }

    pub fn overlay(&self) -> Option<&MediaPlayerOverlay> {
        self.overlay.as_ref()
    }

    pub fn highlighter(&self) -> &HoverHighlighter {
        &self.highlighter
    }

    pub fn cursor(&self) -> CursorIcon {
        self.highlighter.cursor()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection.set_viewport(width, height);
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sends monitor content and the clipboard notes to the renderer.
    pub fn apply_content(&mut self, renderer: &mut dyn SceneRenderer) {
        assets::apply_content(
            renderer,
            &mut self.graph,
            &self.roles,
            &self.assignments,
            self.overlay.as_ref(),
            &self.config,
        );
    }

    // ====================================================================
    // Pointer
    // ====================================================================

    pub fn on_pointer_move(&mut self, ndc: Vec2) {
        let ray = self.projection.screen_ray(&self.pose, ndc);
        self.on_pointer_ray(&ray);
    }

    pub fn on_pointer_ray(&mut self, ray: &Ray) {
        if !self.running || !self.focus.is_free() {
            return;
        }
        let mut candidates = self.roles.highlight_targets.clone();
        if let Some(group) = self.roles.clipboard {
            candidates.push(group.interactive);
        }
        let target = SpatialIndex::new(&self.graph)
            .nearest(ray, &candidates)
            .map(|hit| SurfaceResolver::new(&self.graph, &self.roles).resolve_highlight(hit.surface));
        let events = self.highlighter.on_pointer_move(&self.graph, target, true);
        self.record_highlight(events);
    }

    pub fn on_click(&mut self, ndc: Vec2, now: Instant) -> ClickOutcome {
        let ray = self.projection.screen_ray(&self.pose, ndc);
        self.on_click_ray(&ray, now)
    }

    pub fn on_click_ray(&mut self, ray: &Ray, now: Instant) -> ClickOutcome {
        if !self.running {
            return ClickOutcome::Unchanged;
        }
        if self.focus.state().is_transitioning() {
            log::debug!("Click ignored while the camera is moving");
            return ClickOutcome::Ignored;
        }

        let hit = SpatialIndex::new(&self.graph).nearest(ray, &self.roles.click_candidates());
        let resolved = hit.as_ref().and_then(|hit| {
            SurfaceResolver::new(&self.graph, &self.roles).resolve_click(hit.surface)
        });

        // The focused media monitor takes clicks for its overlay.
        if let (Some(focused), Some(media)) = (self.focus.state().focused(), self.roles.media_monitor) {
            if focused.surface == media && resolved.map(|r| r.surface) == Some(media) {
                let uv = hit
                    .filter(|hit| hit.surface == media)
                    .and_then(|hit| hit.uv);
                if let Some(uv) = uv {
                    self.press_overlay(uv);
                }
                return ClickOutcome::Unchanged;
            }
        }

        let was_free = self.focus.is_free();
        let outcome = self
            .focus
            .handle_click(&self.pose, resolved, &self.graph, &self.roles, now);
        match outcome {
            ClickOutcome::Focusing(_) | ClickOutcome::Returning => {
                let cleared = self.highlighter.clear();
                self.record_highlight(cleared);
                if was_free {
                    self.events.push(ControllerEvent::FreeRoam(false));
                }
                self.events
                    .push(ControllerEvent::FocusChanged(self.focus.state()));
            }
            ClickOutcome::Ignored | ClickOutcome::Unchanged => {}
        }
        outcome
    }

    fn press_overlay(&mut self, uv: Vec2) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let Some(button) = overlay.hit_test(uv) else {
            return;
        };
        log::info!("Overlay button {}", button.name());
        let commands = overlay.activate(button);
        self.record_media(commands);
    }

    /// Natural end of the current track.
    pub fn on_media_ended(&mut self) {
        if !self.running {
            return;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            let commands = overlay.on_media_ended();
            self.record_media(commands);
        }
    }

    fn record_media(&mut self, commands: Vec<MediaCommand>) {
        self.events
            .extend(commands.into_iter().map(ControllerEvent::Media));
        self.overlay_dirty = true;
    }

    fn record_highlight(&mut self, events: Vec<HighlightEvent>) {
        for event in events {
            self.events.push(ControllerEvent::Highlight(event.clone()));
            self.pending.push(event);
        }
        let cursor = self.highlighter.cursor();
        if cursor != self.cursor {
            self.cursor = cursor;
            self.events.push(ControllerEvent::Cursor(cursor));
        }
    }

    // ====================================================================
    // Frame
    // ====================================================================

    /// Navigation, then the running transition, then the frame.
    pub fn tick(
        &mut self,
        now: Instant,
        dt: f32,
        input: &NavigationInput,
        renderer: &mut dyn SceneRenderer,
    ) {
        if !self.running {
            return;
        }
        if self.focus.is_free() {
            self.navigator.update(&mut self.pose, input, dt, true);
        }
        match self.focus.tick(&mut self.pose, now) {
            Some(FocusEvent::Arrived(surface)) => {
                log::info!("Focused '{}'", self.graph.name(surface.surface));
                self.events
                    .push(ControllerEvent::FocusChanged(self.focus.state()));
            }
            Some(FocusEvent::Returned) => {
                let cleared = self.highlighter.clear();
                self.record_highlight(cleared);
                self.events
                    .push(ControllerEvent::FocusChanged(self.focus.state()));
                self.events.push(ControllerEvent::FreeRoam(true));
            }
            None => {}
        }
        self.flush(renderer);
        renderer.render(&self.pose);
    }

    fn flush(&mut self, renderer: &mut dyn SceneRenderer) {
        for event in self.pending.drain(..) {
            match event {
                HighlightEvent::Added(outline) => renderer.attach_outline(&outline),
                HighlightEvent::Removed { surface, outline } => {
                    renderer.detach_outline(surface, outline)
                }
            }
        }
        if !std::mem::take(&mut self.overlay_dirty) {
            return;
        }
        if let (Some(overlay), Some(surface)) = (self.overlay.as_ref(), self.roles.media_monitor) {
            assets::apply_surface_texture(
                renderer,
                &mut self.graph,
                surface,
                &overlay.texture(),
                self.config.texture.text_emissive,
            );
            self.events.push(ControllerEvent::OverlayUpdated { surface });
        }
    }

    /// Stops ticking and releases every outline and the overlay. Safe to
    /// call more than once.
    pub fn teardown(&mut self, renderer: &mut dyn SceneRenderer) {
        if !self.running {
            return;
        }
        self.running = false;
        self.overlay_dirty = false;
        let released = self.highlighter.release_all();
        self.record_highlight(released);
        self.flush(renderer);
        if self.overlay.take().is_some() {
            if let Some(surface) = self.roles.media_monitor {
                self.events.push(ControllerEvent::OverlayReleased { surface });
            }
        }
        log::info!("Interaction controller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::load_scene;
    use crate::render::LogRenderer;
    use crate::scene::resolve::SurfaceKind;
    use glam::Vec3;
    use std::time::Duration;

    const SECOND: Duration = Duration::from_millis(1000);

    fn controller() -> InteractionController {
        let graph = load_scene(None).unwrap();
        InteractionController::new(ExplorerConfig::default(), graph, 16.0 / 9.0).unwrap()
    }

    fn ray_at(controller: &InteractionController, surface: SurfaceId) -> Ray {
        let aabb = controller.graph().world_aabb(surface).unwrap();
        let target = aabb.center() + Vec3::new(0.013, 0.021, 0.0);
        let origin = controller.pose().position;
        Ray::new(origin, target - origin)
    }

    fn empty_ray(controller: &InteractionController) -> Ray {
        Ray::new(controller.pose().position, Vec3::Y)
    }

    #[test]
    fn hover_outlines_monitor_and_clears_on_miss() {
        let mut c = controller();
        let monitor = c.roles().monitors[4];
        c.on_pointer_ray(&ray_at(&c, monitor));
        assert_eq!(c.highlighter().hovered(), Some(monitor));
        assert_eq!(c.cursor(), CursorIcon::Pointer);
        c.on_pointer_ray(&empty_ray(&c));
        assert_eq!(c.highlighter().hovered(), None);
        let events = c.drain_events();
        assert!(events.contains(&ControllerEvent::Cursor(CursorIcon::Pointer)));
        assert!(events.contains(&ControllerEvent::Cursor(CursorIcon::Default)));
    }

    #[test]
    fn highlight_events_reach_renderer_on_tick() {
        let mut c = controller();
        let mut renderer = LogRenderer::new();
        let monitor = c.roles().monitors[0];
        c.on_pointer_ray(&ray_at(&c, monitor));
        assert_eq!(renderer.live_outlines(), 0);
        c.tick(Instant::now(), 0.0, &NavigationInput::default(), &mut renderer);
        assert_eq!(renderer.live_outlines(), 1);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn click_monitor_focuses_and_disables_hover() {
        let mut c = controller();
        let mut renderer = LogRenderer::new();
        let monitor = c.roles().monitors[2];
        let t0 = Instant::now();
        c.on_pointer_ray(&ray_at(&c, monitor));
        let outcome = c.on_click_ray(&ray_at(&c, monitor), t0);
        assert!(matches!(outcome, ClickOutcome::Focusing(s) if s.surface == monitor));
        assert_eq!(c.highlighter().hovered(), None);

        c.on_pointer_ray(&ray_at(&c, monitor));
        assert_eq!(c.highlighter().hovered(), None);

        c.tick(t0 + SECOND, 0.016, &NavigationInput::default(), &mut renderer);
        assert_eq!(c.focus_state().focused().map(|s| s.surface), Some(monitor));
        assert_eq!(renderer.live_outlines(), 0);
        let events = c.drain_events();
        assert!(events.contains(&ControllerEvent::FreeRoam(false)));
    }

    #[test]
    fn clipboard_click_resolves_to_body_and_hover_to_page() {
        let mut c = controller();
        let group = c.roles().clipboard.unwrap();
        c.on_pointer_ray(&ray_at(&c, group.page));
        assert_eq!(c.highlighter().hovered(), Some(group.page));
        let outcome = c.on_click_ray(&ray_at(&c, group.page), Instant::now());
        assert_eq!(
            outcome,
            ClickOutcome::Focusing(crate::scene::resolve::ResolvedSurface {
                surface: group.interactive,
                kind: SurfaceKind::Clipboard,
            })
        );
    }

    #[test]
    fn media_monitor_clicks_drive_overlay_without_moving() {
        let mut c = controller();
        let mut renderer = LogRenderer::new();
        c.apply_content(&mut renderer);
        let media = c.roles().media_monitor.unwrap();
        let t0 = Instant::now();
        c.on_click_ray(&ray_at(&c, media), t0);
        c.tick(t0 + SECOND, 0.016, &NavigationInput::default(), &mut renderer);
        assert_eq!(c.focus_state().focused().map(|s| s.surface), Some(media));
        c.drain_events();

        // Aim at the play button: centered horizontally, half height.
        let pose_before = *c.pose();
        let world = c.graph().world_transform(media);
        let mesh = c.graph().mesh(media).unwrap();
        let aabb = mesh.local_aabb().unwrap();
        let target = world.transform_point3(aabb.center() + Vec3::new(0.011, 0.007, 0.0));
        let origin = c.pose().position;
        let outcome = c.on_click_ray(&Ray::new(origin, target - origin), t0 + SECOND * 2);
        assert_eq!(outcome, ClickOutcome::Unchanged);
        assert_eq!(*c.pose(), pose_before);
        assert!(c.overlay().unwrap().is_playing());

        c.tick(t0 + SECOND * 3, 0.016, &NavigationInput::default(), &mut renderer);
        let events = c.drain_events();
        assert!(events.contains(&ControllerEvent::Media(MediaCommand::Play)));
        assert!(events.contains(&ControllerEvent::OverlayUpdated { surface: media }));
        assert_eq!(c.focus_state().focused().map(|s| s.surface), Some(media));
    }

    #[test]
    fn media_end_advances_playlist() {
        let mut c = controller();
        c.on_media_ended();
        assert_eq!(c.overlay().unwrap().selected(), 1);
        let events = c.drain_events();
        assert!(events.contains(&ControllerEvent::Media(MediaCommand::Selected(1))));
    }

    #[test]
    fn teardown_releases_everything_once() {
        let mut c = controller();
        let mut renderer = LogRenderer::new();
        let monitor = c.roles().monitors[0];
        c.on_pointer_ray(&ray_at(&c, monitor));
        c.tick(Instant::now(), 0.0, &NavigationInput::default(), &mut renderer);
        assert_eq!(renderer.live_outlines(), 1);

        c.teardown(&mut renderer);
        assert_eq!(renderer.live_outlines(), 0);
        assert!(c.overlay().is_none());
        let released = c
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, ControllerEvent::OverlayReleased { .. }))
            .count();
        assert_eq!(released, 1);

        c.teardown(&mut renderer);
        assert!(c.drain_events().is_empty());
        c.tick(Instant::now(), 0.1, &NavigationInput::default(), &mut renderer);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn missing_playlist_is_an_error_only_with_a_music_monitor() {
        let graph = load_scene(None).unwrap();
        let config = ExplorerConfig {
            playlist: Vec::new(),
            ..ExplorerConfig::default()
        };
        assert!(matches!(
            InteractionController::new(config.clone(), graph.clone(), 1.0),
            Err(OverlayError::EmptyPlaylist)
        ));
        let config = ExplorerConfig {
            monitors: Vec::new(),
            ..config
        };
        let c = InteractionController::new(config, graph, 1.0).unwrap();
        assert!(c.overlay().is_none());
    }
}
