//! Focus state machine and camera transitions.
//!
//! ```text
//! Free --click S--> Transitioning(focus S) --t=1--> Focused(S)
//! Focused(S) --click S / empty--> Transitioning(return) --t=1--> Free
//! Focused(S) --click S'--> Transitioning(focus S')
//! ```
//!
//! The free-roam pose is captured when leaving `Free` and is what every
//! return leg lands on. Clicks while a transition runs are ignored.

use crate::config::{FocusConfig, TransitionConfig};
use crate::render::{look_rotation, Pose};
use crate::scene::resolve::{ResolvedSurface, SurfaceKind, SurfaceRoles};
use crate::scene::{SceneGraph, SurfaceId};
use glam::{Mat4, Quat, Vec3};
use std::time::{Duration, Instant};

/// Decelerating curve, `t(2 - t)`.
pub fn ease_out(t: f32) -> f32 {
    t * (2.0 - t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionGoal {
    Focus(ResolvedSurface),
    Return,
}

/// Interpolation from `start` to `target`, sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub start: Pose,
    pub target: Pose,
    pub started_at: Instant,
    pub duration: Duration,
    pub goal: TransitionGoal,
}

impl Transition {
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Pose at `now` and whether the transition has finished. The finished
    /// pose is exactly `target`.
    pub fn sample(&self, now: Instant) -> (Pose, bool) {
        let t = self.progress(now);
        if t >= 1.0 {
            return (self.target, true);
        }
        let f = ease_out(t);
        let pose = Pose {
            position: self.start.position.lerp(self.target.position, f),
            orientation: self.start.orientation.slerp(self.target.orientation, f),
        };
        (pose, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusState {
    Free,
    Transitioning(Transition),
    Focused(ResolvedSurface),
}

impl FocusState {
    pub fn is_free(&self) -> bool {
        matches!(self, FocusState::Free)
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self, FocusState::Transitioning(_))
    }

    pub fn focused(&self) -> Option<ResolvedSurface> {
        match self {
            FocusState::Focused(surface) => Some(*surface),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A transition is running.
    Ignored,
    Focusing(ResolvedSurface),
    Returning,
    /// Nothing to do for this click in the current state.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Arrived(ResolvedSurface),
    Returned,
}

pub struct FocusController {
    state: FocusState,
    snapshot: Option<Pose>,
    duration: Duration,
    multipliers: FocusConfig,
}

impl FocusController {
    pub fn new(transition: &TransitionConfig, focus: &FocusConfig) -> Self {
        Self {
            state: FocusState::Free,
            snapshot: None,
            duration: transition.duration(),
            multipliers: focus.clone(),
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }

    /// Free-roam pose captured when focus was first requested.
    pub fn snapshot(&self) -> Option<Pose> {
        self.snapshot
    }

    pub fn handle_click(
        &mut self,
        pose: &Pose,
        hit: Option<ResolvedSurface>,
        graph: &SceneGraph,
        roles: &SurfaceRoles,
        now: Instant,
    ) -> ClickOutcome {
        match (self.state, hit) {
            (FocusState::Transitioning(_), _) => {
                log::debug!("Click ignored while the camera is moving");
                ClickOutcome::Ignored
            }
            (FocusState::Free, None) => ClickOutcome::Unchanged,
            (FocusState::Free, Some(surface)) => self.focus(pose, surface, graph, roles, now),
            (FocusState::Focused(current), Some(surface)) if surface.surface != current.surface => {
                self.focus(pose, surface, graph, roles, now)
            }
            (FocusState::Focused(_), _) => {
                if self.return_to_snapshot(pose, now) {
                    ClickOutcome::Returning
                } else {
                    ClickOutcome::Unchanged
                }
            }
        }
    }

    /// Starts a transition towards `surface`. The free-roam snapshot is only
    /// taken when leaving `Free`.
    pub fn focus(
        &mut self,
        pose: &Pose,
        surface: ResolvedSurface,
        graph: &SceneGraph,
        roles: &SurfaceRoles,
        now: Instant,
    ) -> ClickOutcome {
        if self.state.is_transitioning() {
            return ClickOutcome::Ignored;
        }
        let Some(target) = self.target_pose(graph, roles, surface) else {
            log::warn!(
                "Surface '{}' has no geometry to focus on",
                graph.name(surface.surface)
            );
            return ClickOutcome::Unchanged;
        };
        // Switching between focused surfaces keeps the free-roam snapshot
        // instead of retaking it, so a return always lands back in free roam.
        if self.state.is_free() {
            self.snapshot = Some(*pose);
        }
        log::info!(
            "Focusing {:?} '{}'",
            surface.kind,
            graph.name(surface.surface)
        );
        self.start(pose, target, TransitionGoal::Focus(surface), now);
        ClickOutcome::Focusing(surface)
    }

    /// Heads back to the free-roam snapshot. Returns false when there is
    /// nothing to return to.
    pub fn return_to_snapshot(&mut self, pose: &Pose, now: Instant) -> bool {
        if self.state.is_transitioning() {
            return false;
        }
        let Some(snapshot) = self.snapshot else {
            return false;
        };
        log::info!("Returning to free roam");
        self.start(pose, snapshot, TransitionGoal::Return, now);
        true
    }

    fn start(&mut self, pose: &Pose, target: Pose, goal: TransitionGoal, now: Instant) {
        self.state = FocusState::Transitioning(Transition {
            start: *pose,
            target,
            started_at: now,
            duration: self.duration,
            goal,
        });
    }

    /// Advances a running transition and writes the sampled pose. Reports
    /// completion exactly once.
    pub fn tick(&mut self, pose: &mut Pose, now: Instant) -> Option<FocusEvent> {
        let FocusState::Transitioning(transition) = self.state else {
            return None;
        };
        let (sampled, finished) = transition.sample(now);
        *pose = sampled;
        if !finished {
            return None;
        }
        match transition.goal {
            TransitionGoal::Focus(surface) => {
                self.state = FocusState::Focused(surface);
                Some(FocusEvent::Arrived(surface))
            }
            TransitionGoal::Return => {
                self.state = FocusState::Free;
                self.snapshot = None;
                Some(FocusEvent::Returned)
            }
        }
    }

    pub fn target_pose(
        &self,
        graph: &SceneGraph,
        roles: &SurfaceRoles,
        surface: ResolvedSurface,
    ) -> Option<Pose> {
        match surface.kind {
            SurfaceKind::Monitor => monitor_target_pose(
                graph,
                surface.surface,
                self.multipliers.monitor_distance_multiplier,
            ),
            SurfaceKind::Clipboard => {
                let page = roles.clipboard.map(|group| group.page);
                clipboard_target_pose(
                    graph,
                    surface.surface,
                    page,
                    roles.clipboard_page_up,
                    &self.multipliers,
                )
            }
        }
    }
}

/// Normalized matrix column, or `None` when it has collapsed.
fn axis(world: &Mat4, index: usize) -> Option<Vec3> {
    let column = world.col(index).truncate();
    (column.length_squared() > 1e-12).then(|| column.normalize())
}

/// Straight-on view from in front of the screen at its center height.
pub fn monitor_target_pose(graph: &SceneGraph, surface: SurfaceId, distance_multiplier: f32) -> Option<Pose> {
    let aabb = graph.world_aabb(surface)?;
    let center = aabb.center();
    let world = graph.world_transform(surface);
    let forward = axis(&world, 2).unwrap_or(Vec3::Z);
    let distance = aabb.size().max_element() * distance_multiplier;

    let mut position = center + forward * distance;
    position.y = center.y;
    Some(Pose::look_at(position, center, Vec3::Y))
}

/// View from above the page, offset towards its bottom edge and rolled so
/// the page content reads upright.
pub fn clipboard_target_pose(
    graph: &SceneGraph,
    surface: SurfaceId,
    page: Option<SurfaceId>,
    cached_up: Option<Vec3>,
    multipliers: &FocusConfig,
) -> Option<Pose> {
    let aabb = graph.world_aabb(surface)?;
    let center = aabb.center();
    let size = aabb.size();
    let world = graph.world_transform(surface);
    let axes: Vec<Vec3> = (0..3).filter_map(|index| axis(&world, index)).collect();

    let mut normal = axes
        .iter()
        .copied()
        .max_by(|a, b| a.dot(Vec3::Y).abs().total_cmp(&b.dot(Vec3::Y).abs()))
        .unwrap_or(Vec3::Y);
    if normal.dot(Vec3::Y) < 0.0 {
        normal = -normal;
    }

    let page_mesh = page.unwrap_or(surface);
    let content_up = graph
        .mesh(page_mesh)
        .and_then(|mesh| mesh.content_up(&graph.world_transform(page_mesh)))
        .or(cached_up)
        .or_else(|| {
            axes.iter()
                .copied()
                .find(|candidate| candidate.dot(normal).abs() < 0.95)
        })
        .unwrap_or(Vec3::Z)
        .normalize_or_zero();
    let content_up = if content_up == Vec3::ZERO { Vec3::Z } else { content_up };

    let lateral = size.x.max(size.z) * multipliers.clipboard_lateral_offset_multiplier;
    let vertical = size.max_element() * multipliers.clipboard_vertical_offset_multiplier;
    let position = center + normal * vertical - content_up * lateral;

    let orientation = look_rotation(position, center, content_up);
    Some(Pose::new(position, upright(orientation, position, center, content_up)))
}

/// Rolls `orientation` half a turn about the view direction when
/// `content_up` would point down the screen. Only the degenerate up-hint
/// nudge in [`look_rotation`] produces such an orientation.
fn upright(orientation: Quat, position: Vec3, center: Vec3, content_up: Vec3) -> Quat {
    let up_in_camera = orientation.inverse() * content_up;
    if up_in_camera.y >= 0.0 {
        return orientation;
    }
    let forward = (center - position).normalize_or_zero();
    (Quat::from_axis_angle(forward, std::f32::consts::PI) * orientation).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::resolve::ClipboardGroup;
    use crate::scene::{compose_transform_matrix, Mesh, NodeMarkers};

    struct Desk {
        graph: SceneGraph,
        roles: SurfaceRoles,
        monitor: ResolvedSurface,
        other: ResolvedSurface,
        clipboard: ResolvedSurface,
    }

    fn desk() -> Desk {
        let mut graph = SceneGraph::new();
        let marker = NodeMarkers {
            monitor: true,
            material_monitor: false,
        };
        let monitor = graph.add_node(
            "Monitor_0",
            None,
            Mat4::from_translation(Vec3::new(0.0, 4.0, -3.0)),
            Some(Mesh::quad(1.6, 0.9)),
            marker,
        );
        let other = graph.add_node(
            "Monitor_1",
            None,
            compose_transform_matrix(Vec3::new(3.0, 4.0, -3.0), Vec3::new(0.0, -30.0, 0.0), Vec3::ONE),
            Some(Mesh::quad(1.6, 0.9)),
            marker,
        );
        let body = graph.add_node(
            "Clipboard",
            None,
            compose_transform_matrix(Vec3::new(2.0, 1.8, 0.0), Vec3::new(-90.0, 0.0, 0.0), Vec3::ONE),
            Some(Mesh::quad(0.7, 1.0)),
            NodeMarkers::default(),
        );
        let page = graph.add_node(
            "page_page_0",
            Some(body),
            Mat4::from_translation(Vec3::new(0.0, 0.0, 0.005)),
            Some(Mesh::quad(0.6, 0.8)),
            NodeMarkers::default(),
        );
        let roles = SurfaceRoles {
            monitors: vec![monitor, other],
            highlight_targets: vec![monitor, other, page],
            clipboard: Some(ClipboardGroup {
                page,
                interactive: body,
            }),
            clipboard_page_up: None,
            media_monitor: None,
        };
        Desk {
            graph,
            roles,
            monitor: ResolvedSurface {
                surface: monitor,
                kind: SurfaceKind::Monitor,
            },
            other: ResolvedSurface {
                surface: other,
                kind: SurfaceKind::Monitor,
            },
            clipboard: ResolvedSurface {
                surface: body,
                kind: SurfaceKind::Clipboard,
            },
        }
    }

    fn controller() -> FocusController {
        FocusController::new(&TransitionConfig::default(), &FocusConfig::default())
    }

    fn start_pose() -> Pose {
        Pose::new(Vec3::new(1.0, 5.5, 6.0), Quat::from_rotation_y(0.2))
    }

    const SECOND: Duration = Duration::from_millis(1000);

    #[test]
    fn easing_hits_endpoints_and_decelerates() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(0.5), 0.75);
    }

    #[test]
    fn transition_reports_finish_with_exact_target() {
        let now = Instant::now();
        let transition = Transition {
            start: start_pose(),
            target: Pose::new(Vec3::ZERO, Quat::IDENTITY),
            started_at: now,
            duration: SECOND,
            goal: TransitionGoal::Return,
        };
        let (mid, done) = transition.sample(now + SECOND / 2);
        assert!(!done);
        let expected = start_pose().position.lerp(Vec3::ZERO, 0.75);
        assert!(mid.position.abs_diff_eq(expected, 1e-5));
        let (end, done) = transition.sample(now + SECOND * 3);
        assert!(done);
        assert_eq!(end, transition.target);
    }

    #[test]
    fn monitor_pose_faces_screen_from_its_front() {
        let d = desk();
        let pose = monitor_target_pose(&d.graph, d.monitor.surface, 1.5).unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 4.0, -3.0 + 1.6 * 1.5), 1e-4));
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_Z, 1e-4));
        assert!(pose.roll().abs() < 1e-4);
    }

    #[test]
    fn clipboard_pose_looks_down_with_content_upright() {
        let d = desk();
        let pose = controller()
            .target_pose(&d.graph, &d.roles, d.clipboard)
            .unwrap();
        let center = d.graph.world_aabb(d.clipboard.surface).unwrap().center();
        assert!(pose.position.y > center.y + 1.0);
        // Page content-up is world -Z, so the camera sits on the +Z side.
        assert!(pose.position.z > center.z);
        let to_center = (center - pose.position).normalize();
        assert!(pose.forward().abs_diff_eq(to_center, 1e-4));
        assert!((pose.orientation.inverse() * Vec3::NEG_Z).y > 0.0);
    }

    #[test]
    fn upside_down_view_is_rolled_upright() {
        let position = Vec3::new(0.0, 3.0, 0.5);
        let center = Vec3::ZERO;
        let content_up = Vec3::NEG_Z;
        let flipped = look_rotation(position, center, -content_up);
        assert!((flipped.inverse() * content_up).y < 0.0);

        let fixed = upright(flipped, position, center, content_up);
        assert!((fixed.inverse() * content_up).y > 0.0);
        let forward = (center - position).normalize();
        assert!((fixed * Vec3::NEG_Z).abs_diff_eq(forward, 1e-5));

        let already = look_rotation(position, center, content_up);
        assert_eq!(upright(already, position, center, content_up), already);
    }

    #[test]
    fn clipboard_without_page_uvs_uses_fallbacks() {
        let mut d = desk();
        let page = d.roles.clipboard.unwrap().page;
        if let Some(node) = d.graph.node_mut(page) {
            node.mesh = Some(Mesh {
                uvs: None,
                ..Mesh::quad(0.6, 0.8)
            });
        }
        d.roles.clipboard_page_up = Some(Vec3::X);
        let cached = controller().target_pose(&d.graph, &d.roles, d.clipboard).unwrap();
        assert!((cached.orientation.inverse() * Vec3::X).y > 0.0);

        d.roles.clipboard_page_up = None;
        let fallback = controller().target_pose(&d.graph, &d.roles, d.clipboard).unwrap();
        assert!(fallback.orientation.is_finite());
        assert!(fallback.position.is_finite());
    }

    #[test]
    fn focus_then_return_restores_snapshot() {
        let d = desk();
        let mut focus = controller();
        let mut pose = start_pose();
        let t0 = Instant::now();

        let outcome = focus.handle_click(&pose, Some(d.monitor), &d.graph, &d.roles, t0);
        assert_eq!(outcome, ClickOutcome::Focusing(d.monitor));
        assert!(focus.state().is_transitioning());
        assert_eq!(focus.tick(&mut pose, t0 + SECOND / 2), None);
        assert_eq!(focus.tick(&mut pose, t0 + SECOND), Some(FocusEvent::Arrived(d.monitor)));
        assert_eq!(focus.state().focused(), Some(d.monitor));
        assert_eq!(focus.tick(&mut pose, t0 + SECOND * 2), None);

        let t1 = t0 + SECOND * 2;
        let outcome = focus.handle_click(&pose, None, &d.graph, &d.roles, t1);
        assert_eq!(outcome, ClickOutcome::Returning);
        assert_eq!(focus.tick(&mut pose, t1 + SECOND), Some(FocusEvent::Returned));
        assert!(focus.is_free());
        assert!(pose.approx_eq(&start_pose(), 1e-5));
        assert!(focus.snapshot().is_none());
    }

    #[test]
    fn clicks_during_transition_are_ignored() {
        let d = desk();
        let mut focus = controller();
        let pose = start_pose();
        let t0 = Instant::now();
        focus.handle_click(&pose, Some(d.monitor), &d.graph, &d.roles, t0);
        let before = focus.state();
        for hit in [None, Some(d.other), Some(d.monitor)] {
            let outcome = focus.handle_click(&pose, hit, &d.graph, &d.roles, t0 + SECOND / 4);
            assert_eq!(outcome, ClickOutcome::Ignored);
        }
        assert_eq!(focus.state(), before);
    }

    #[test]
    fn switching_surfaces_keeps_the_free_roam_snapshot() {
        let d = desk();
        let mut focus = controller();
        let mut pose = start_pose();
        let t0 = Instant::now();
        focus.handle_click(&pose, Some(d.monitor), &d.graph, &d.roles, t0);
        focus.tick(&mut pose, t0 + SECOND);

        let t1 = t0 + SECOND * 2;
        let outcome = focus.handle_click(&pose, Some(d.clipboard), &d.graph, &d.roles, t1);
        assert_eq!(outcome, ClickOutcome::Focusing(d.clipboard));
        assert_eq!(focus.tick(&mut pose, t1 + SECOND), Some(FocusEvent::Arrived(d.clipboard)));

        let t2 = t1 + SECOND * 2;
        assert_eq!(
            focus.handle_click(&pose, Some(d.clipboard), &d.graph, &d.roles, t2),
            ClickOutcome::Returning
        );
        focus.tick(&mut pose, t2 + SECOND);
        assert!(pose.approx_eq(&start_pose(), 1e-5));
    }

    #[test]
    fn empty_click_while_free_does_nothing() {
        let d = desk();
        let mut focus = controller();
        let outcome = focus.handle_click(&start_pose(), None, &d.graph, &d.roles, Instant::now());
        assert_eq!(outcome, ClickOutcome::Unchanged);
        assert!(focus.is_free());
        assert!(focus.snapshot().is_none());
    }
}
