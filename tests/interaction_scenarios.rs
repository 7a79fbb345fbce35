use desk_explorer::app::{ClickOutcome, ControllerEvent, FocusState, InteractionController};
use desk_explorer::assets::load_scene;
use desk_explorer::config::ExplorerConfig;
use desk_explorer::render::{LogRenderer, NavigationInput, Ray, SpatialIndex};
use desk_explorer::scene::serialization::{SceneDescription, TransformData};
use desk_explorer::scene::{Mesh, NodeMarkers, SceneGraph, SurfaceId};
use desk_explorer::ui::{MediaPlayerOverlay, OverlayButton};
use glam::{Vec2, Vec3};
use std::time::{Duration, Instant};

const SECOND: Duration = Duration::from_millis(1000);

fn at(position: [f32; 3], rotation_deg: [f32; 3]) -> TransformData {
    TransformData {
        position,
        rotation_deg,
        scale: [1.0, 1.0, 1.0],
    }
}

/// Floor, ceiling and three monitors A, B, C side by side.
fn three_monitor_room() -> SceneGraph {
    let mut scene = SceneDescription::new();
    let monitor = NodeMarkers {
        monitor: true,
        material_monitor: false,
    };
    let room = scene.push("Room", None, TransformData::default(), None, NodeMarkers::default());
    scene.push(
        "Floor",
        Some(room),
        at([0.0, 0.0, 0.0], [-90.0, 0.0, 0.0]),
        Some(Mesh::quad(20.0, 20.0)),
        NodeMarkers::default(),
    );
    scene.push(
        "Ceiling",
        Some(room),
        at([0.0, 8.0, 0.0], [90.0, 0.0, 0.0]),
        Some(Mesh::quad(20.0, 20.0)),
        NodeMarkers::default(),
    );
    for (name, x) in [("A", -3.0), ("B", 0.0), ("C", 3.0)] {
        scene.push(
            name,
            Some(room),
            at([x, 5.5, -3.0], [0.0, 0.0, 0.0]),
            Some(Mesh::quad(1.6, 0.9)),
            monitor,
        );
    }
    scene.build().unwrap()
}

fn room_config() -> ExplorerConfig {
    let mut config = ExplorerConfig::default();
    config.monitors.clear();
    config.camera.initial_position = [0.5, 5.5, 6.0];
    config.camera.initial_orientation = [0.0, 0.0, 0.0, 1.0];
    config
}

fn ray_to(controller: &InteractionController, surface: SurfaceId) -> Ray {
    let target = controller.graph().world_aabb(surface).unwrap().center() + Vec3::new(0.017, 0.023, 0.0);
    let origin = controller.pose().position;
    Ray::new(origin, target - origin)
}

fn empty_space(controller: &InteractionController) -> Ray {
    Ray::new(controller.pose().position, Vec3::new(0.0, 1.0, 0.2))
}

/// Deterministic input sequence covering every key combination.
fn scripted_input(step: u32) -> NavigationInput {
    let bits = step.wrapping_mul(2_654_435_761) >> 7;
    let bit = |n: u32| bits & (1 << n) != 0;
    NavigationInput {
        move_forward: bit(0),
        move_backward: bit(1) && bit(2),
        move_left: bit(3),
        move_right: bit(4) && bit(5),
        aim_left: bit(6),
        aim_right: bit(7),
        aim_up: bit(8),
        aim_down: bit(9),
        roll_left: bit(10),
        roll_right: bit(11) && bit(12),
        look_delta: Vec2::new(
            ((bits % 17) as f32 - 8.0) * 0.01,
            ((bits % 13) as f32 - 6.0) * 0.01,
        ),
    }
}

#[test]
fn click_b_then_empty_space_returns_to_snapshot() {
    let graph = three_monitor_room();
    let mut controller = InteractionController::new(room_config(), graph, 16.0 / 9.0).unwrap();
    let mut renderer = LogRenderer::new();
    let idle = NavigationInput::default();
    let b = controller.graph().find_by_name("B").unwrap();
    let snapshot = *controller.pose();
    let t0 = Instant::now();

    let outcome = controller.on_click_ray(&ray_to(&controller, b), t0);
    assert!(matches!(outcome, ClickOutcome::Focusing(s) if s.surface == b));
    assert!(controller.focus_state().is_transitioning());

    controller.tick(t0 + SECOND / 2, 0.016, &idle, &mut renderer);
    assert!(controller.focus_state().is_transitioning());
    controller.tick(t0 + SECOND, 0.016, &idle, &mut renderer);
    assert_eq!(controller.focus_state().focused().map(|s| s.surface), Some(b));
    // Straight in front of B, looking at it.
    assert!(controller.pose().position.abs_diff_eq(Vec3::new(0.0, 5.5, -3.0 + 1.6 * 1.5), 1e-3));

    let t1 = t0 + SECOND * 2;
    assert_eq!(
        controller.on_click_ray(&empty_space(&controller), t1),
        ClickOutcome::Returning
    );
    controller.tick(t1 + SECOND / 3, 0.016, &idle, &mut renderer);
    assert!(controller.focus_state().is_transitioning());
    controller.tick(t1 + SECOND, 0.016, &idle, &mut renderer);
    assert_eq!(controller.focus_state(), FocusState::Free);
    assert!(controller.pose().approx_eq(&snapshot, 1e-4));

    let events = controller.drain_events();
    assert_eq!(events.first(), Some(&ControllerEvent::FreeRoam(false)));
    assert_eq!(events.last(), Some(&ControllerEvent::FreeRoam(true)));
}

#[test]
fn focus_round_trip_restores_pose_for_every_surface() {
    let graph = load_scene(None).unwrap();
    let mut config = ExplorerConfig::default();
    config.camera.initial_position = [0.0, 5.5, 7.0];
    config.camera.initial_orientation = [-0.2, 0.0, 0.0, 0.98];
    let mut controller = InteractionController::new(config, graph, 16.0 / 9.0).unwrap();
    let mut renderer = LogRenderer::new();
    let idle = NavigationInput::default();

    let mut surfaces = controller.roles().monitors.clone();
    surfaces.push(controller.roles().clipboard.unwrap().page);
    let mut now = Instant::now();
    for surface in surfaces {
        let snapshot = *controller.pose();
        let outcome = controller.on_click_ray(&ray_to(&controller, surface), now);
        assert!(matches!(outcome, ClickOutcome::Focusing(_)), "{:?}", outcome);
        now += SECOND;
        controller.tick(now, 0.016, &idle, &mut renderer);
        assert!(controller.focus_state().focused().is_some());

        // Clicking the focused surface again steps back.
        now += SECOND;
        let focused = controller.focus_state().focused().unwrap();
        let again = match controller.roles().media_monitor {
            Some(media) if media == focused.surface => empty_space(&controller),
            _ => ray_to(&controller, focused.surface),
        };
        assert_eq!(controller.on_click_ray(&again, now), ClickOutcome::Returning);
        now += SECOND;
        controller.tick(now, 0.016, &idle, &mut renderer);
        assert!(controller.focus_state().is_free());
        assert!(
            controller.pose().approx_eq(&snapshot, 1e-4),
            "{:?} vs {:?}",
            controller.pose(),
            snapshot
        );
        now += SECOND;
    }
}

#[test]
fn free_roam_keeps_height_roll_and_bounds() {
    let graph = three_monitor_room();
    let config = room_config();
    let max_roll = config.movement.max_roll;
    let padding = config.movement.bounds_padding;
    let mut controller = InteractionController::new(config, graph, 1.0).unwrap();
    let mut renderer = LogRenderer::new();
    let now = Instant::now();

    for step in 0..2_000 {
        let input = scripted_input(step);
        controller.tick(now, 0.05, &input, &mut renderer);
        let pose = controller.pose();
        assert!((pose.position.y - 5.5).abs() < 1e-4, "step {} height {}", step, pose.position.y);
        assert!(pose.roll().abs() <= max_roll + 1e-4, "step {} roll {}", step, pose.roll());
        for value in [pose.position.x, pose.position.z] {
            assert!(value >= -10.0 + padding - 1e-4 && value <= 10.0 - padding + 1e-4);
        }
    }
}

#[test]
fn hover_never_highlights_unless_free() {
    let graph = three_monitor_room();
    let mut controller = InteractionController::new(room_config(), graph, 1.0).unwrap();
    let mut renderer = LogRenderer::new();
    let idle = NavigationInput::default();
    let [a, b, c] = ["A", "B", "C"].map(|name| controller.graph().find_by_name(name).unwrap());
    let t0 = Instant::now();

    controller.on_pointer_ray(&ray_to(&controller, a));
    assert_eq!(controller.highlighter().hovered(), Some(a));
    controller.on_click_ray(&ray_to(&controller, b), t0);
    assert_eq!(controller.highlighter().live_outlines(), 0);

    for (i, surface) in [a, b, c].iter().cycle().take(12).enumerate() {
        let now = t0 + SECOND * i as u32 / 4;
        controller.on_pointer_ray(&ray_to(&controller, *surface));
        assert_eq!(controller.highlighter().hovered(), None);
        controller.tick(now, 0.016, &idle, &mut renderer);
        assert_eq!(renderer.live_outlines(), 0);
    }

    // Switching straight from B to C while focused.
    let focused = controller.focus_state().focused().unwrap();
    assert_eq!(focused.surface, b);
    let t1 = t0 + SECOND * 4;
    let outcome = controller.on_click_ray(&ray_to(&controller, c), t1);
    assert!(matches!(outcome, ClickOutcome::Focusing(s) if s.surface == c));
    assert_eq!(
        controller.on_click_ray(&ray_to(&controller, a), t1 + SECOND / 2),
        ClickOutcome::Ignored
    );
    controller.tick(t1 + SECOND, 0.016, &idle, &mut renderer);
    assert_eq!(controller.focus_state().focused().map(|s| s.surface), Some(c));
}

#[test]
fn empty_candidate_list_is_no_hit() {
    let graph = three_monitor_room();
    let ray = Ray::new(Vec3::new(0.0, 5.5, 5.0), Vec3::NEG_Z);
    assert!(SpatialIndex::new(&graph).intersect(&ray, &[]).is_empty());
    let b = graph.find_by_name("B").unwrap();
    let hits = SpatialIndex::new(&graph).intersect(&Ray::new(Vec3::new(0.1, 5.6, 5.0), Vec3::NEG_Z), &[b]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].surface, b);
}

fn press(overlay: &mut MediaPlayerOverlay, button: OverlayButton) {
    overlay.activate(button);
    let width = overlay.frame().width() as f32;
    let height = overlay.frame().height() as f32;
    for region in overlay.regions() {
        let (x, y) = region.rect.center();
        let uv = Vec2::new(x / width, 1.0 - y / height);
        assert_eq!(overlay.hit_test(uv), Some(region.button));
    }
}

#[test]
fn overlay_next_wraps_from_last_to_first() {
    let tracks: Vec<String> = (0..5).map(|i| format!("music/track{}.mp3", i)).collect();
    let mut overlay = MediaPlayerOverlay::new(tracks, 512).unwrap();
    for _ in 0..4 {
        press(&mut overlay, OverlayButton::Next);
    }
    assert_eq!(overlay.selected(), 4);
    press(&mut overlay, OverlayButton::Next);
    assert_eq!(overlay.selected(), 0);
    press(&mut overlay, OverlayButton::Previous);
    assert_eq!(overlay.selected(), 4);
    press(&mut overlay, OverlayButton::PlayPause);
    assert!(overlay.is_playing());
    press(&mut overlay, OverlayButton::PlayPause);
    assert!(!overlay.is_playing());
}

#[test]
fn zero_start_orientation_still_walks_inside_bounds() {
    let graph = three_monitor_room();
    let mut config = room_config();
    config.camera.initial_orientation = [0.0, 0.0, 0.0, 0.0];
    assert!(config.validate().is_err());
    let padding = config.movement.bounds_padding;

    let mut controller = InteractionController::new(config, graph, 1.0).unwrap();
    let mut renderer = LogRenderer::new();
    let forward = NavigationInput {
        move_forward: true,
        ..NavigationInput::default()
    };
    let now = Instant::now();
    for _ in 0..400 {
        controller.tick(now, 0.05, &forward, &mut renderer);
    }
    let pose = controller.pose();
    assert!(pose.position.is_finite() && pose.orientation.is_finite());
    assert!((pose.position.y - 5.5).abs() < 1e-4);
    assert!((pose.position.z - (-10.0 + padding)).abs() < 1e-3);
}
