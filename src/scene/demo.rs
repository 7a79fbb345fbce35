//! Built-in desk used when no scene file is given.
//!
//! A walled room with nine monitors in a 3x3 wall, a desk, a clipboard
//! with its page, and a button. Names and markers match what
//! `assets::discover` looks for with the default config.

use crate::scene::serialization::{SceneDescription, TransformData};
use crate::scene::{Mesh, NodeMarkers};
use glam::Vec2;

pub const MONITOR_COUNT: usize = 9;

fn at(position: [f32; 3], rotation_deg: [f32; 3]) -> TransformData {
    TransformData {
        position,
        rotation_deg,
        scale: [1.0, 1.0, 1.0],
    }
}

/// Lying flat: local +Z becomes world +Y and local +Y becomes world -Z.
const FLAT: [f32; 3] = [-90.0, 0.0, 0.0];

/// Screen quad whose UVs only cover the middle of the texture, the way
/// exported monitor screens usually map a sub-rectangle.
fn screen_mesh(width: f32, height: f32) -> Mesh {
    let mut mesh = Mesh::quad(width, height);
    if let Some(uvs) = mesh.uvs.as_mut() {
        for uv in uvs.iter_mut() {
            *uv = *uv * 0.9 + Vec2::splat(0.05);
        }
    }
    mesh
}

pub fn desk_scene() -> SceneDescription {
    let mut scene = SceneDescription::new();
    let none = NodeMarkers::default;
    let monitor_marker = |material: bool| NodeMarkers {
        monitor: !material,
        material_monitor: material,
    };

    let room = scene.push("Room", None, TransformData::default(), None, none());
    scene.push(
        "Floor",
        Some(room),
        at([0.0, 0.0, 0.0], FLAT),
        Some(Mesh::quad(20.0, 20.0)),
        none(),
    );
    scene.push(
        "BackWall",
        Some(room),
        at([0.0, 4.0, -4.0], [0.0, 0.0, 0.0]),
        Some(Mesh::quad(20.0, 8.0)),
        none(),
    );

    let rack = scene.push(
        "MonitorWall",
        Some(room),
        at([0.0, 0.0, -3.0], [0.0, 0.0, 0.0]),
        None,
        none(),
    );
    for index in 0..MONITOR_COUNT {
        let column = (index % 3) as f32 - 1.0;
        let row = (index / 3) as f32;
        // Odd monitors carry the marker on their material.
        let monitor = scene.push(
            &format!("Monitor_{}", index),
            Some(rack),
            at([column * 2.0, 4.7 - row * 1.1, 0.0], [0.0, column * -10.0, 0.0]),
            Some(screen_mesh(1.6, 0.9)),
            monitor_marker(index % 2 == 1),
        );
        scene.push(
            &format!("Monitor_{}_Bezel", index),
            Some(monitor),
            at([0.0, -0.5, -0.02], [0.0, 0.0, 0.0]),
            Some(Mesh::quad(1.7, 0.1)),
            none(),
        );
    }

    scene.push(
        "DeskTop",
        Some(room),
        at([0.0, 1.8, -1.0], FLAT),
        Some(Mesh::quad(6.0, 2.5)),
        none(),
    );
    let clipboard = scene.push(
        "Clipboard",
        Some(room),
        at([2.0, 1.81, -0.6], [-90.0, 15.0, 0.0]),
        Some(Mesh::quad(0.7, 1.0)),
        none(),
    );
    scene.push(
        "page_page_0",
        Some(clipboard),
        at([0.0, -0.05, 0.005], [0.0, 0.0, 0.0]),
        Some(Mesh::quad(0.6, 0.8)),
        none(),
    );
    scene.push(
        "Button",
        Some(room),
        at([-2.2, 1.82, -0.5], FLAT),
        Some(Mesh::quad(0.3, 0.3)),
        none(),
    );

    scene
}
