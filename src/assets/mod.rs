//! Scene loading, surface discovery and monitor content.
//!
//! Discovery is a single pass over a freshly loaded graph. It classifies
//! monitors by marker, collects the named highlight targets and locates the
//! clipboard page with the body that owns it. Content assignment then maps
//! the configured monitor list onto the discovered monitors.

use crate::config::{DiscoveryConfig, ExplorerConfig, MonitorContent, MonitorContentKind};
use crate::render::{SceneRenderer, TextureSource};
use crate::scene::resolve::{ClipboardGroup, SurfaceRoles};
use crate::scene::serialization::{self, SerializationError};
use crate::scene::{demo, SceneBounds, SceneGraph, SurfaceId};
use crate::ui::draw::{render_text_texture, TextStyle};
use crate::ui::MediaPlayerOverlay;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load scene {path}: {source}")]
    Scene {
        path: String,
        #[source]
        source: SerializationError,
    },
}

/// Result of the discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredScene {
    pub roles: SurfaceRoles,
    pub bounds: Option<SceneBounds>,
}

/// A configured content entry matched to its monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorAssignment {
    pub surface: SurfaceId,
    pub content: MonitorContent,
}

/// Loads a scene description, or the built-in desk when no path is given.
pub fn load_scene(path: Option<&Path>) -> Result<SceneGraph, AssetError> {
    let (label, description) = match path {
        Some(path) => {
            let description =
                serialization::load_scene_from_file(path).map_err(|source| AssetError::Scene {
                    path: path.display().to_string(),
                    source,
                })?;
            (path.display().to_string(), description)
        }
        None => ("built-in desk".to_string(), demo::desk_scene()),
    };
    let graph = description.build().map_err(|source| AssetError::Scene {
        path: label.clone(),
        source,
    })?;
    log::info!("Loaded scene {} ({} nodes)", label, graph.len());
    Ok(graph)
}

pub fn discover(graph: &SceneGraph, config: &DiscoveryConfig) -> DiscoveredScene {
    let mut roles = SurfaceRoles::default();
    let wanted: HashSet<&str> = config.highlight_names.iter().map(String::as_str).collect();
    let mut found = HashSet::new();
    let hints: Vec<String> = config
        .clipboard_name_hints
        .iter()
        .map(|hint| hint.to_lowercase())
        .collect();

    for id in graph.traverse() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        if node.mesh.is_none() {
            continue;
        }
        if node.markers.is_monitor() {
            roles.monitors.push(id);
            push_unique(&mut roles.highlight_targets, id);
        }
        if wanted.contains(node.name.as_str()) {
            push_unique(&mut roles.highlight_targets, id);
            found.insert(node.name.as_str());
        }
        if node.name == config.clipboard_page_name {
            if roles.clipboard.is_some() {
                log::debug!("Ignoring extra clipboard page {}", id.0);
                continue;
            }
            let interactive = clipboard_body(graph, id, &hints);
            roles.clipboard_page_up = node
                .mesh
                .as_ref()
                .and_then(|mesh| mesh.content_up(&graph.world_transform(id)));
            roles.clipboard = Some(ClipboardGroup {
                page: id,
                interactive,
            });
            push_unique(&mut roles.highlight_targets, id);
        }
    }

    for name in &config.highlight_names {
        if !found.contains(name.as_str()) {
            log::warn!("Highlight target not found: {}", name);
        }
    }
    match roles.clipboard {
        Some(group) => log::info!(
            "Clipboard page '{}' owned by '{}'",
            graph.name(group.page),
            graph.name(group.interactive)
        ),
        None => log::warn!(
            "Clipboard page '{}' not found; clipboard focus disabled",
            config.clipboard_page_name
        ),
    }

    let bounds = graph.bounds();
    log::info!(
        "Discovered {} monitors and {} highlight targets",
        roles.monitors.len(),
        roles.highlight_targets.len()
    );
    DiscoveredScene { roles, bounds }
}

/// First mesh ancestor whose name contains a hint, else the outermost mesh
/// ancestor, else the page itself.
fn clipboard_body(graph: &SceneGraph, page: SurfaceId, hints: &[String]) -> SurfaceId {
    let mesh_ancestors: Vec<SurfaceId> = graph
        .ancestors(page)
        .filter(|id| graph.has_mesh(*id))
        .collect();
    let named = mesh_ancestors.iter().copied().find(|id| {
        let name = graph.name(*id).to_lowercase();
        hints.iter().any(|hint| name.contains(hint.as_str()))
    });
    named
        .or_else(|| mesh_ancestors.last().copied())
        .unwrap_or(page)
}

fn push_unique(list: &mut Vec<SurfaceId>, id: SurfaceId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Matches configured content to monitors by discovery order and records
/// the music monitor in `roles`.
pub fn plan_content(roles: &mut SurfaceRoles, monitors: &[MonitorContent]) -> Vec<MonitorAssignment> {
    let mut assignments = Vec::new();
    for content in monitors {
        let Some(surface) = roles.monitors.get(content.index).copied() else {
            log::warn!(
                "Monitor {} not found for {:?} content; skipping",
                content.index,
                content.kind
            );
            continue;
        };
        if content.kind == MonitorContentKind::Music {
            roles.media_monitor = Some(surface);
        }
        assignments.push(MonitorAssignment {
            surface,
            content: content.clone(),
        });
    }
    assignments
}

/// Sends a texture to the renderer, first stretching the surface's UVs to
/// the full texture when they only map part of it.
pub fn apply_surface_texture(
    renderer: &mut dyn SceneRenderer,
    graph: &mut SceneGraph,
    surface: SurfaceId,
    source: &TextureSource,
    emissive: f32,
) {
    if let Some(mesh) = graph.node_mut(surface).and_then(|node| node.mesh.as_mut()) {
        if mesh.normalize_uvs() {
            log::debug!("Normalized UVs of surface {}", surface.0);
        }
    }
    renderer.apply_texture(surface, source, emissive, source.tone_mapped());
}

/// Applies every monitor assignment plus the clipboard notes.
pub fn apply_content(
    renderer: &mut dyn SceneRenderer,
    graph: &mut SceneGraph,
    roles: &SurfaceRoles,
    assignments: &[MonitorAssignment],
    overlay: Option<&MediaPlayerOverlay>,
    config: &ExplorerConfig,
) {
    let texture = &config.texture;
    for assignment in assignments {
        let path = PathBuf::from(&assignment.content.path);
        let (source, emissive) = match assignment.content.kind {
            MonitorContentKind::Video => (TextureSource::Video { path }, texture.video_emissive),
            MonitorContentKind::Image => (TextureSource::Image { path }, texture.default_emissive),
            MonitorContentKind::Music => match overlay {
                Some(overlay) => (overlay.texture(), texture.text_emissive),
                None => {
                    log::warn!("No media overlay for monitor {}", assignment.content.index);
                    continue;
                }
            },
        };
        apply_surface_texture(renderer, graph, assignment.surface, &source, emissive);
    }

    if let Some(group) = roles.clipboard {
        let notes = render_text_texture(
            &config.clipboard_notes,
            texture.canvas_size,
            &TextStyle::paper(),
        );
        apply_surface_texture(
            renderer,
            graph,
            group.page,
            &TextureSource::Generated(notes),
            texture.notes_emissive,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LogRenderer;
    use crate::scene::{Mesh, NodeMarkers};
    use glam::Mat4;

    fn demo() -> (SceneGraph, DiscoveredScene) {
        let graph = load_scene(None).unwrap();
        let discovered = discover(&graph, &DiscoveryConfig::default());
        (graph, discovered)
    }

    #[test]
    fn discovers_demo_roles() {
        let (graph, discovered) = demo();
        let roles = &discovered.roles;
        assert_eq!(roles.monitors.len(), 9);
        for (index, id) in roles.monitors.iter().enumerate() {
            assert_eq!(graph.name(*id), format!("Monitor_{}", index));
        }
        let group = roles.clipboard.unwrap();
        assert_eq!(graph.name(group.page), "page_page_0");
        assert_eq!(graph.name(group.interactive), "Clipboard");
        let button = graph.find_by_name("Button").unwrap();
        assert!(roles.highlight_targets.contains(&button));
        assert!(roles.highlight_targets.contains(&group.page));
        assert!(discovered.bounds.is_some());

        let up = roles.clipboard_page_up.unwrap();
        assert!(up.y.abs() < 1e-4);
        assert!(up.z < -0.9);
    }

    #[test]
    fn clipboard_body_falls_back_to_outermost_mesh() {
        let mut graph = SceneGraph::new();
        let quad = || Some(Mesh::quad(1.0, 1.0));
        let outer = graph.add_node("Desk", None, Mat4::IDENTITY, quad(), NodeMarkers::default());
        let group = graph.add_node("Group", Some(outer), Mat4::IDENTITY, None, NodeMarkers::default());
        let inner = graph.add_node("Panel", Some(group), Mat4::IDENTITY, quad(), NodeMarkers::default());
        let page = graph.add_node("page_page_0", Some(inner), Mat4::IDENTITY, quad(), NodeMarkers::default());
        let roles = discover(&graph, &DiscoveryConfig::default()).roles;
        assert_eq!(
            roles.clipboard,
            Some(ClipboardGroup {
                page,
                interactive: outer
            })
        );

        let mut lone = SceneGraph::new();
        let page = lone.add_node("page_page_0", None, Mat4::IDENTITY, quad(), NodeMarkers::default());
        let roles = discover(&lone, &DiscoveryConfig::default()).roles;
        assert_eq!(roles.clipboard.map(|g| g.interactive), Some(page));
    }

    #[test]
    fn missing_names_and_pages_are_not_fatal() {
        let mut graph = SceneGraph::new();
        graph.add_node("Floor", None, Mat4::IDENTITY, Some(Mesh::quad(4.0, 4.0)), NodeMarkers::default());
        let discovered = discover(&graph, &DiscoveryConfig::default());
        assert!(discovered.roles.monitors.is_empty());
        assert!(discovered.roles.clipboard.is_none());
        assert!(discovered.roles.highlight_targets.is_empty());

        let empty = discover(&SceneGraph::new(), &DiscoveryConfig::default());
        assert!(empty.bounds.is_none());
    }

    #[test]
    fn plan_skips_missing_monitors_and_marks_music() {
        let (_, mut discovered) = demo();
        let mut monitors = ExplorerConfig::default().monitors;
        monitors.push(MonitorContent {
            index: 42,
            kind: MonitorContentKind::Video,
            path: "missing.mp4".to_string(),
        });
        let plan = plan_content(&mut discovered.roles, &monitors);
        assert_eq!(plan.len(), 9);
        assert_eq!(discovered.roles.media_monitor, Some(discovered.roles.monitors[6]));
    }

    #[test]
    fn content_uses_tone_mapping_policy_and_normalizes_uvs() {
        let (mut graph, mut discovered) = demo();
        let config = ExplorerConfig::default();
        let plan = plan_content(&mut discovered.roles, &config.monitors);
        let overlay = MediaPlayerOverlay::new(config.playlist.clone(), 256).unwrap();
        let mut renderer = LogRenderer::new();
        apply_content(
            &mut renderer,
            &mut graph,
            &discovered.roles,
            &plan,
            Some(&overlay),
            &config,
        );

        let monitors = &discovered.roles.monitors;
        let (_, emissive, tone_mapped) = renderer.texture(monitors[0]).unwrap();
        assert_eq!((*emissive, *tone_mapped), (1.0, true));
        let (_, emissive, tone_mapped) = renderer.texture(monitors[2]).unwrap();
        assert_eq!((*emissive, *tone_mapped), (1.5, false));
        let (description, emissive, tone_mapped) = renderer.texture(monitors[6]).unwrap();
        assert!(description.starts_with("generated"));
        assert_eq!((*emissive, *tone_mapped), (1.8, false));

        let page = discovered.roles.clipboard.unwrap().page;
        let (_, emissive, _) = renderer.texture(page).unwrap();
        assert_eq!(*emissive, 0.0);

        let uvs = graph.mesh(monitors[0]).unwrap().uvs.as_ref().unwrap();
        let max_u = uvs.iter().map(|uv| uv.x).fold(f32::MIN, f32::max);
        assert!((max_u - 1.0).abs() < 1e-5);
    }
}
