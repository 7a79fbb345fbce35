use crate::scene::{SceneGraph, SurfaceId};
use glam::{Mat4, Vec3};
use std::collections::HashMap;

pub const OUTLINE_SCALE: f32 = 1.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineId(pub u64);

/// Edge outline drawn around a hovered surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub id: OutlineId,
    pub surface: SurfaceId,
    /// Attached next to the surface, under the same parent.
    pub parent: Option<SurfaceId>,
    /// The surface's local transform, scaled up by [`OUTLINE_SCALE`].
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HighlightEvent {
    Added(Outline),
    /// The renderer must free the outline's geometry and material.
    Removed {
        surface: SurfaceId,
        outline: OutlineId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    #[default]
    Default,
    Pointer,
}

/// Tracks the hovered surface and owns the outline side-table.
#[derive(Debug, Default)]
pub struct HoverHighlighter {
    outlines: HashMap<SurfaceId, Outline>,
    hovered: Option<SurfaceId>,
    cursor: CursorIcon,
    next_id: u64,
}

impl HoverHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<SurfaceId> {
        self.hovered
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn live_outlines(&self) -> usize {
        self.outlines.len()
    }

    pub fn outline(&self, surface: SurfaceId) -> Option<&Outline> {
        self.outlines.get(&surface)
    }

    /// `target` is the already resolved surface under the pointer.
    pub fn on_pointer_move(
        &mut self,
        graph: &SceneGraph,
        target: Option<SurfaceId>,
        free: bool,
    ) -> Vec<HighlightEvent> {
        if !free {
            return Vec::new();
        }
        let Some(target) = target else {
            return self.clear();
        };
        if self.hovered == Some(target) {
            return Vec::new();
        }
        let mut events = Vec::new();
        if let Some(previous) = self.hovered.take() {
            events.extend(self.remove_highlight(previous));
        }
        events.extend(self.add_highlight(graph, target));
        self.hovered = Some(target);
        self.cursor = CursorIcon::Pointer;
        log::debug!("Hovering {}", graph.name(target));
        events
    }

    /// Drops the hover outline and resets the cursor.
    pub fn clear(&mut self) -> Vec<HighlightEvent> {
        self.cursor = CursorIcon::Default;
        match self.hovered.take() {
            Some(surface) => self.remove_highlight(surface).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn add_highlight(&mut self, graph: &SceneGraph, surface: SurfaceId) -> Option<HighlightEvent> {
        if self.outlines.contains_key(&surface) {
            return None;
        }
        let node = graph.node(surface)?;
        let (scale, rotation, translation) = node.transform.to_scale_rotation_translation();
        let outline = Outline {
            id: OutlineId(self.next_id),
            surface,
            parent: node.parent,
            transform: Mat4::from_scale_rotation_translation(
                scale * Vec3::splat(OUTLINE_SCALE),
                rotation,
                translation,
            ),
        };
        self.next_id += 1;
        self.outlines.insert(surface, outline.clone());
        Some(HighlightEvent::Added(outline))
    }

    /// No-op when the surface has no outline.
    pub fn remove_highlight(&mut self, surface: SurfaceId) -> Option<HighlightEvent> {
        self.outlines
            .remove(&surface)
            .map(|outline| HighlightEvent::Removed {
                surface,
                outline: outline.id,
            })
    }

    /// Releases every outline, used on teardown.
    pub fn release_all(&mut self) -> Vec<HighlightEvent> {
        self.hovered = None;
        self.cursor = CursorIcon::Default;
        let mut released: Vec<_> = self
            .outlines
            .drain()
            .map(|(surface, outline)| HighlightEvent::Removed {
                surface,
                outline: outline.id,
            })
            .collect();
        released.sort_by_key(|event| match event {
            HighlightEvent::Removed { outline, .. } => outline.0,
            HighlightEvent::Added(outline) => outline.id.0,
        });
        released
    }
}
