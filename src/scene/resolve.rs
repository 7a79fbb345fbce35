use crate::scene::{SceneGraph, SurfaceId};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Monitor,
    Clipboard,
}

/// A click resolved to the logical surface it should focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSurface {
    pub surface: SurfaceId,
    pub kind: SurfaceKind,
}

/// The readable page and the body that owns it. Both are click targets;
/// the page is what gets outlined and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardGroup {
    pub page: SurfaceId,
    pub interactive: SurfaceId,
}

impl ClipboardGroup {
    pub fn members(&self) -> Vec<SurfaceId> {
        if self.page == self.interactive {
            vec![self.page]
        } else {
            vec![self.page, self.interactive]
        }
    }
}

/// Surface roles found by the one-time discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceRoles {
    pub monitors: Vec<SurfaceId>,
    pub highlight_targets: Vec<SurfaceId>,
    pub clipboard: Option<ClipboardGroup>,
    /// Content-up of the page measured at discovery time.
    pub clipboard_page_up: Option<Vec3>,
    /// Monitor carrying the media-player overlay.
    pub media_monitor: Option<SurfaceId>,
}

impl SurfaceRoles {
    /// Everything a click may land on: monitors plus the clipboard group.
    pub fn click_candidates(&self) -> Vec<SurfaceId> {
        let mut out = self.monitors.clone();
        if let Some(group) = &self.clipboard {
            out.extend(group.members());
        }
        out
    }
}

pub struct SurfaceResolver<'a> {
    graph: &'a SceneGraph,
    roles: &'a SurfaceRoles,
}

impl<'a> SurfaceResolver<'a> {
    pub fn new(graph: &'a SceneGraph, roles: &'a SurfaceRoles) -> Self {
        Self { graph, roles }
    }

    /// First of `hit` and its ancestors that is a mesh listed in `candidates`.
    pub fn find_ancestor(
        graph: &SceneGraph,
        hit: SurfaceId,
        candidates: &[SurfaceId],
    ) -> Option<SurfaceId> {
        graph
            .self_and_ancestors(hit)
            .find(|id| graph.has_mesh(*id) && candidates.contains(id))
    }

    fn clipboard_member(&self, hit: SurfaceId) -> Option<ClipboardGroup> {
        let group = self.roles.clipboard?;
        Self::find_ancestor(self.graph, hit, &group.members()).map(|_| group)
    }

    /// Surface to outline for a hover hit. Anything that is neither a
    /// monitor nor part of the clipboard is outlined as hit.
    pub fn resolve_highlight(&self, hit: SurfaceId) -> SurfaceId {
        if let Some(monitor) = Self::find_ancestor(self.graph, hit, &self.roles.monitors) {
            return monitor;
        }
        if let Some(group) = self.clipboard_member(hit) {
            return group.page;
        }
        hit
    }

    /// Surface to focus for a click hit, `None` for non-interactive hits.
    pub fn resolve_click(&self, hit: SurfaceId) -> Option<ResolvedSurface> {
        if let Some(monitor) = Self::find_ancestor(self.graph, hit, &self.roles.monitors) {
            return Some(ResolvedSurface {
                surface: monitor,
                kind: SurfaceKind::Monitor,
            });
        }
        self.clipboard_member(hit).map(|group| ResolvedSurface {
            surface: group.interactive,
            kind: SurfaceKind::Clipboard,
        })
    }
}
