pub mod demo;
pub mod resolve;
pub mod serialization;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Index of a node in a [`SceneGraph`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for point in iter {
            aabb.min = aabb.min.min(point);
            aabb.max = aabb.max.max(point);
        }
        Some(aabb)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Bounds of this box after an affine transform (all eight corners).
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        // Eight corners, never empty.
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

/// Scene-wide movement limits; the union of every mesh's world box.
pub type SceneBounds = Aabb;

/// Indexed triangle list in node-local space.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Quad in the local XY plane facing +Z, UV origin at the bottom-left.
    pub fn quad(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            uvs: Some(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ]),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    pub fn local_aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Stretches UVs to the full `[0, 1]` range when the mesh only maps a
    /// sub-rectangle of its texture. Returns true if the UVs changed.
    pub fn normalize_uvs(&mut self) -> bool {
        let Some(uvs) = self.uvs.as_mut() else {
            return false;
        };
        if uvs.is_empty() {
            return false;
        }
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for uv in uvs.iter() {
            min = min.min(*uv);
            max = max.max(*uv);
        }
        let range = max - min;
        let zoomed = |r: f32| r > 0.01 && r < 0.95;
        if !(zoomed(range.x) && zoomed(range.y)) {
            return false;
        }
        for uv in uvs.iter_mut() {
            *uv = (*uv - min) / range;
        }
        true
    }

    /// World direction in which the texture's `v` grows: from the centroid
    /// of the lowest-`v` vertices to the centroid of the highest-`v` ones.
    pub fn content_up(&self, world: &Mat4) -> Option<Vec3> {
        const EPSILON: f32 = 1e-4;
        let uvs = self.uvs.as_ref()?;
        let samples = || self.positions.iter().zip(uvs.iter());
        let max_v = samples().map(|(_, uv)| uv.y).reduce(f32::max)?;
        let min_v = samples().map(|(_, uv)| uv.y).reduce(f32::min)?;
        let centroid = |keep: &dyn Fn(f32) -> bool| {
            let (sum, count) = samples()
                .filter(|(_, uv)| keep(uv.y))
                .fold((Vec3::ZERO, 0u32), |(sum, count), (p, _)| (sum + *p, count + 1));
            (count > 0).then(|| sum / count as f32)
        };
        let top = centroid(&|v: f32| v >= max_v - EPSILON)?;
        let bottom = centroid(&|v: f32| v <= min_v + EPSILON)?;
        let direction = world.transform_point3(top) - world.transform_point3(bottom);
        if direction.length_squared() < 1e-6 {
            return None;
        }
        Some(direction.normalize())
    }
}

/// Classification flags authored on a node or on its material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NodeMarkers {
    pub monitor: bool,
    pub material_monitor: bool,
}

impl NodeMarkers {
    pub fn is_monitor(&self) -> bool {
        self.monitor || self.material_monitor
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<SurfaceId>,
    pub children: Vec<SurfaceId>,
    pub transform: Mat4,
    pub mesh: Option<Mesh>,
    pub markers: NodeMarkers,
}

/// Arena of scene nodes with index-based parent links.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a node. A parent that is not in the graph is treated as none.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<SurfaceId>,
        transform: Mat4,
        mesh: Option<Mesh>,
        markers: NodeMarkers,
    ) -> SurfaceId {
        let id = SurfaceId(self.nodes.len() as u32);
        let parent = parent.filter(|p| p.index() < self.nodes.len());
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(SceneNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            transform,
            mesh,
            markers,
        });
        id
    }

    pub fn node(&self, id: SurfaceId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: SurfaceId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> {
        (0..self.nodes.len() as u32).map(SurfaceId)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn name(&self, id: SurfaceId) -> &str {
        self.node(id).map(|node| node.name.as_str()).unwrap_or("")
    }

    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn mesh(&self, id: SurfaceId) -> Option<&Mesh> {
        self.node(id).and_then(|node| node.mesh.as_ref())
    }

    pub fn has_mesh(&self, id: SurfaceId) -> bool {
        self.mesh(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<SurfaceId> {
        self.ids().find(|id| self.name(*id) == name)
    }

    /// Parent chain of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: SurfaceId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
        }
    }

    /// `id` followed by its parent chain.
    pub fn self_and_ancestors(&self, id: SurfaceId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.node(id).map(|_| id),
        }
    }

    pub fn world_transform(&self, id: SurfaceId) -> Mat4 {
        self.self_and_ancestors(id)
            .filter_map(|node_id| self.node(node_id))
            .fold(Mat4::IDENTITY, |acc, node| node.transform * acc)
    }

    /// Every node, parents before children, roots in insertion order.
    pub fn traverse(&self) -> Vec<SurfaceId> {
        self.ids()
            .filter(|id| self.parent(*id).is_none())
            .flat_map(|root| self.subtree(root))
            .collect()
    }

    /// `id` and all of its descendants, depth first.
    pub fn subtree(&self, id: SurfaceId) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        if self.node(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.node(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// World bounds of the meshes in `id`'s subtree.
    pub fn world_aabb(&self, id: SurfaceId) -> Option<Aabb> {
        self.subtree(id)
            .into_iter()
            .filter_map(|node_id| {
                let local = self.mesh(node_id)?.local_aabb()?;
                Some(local.transformed(&self.world_transform(node_id)))
            })
            .reduce(|acc, aabb| acc.union(&aabb))
    }

    /// Bounds of every mesh in the scene, `None` while nothing is loaded.
    pub fn bounds(&self) -> Option<SceneBounds> {
        self.ids()
            .filter_map(|id| {
                let local = self.mesh(id)?.local_aabb()?;
                Some(local.transformed(&self.world_transform(id)))
            })
            .reduce(|acc, aabb| acc.union(&aabb))
    }
}

pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<SurfaceId>,
}

impl Iterator for Ancestors<'_> {
    type Item = SurfaceId;

    fn next(&mut self) -> Option<SurfaceId> {
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

/// Rotation order: Z (roll) * Y (yaw) * X (pitch)
pub fn compose_transform_matrix(position: Vec3, rotation_deg: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_euler(
        EulerRot::ZYX,
        rotation_deg.z.to_radians(),
        rotation_deg.y.to_radians(),
        rotation_deg.x.to_radians(),
    );
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Inverse of [`compose_transform_matrix`] for matrices without shear.
pub fn decompose_transform_matrix(matrix: &Mat4) -> (Vec3, Vec3, Vec3) {
    let (scale, rotation, position) = matrix.to_scale_rotation_translation();
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    (
        position,
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees()),
        scale,
    )
}
