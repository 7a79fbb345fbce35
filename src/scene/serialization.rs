use crate::scene::{
    compose_transform_matrix, decompose_transform_matrix, Mesh, NodeMarkers, SceneGraph,
    SurfaceId,
};
use glam::Vec3;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node {node} references parent {parent}, which is not an earlier node")]
    InvalidParent { node: usize, parent: u32 },
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Transform data - matches what an exporter writes per node
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransformData {
    pub position: [f32; 3],
    pub rotation_deg: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation_deg: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// Serializable scene node. Parents are referenced by index and must come
/// before their children.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Mesh>,
    #[serde(default)]
    pub markers: NodeMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDescription {
    pub nodes: Vec<NodeDescription>,
}

impl SceneDescription {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(
        &mut self,
        name: &str,
        parent: Option<u32>,
        transform: TransformData,
        mesh: Option<Mesh>,
        markers: NodeMarkers,
    ) -> u32 {
        self.nodes.push(NodeDescription {
            name: name.to_string(),
            parent,
            transform,
            mesh,
            markers,
        });
        (self.nodes.len() - 1) as u32
    }

    pub fn build(&self) -> Result<SceneGraph> {
        let mut graph = SceneGraph::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent as usize >= index {
                    return Err(SerializationError::InvalidParent {
                        node: index,
                        parent,
                    });
                }
            }
            graph.add_node(
                node.name.clone(),
                node.parent.map(SurfaceId),
                compose_transform_matrix(
                    Vec3::from(node.transform.position),
                    Vec3::from(node.transform.rotation_deg),
                    Vec3::from(node.transform.scale),
                ),
                node.mesh.clone(),
                node.markers,
            );
        }
        Ok(graph)
    }

    pub fn from_graph(graph: &SceneGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let (position, rotation_deg, scale) = decompose_transform_matrix(&node.transform);
                NodeDescription {
                    name: node.name.clone(),
                    parent: node.parent.map(|parent| parent.0),
                    transform: TransformData {
                        position: position.to_array(),
                        rotation_deg: rotation_deg.to_array(),
                        scale: scale.to_array(),
                    },
                    mesh: node.mesh.clone(),
                    markers: node.markers,
                }
            })
            .collect();
        Self { nodes }
    }
}

pub fn save_scene_to_file(scene: &SceneDescription, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_scene_from_file(path: &Path) -> Result<SceneDescription> {
    let json = std::fs::read_to_string(path)?;
    let scene: SceneDescription = serde_json::from_str(&json)?;
    Ok(scene)
}
