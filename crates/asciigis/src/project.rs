//! Project model: layer tree, geometry classification, and file loading.
//!
//! Projects are JSON documents (`.agp`) carrying a display name, the
//! renderable extent, and a recursive tree of groups and layers. Layer
//! geometry is stored inline as coordinate paths so the built-in
//! rasterizer can draw something; the UI itself only ever reads names,
//! visibility, expansion, and geometry kind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::viewport::MapExtent;

/// File extension appended to project names during resolution.
pub const PROJECT_EXT: &str = "agp";

pub type NodeId = u32;
pub type Coord = [f64; 2];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid project file: {0}")]
    Invalid(String),
}

/// Geometry classification of a vector layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    Unknown,
}

impl GeometryKind {
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "point" => GeometryKind::Point,
            "line" => GeometryKind::Line,
            "polygon" => GeometryKind::Polygon,
            _ => GeometryKind::Unknown,
        }
    }
}

/// A group node: named container of child nodes.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: NodeId,
    pub name: String,
    pub visible: bool,
    pub expanded: bool,
    pub children: Vec<LayerNode>,
}

/// A leaf layer: named set of features of one geometry kind.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: NodeId,
    pub name: String,
    pub visible: bool,
    pub geometry: GeometryKind,
    pub features: Vec<Vec<Coord>>,
}

/// Tagged node variant; groups carry children, layers carry geometry.
#[derive(Debug, Clone)]
pub enum LayerNode {
    Group(Group),
    Layer(Layer),
}

impl LayerNode {
    pub fn id(&self) -> NodeId {
        match self {
            LayerNode::Group(group) => group.id,
            LayerNode::Layer(layer) => layer.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LayerNode::Group(group) => &group.name,
            LayerNode::Layer(layer) => &layer.name,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            LayerNode::Group(group) => group.visible,
            LayerNode::Layer(layer) => layer.visible,
        }
    }

    pub fn toggle_visible(&mut self) {
        match self {
            LayerNode::Group(group) => group.visible = !group.visible,
            LayerNode::Layer(layer) => layer.visible = !layer.visible,
        }
    }
}

/// The project's layer tree; `nodes` are the root's direct children in
/// z-order, first node on top.
#[derive(Debug, Clone, Default)]
pub struct LayerTree {
    pub nodes: Vec<LayerNode>,
}

impl LayerTree {
    pub fn find(&self, id: NodeId) -> Option<&LayerNode> {
        fn walk(nodes: &[LayerNode], id: NodeId) -> Option<&LayerNode> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let LayerNode::Group(group) = node {
                    if let Some(found) = walk(&group.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&self.nodes, id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut LayerNode> {
        fn walk(nodes: &mut [LayerNode], id: NodeId) -> Option<&mut LayerNode> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let LayerNode::Group(group) = node {
                    if let Some(found) = walk(&mut group.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&mut self.nodes, id)
    }

    /// All layers in z-order, topmost first, ignoring visibility.
    pub fn layers(&self) -> Vec<&Layer> {
        fn walk<'tree>(nodes: &'tree [LayerNode], out: &mut Vec<&'tree Layer>) {
            for node in nodes {
                match node {
                    LayerNode::Layer(layer) => out.push(layer),
                    LayerNode::Group(group) => walk(&group.children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Layers that should render, topmost first. A layer renders only if
    /// its own flag and every ancestor group's flag are set.
    pub fn visible_layers(&self) -> Vec<&Layer> {
        fn walk<'tree>(nodes: &'tree [LayerNode], out: &mut Vec<&'tree Layer>) {
            for node in nodes {
                match node {
                    LayerNode::Layer(layer) => {
                        if layer.visible {
                            out.push(layer);
                        }
                    }
                    LayerNode::Group(group) => {
                        if group.visible {
                            walk(&group.children, out);
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Layer ids bottom-up, the traversal order used for color assignment.
    pub fn layer_ids_bottom_up(&self) -> Vec<NodeId> {
        self.layers().iter().rev().map(|layer| layer.id).collect()
    }
}

/// A loaded project: display name, renderable extent, layer tree.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub extent: MapExtent,
    pub tree: LayerTree,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: Option<String>,
    extent: [f64; 4],
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawNode {
    Group {
        name: String,
        #[serde(default = "default_true")]
        visible: bool,
        #[serde(default = "default_true")]
        expanded: bool,
        #[serde(default)]
        nodes: Vec<RawNode>,
    },
    Layer {
        name: String,
        #[serde(default = "default_true")]
        visible: bool,
        #[serde(default)]
        geometry: String,
        #[serde(default)]
        features: Vec<Vec<Coord>>,
    },
}

fn default_true() -> bool {
    true
}

fn build_node(raw: RawNode, next_id: &mut NodeId) -> LayerNode {
    let id = *next_id;
    *next_id += 1;
    match raw {
        RawNode::Group {
            name,
            visible,
            expanded,
            nodes,
        } => LayerNode::Group(Group {
            id,
            name,
            visible,
            expanded,
            children: nodes
                .into_iter()
                .map(|child| build_node(child, next_id))
                .collect(),
        }),
        RawNode::Layer {
            name,
            visible,
            geometry,
            features,
        } => LayerNode::Layer(Layer {
            id,
            name,
            visible,
            geometry: GeometryKind::from_name(&geometry),
            features,
        }),
    }
}

/// Search the configured directories for a project, appending the fixed
/// extension when the name lacks it. Returns the first hit.
pub fn resolve_project_path(paths: &[PathBuf], name: &str) -> Option<PathBuf> {
    let file_name = if name.ends_with(&format!(".{PROJECT_EXT}")) {
        name.to_string()
    } else {
        format!("{name}.{PROJECT_EXT}")
    };
    for dir in paths {
        let candidate = dir.join(&file_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Parse and validate a project file.
pub fn open_project(path: &Path) -> Result<Project, ProjectError> {
    let contents = fs::read_to_string(path)?;
    let raw: RawProject = serde_json::from_str(&contents)?;
    let [xmin, ymin, xmax, ymax] = raw.extent;
    if !(xmax > xmin) || !(ymax > ymin) {
        return Err(ProjectError::Invalid(
            "project extent has no area".to_string(),
        ));
    }

    let mut next_id: NodeId = 0;
    let nodes = raw
        .nodes
        .into_iter()
        .map(|node| build_node(node, &mut next_id))
        .collect();

    let name = raw.name.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });
    info!(project = %name, layers = next_id, "opened project");

    Ok(Project {
        name,
        extent: MapExtent::new(xmin, ymin, xmax, ymax),
        tree: LayerTree { nodes },
    })
}
