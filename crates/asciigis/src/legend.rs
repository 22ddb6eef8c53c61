//! Legend rows: flattening the layer tree for display and navigation.
//!
//! The legend pane shows a depth-first flattening of the layer tree.
//! Collapsed groups hide their descendants from the row list entirely;
//! the nodes themselves are untouched, so re-expanding restores the same
//! rows in the same relative order.

use crate::project::{GeometryKind, LayerNode, LayerTree, NodeId};

/// What a legend row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Group,
    Layer(GeometryKind),
}

/// One visible row of the legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub id: NodeId,
    pub depth: usize,
    pub kind: RowKind,
    pub name: String,
    pub visible: bool,
    /// `Some` for groups, `None` for layers.
    pub expanded: Option<bool>,
}

impl LegendRow {
    /// `-` expanded, `+` collapsed, blank for layers.
    pub fn expand_glyph(&self) -> char {
        match self.expanded {
            Some(true) => '-',
            Some(false) => '+',
            None => ' ',
        }
    }

    pub fn visibility_glyph(&self) -> &'static str {
        if self.visible {
            "[x]"
        } else {
            "[ ]"
        }
    }

    /// `(L) name` for layers, `(G) name` for groups.
    pub fn label(&self) -> String {
        match self.kind {
            RowKind::Group => format!("(G) {}", self.name),
            RowKind::Layer(_) => format!("(L) {}", self.name),
        }
    }
}

/// Depth-first flattening starting at the root's direct children. Group
/// children are visited only while the group is expanded.
pub fn flatten(tree: &LayerTree) -> Vec<LegendRow> {
    fn walk(nodes: &[LayerNode], depth: usize, out: &mut Vec<LegendRow>) {
        for node in nodes {
            match node {
                LayerNode::Group(group) => {
                    out.push(LegendRow {
                        id: group.id,
                        depth,
                        kind: RowKind::Group,
                        name: group.name.clone(),
                        visible: group.visible,
                        expanded: Some(group.expanded),
                    });
                    if group.expanded {
                        walk(&group.children, depth + 1, out);
                    }
                }
                LayerNode::Layer(layer) => {
                    out.push(LegendRow {
                        id: layer.id,
                        depth,
                        kind: RowKind::Layer(layer.geometry),
                        name: layer.name.clone(),
                        visible: layer.visible,
                        expanded: None,
                    });
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(&tree.nodes, 0, &mut out);
    out
}

/// Set a group's expansion flag; layers are left alone.
pub fn set_expanded(tree: &mut LayerTree, id: NodeId, expanded: bool) {
    if let Some(LayerNode::Group(group)) = tree.find_mut(id) {
        group.expanded = expanded;
    }
}
