//! Minimal change descriptions sent to the host.
//!
//! One list is delivered per committed gesture. A controlled host folds
//! the list into its own arrays with [`apply_node_changes`] /
//! [`apply_edge_changes`] and hands the result back.

use crate::id::{EdgeId, NodeId};
use crate::model::{Edge, Node, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position { id: NodeId, position: Point },
    Dimensions { id: NodeId, width: f32, height: f32 },
    Select { id: NodeId, selected: bool },
    Remove { id: NodeId },
    Add { node: Node },
}

impl NodeChange {
    pub fn id(&self) -> NodeId {
        match self {
            NodeChange::Position { id, .. }
            | NodeChange::Dimensions { id, .. }
            | NodeChange::Select { id, .. }
            | NodeChange::Remove { id } => *id,
            NodeChange::Add { node } => node.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
    Add { edge: Edge },
}

impl EdgeChange {
    pub fn id(&self) -> EdgeId {
        match self {
            EdgeChange::Select { id, .. } | EdgeChange::Remove { id } => *id,
            EdgeChange::Add { edge } => edge.id,
        }
    }
}

/// Fold node changes into a host-owned node array.
///
/// Changes for unknown ids are ignored; later changes win.
pub fn apply_node_changes(changes: &[NodeChange], nodes: &[Node]) -> Vec<Node> {
    let removed: HashSet<NodeId> = changes
        .iter()
        .filter_map(|c| match c {
            NodeChange::Remove { id } => Some(*id),
            _ => None,
        })
        .collect();

    let mut out: Vec<Node> = nodes
        .iter()
        .filter(|n| !removed.contains(&n.id))
        .cloned()
        .collect();

    for change in changes {
        match change {
            NodeChange::Add { node } => out.push(node.clone()),
            NodeChange::Remove { .. } => {}
            other => {
                if let Some(node) = out.iter_mut().find(|n| n.id == other.id()) {
                    match other {
                        NodeChange::Position { position, .. } => node.position = *position,
                        NodeChange::Dimensions { width, height, .. } => {
                            node.width = *width;
                            node.height = *height;
                        }
                        NodeChange::Select { selected, .. } => node.selected = *selected,
                        NodeChange::Remove { .. } | NodeChange::Add { .. } => {}
                    }
                }
            }
        }
    }
    out
}

/// Fold edge changes into a host-owned edge array.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &[Edge]) -> Vec<Edge> {
    let removed: HashSet<EdgeId> = changes
        .iter()
        .filter_map(|c| match c {
            EdgeChange::Remove { id } => Some(*id),
            _ => None,
        })
        .collect();

    let mut out: Vec<Edge> = edges
        .iter()
        .filter(|e| !removed.contains(&e.id))
        .cloned()
        .collect();

    for change in changes {
        match change {
            EdgeChange::Add { edge } => out.push(edge.clone()),
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = out.iter_mut().find(|e| e.id == *id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { .. } => {}
        }
    }
    out
}
