//! The authoritative node/edge collections.
//!
//! Nodes live in a `StableDiGraph` whose graph edges mirror the canvas
//! edges (source → target, weighted by `EdgeId`), so cascading removal and
//! incident-edge queries are adjacency lookups. Host array order is kept
//! separately in `order`; paint order is `(z_index + selection lift, order)`.
//!
//! Invariants held after every public call:
//! - node and edge ids are unique;
//! - every edge's `source` and `target` are present in the node set.

use crate::changes::{EdgeChange, NodeChange};
use crate::diagnostics::{Diagnostic, SceneError};
use crate::id::{EdgeId, NodeId};
use crate::model::{Connection, Edge, Node, Point, Rect, Size};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Effective z added to selected nodes.
pub const SELECTED_NODE_LIFT: i64 = 1000;

/// Summary of an external node update, used to invalidate derived state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    /// Nodes whose position or size differs from the previous state.
    pub moved: Vec<NodeId>,
    /// Nodes whose size changed, with their previous size.
    pub resized: Vec<(NodeId, Size)>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A node removed together with the edges that referenced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    graph: StableDiGraph<Node, EdgeId>,
    id_index: HashMap<NodeId, NodeIndex>,
    /// Host array order of nodes.
    order: Vec<NodeIndex>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeId, usize>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from host arrays, rejecting duplicates.
    pub fn from_parts(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<(Self, Vec<Diagnostic>), SceneError> {
        let mut scene = Self::new();
        let mut report = scene.apply_external_nodes(nodes)?;
        report.diagnostics.extend(scene.apply_external_edges(edges)?);
        Ok((scene, report.diagnostics))
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index.get(&id).map(|i| &self.edges[*i])
    }

    /// Nodes in host array order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(|idx| &self.graph[*idx])
    }

    /// Owned copy of the node array, as handed to `on_nodes_change`.
    pub fn node_vec(&self) -> Vec<Node> {
        self.nodes().cloned().collect()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids bottom-to-top: ascending effective z, ties in array order.
    ///
    /// Selected nodes are lifted by [`SELECTED_NODE_LIFT`] so the node being
    /// clicked or dragged is drawn and hit-tested above its neighbours
    /// without rewriting the host's `z_index`.
    pub fn paint_order(&self) -> Vec<NodeId> {
        let mut ranked: Vec<(i64, usize, NodeId)> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, idx)| {
                let n = &self.graph[*idx];
                let lift = if n.selected { SELECTED_NODE_LIFT } else { 0 };
                (i64::from(n.z_index) + lift, i, n.id)
            })
            .collect();
        ranked.sort_by_key(|(z, i, _)| (*z, *i));
        ranked.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Ids of all edges with `node` as source or target.
    pub fn connected_edges(&self, node: NodeId) -> SmallVec<[EdgeId; 4]> {
        let Some(&idx) = self.id_index.get(&node) else {
            return SmallVec::new();
        };
        let mut out: SmallVec<[EdgeId; 4]> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| *e.weight())
            .collect();
        // Self-loops show up in both directions.
        out.sort();
        out.dedup();
        out
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes().filter(|n| n.selected).map(|n| n.id).collect()
    }

    pub fn selected_edges(&self) -> Vec<EdgeId> {
        self.edges.iter().filter(|e| e.selected).map(|e| e.id).collect()
    }

    /// Union of the bounding boxes of all nodes, `None` when empty.
    pub fn nodes_bounds(&self) -> Option<Rect> {
        self.nodes()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    // ─── External (controlled) updates ───────────────────────────────────

    /// Replace the node set with the host's array.
    ///
    /// Nodes are matched by id. Measured dimensions the host does not know
    /// about (zero width/height) are carried over from the previous node so
    /// an echoed array never collapses a node. A duplicate id rejects the
    /// whole update. Edges left dangling by removed nodes are dropped.
    pub fn apply_external_nodes(
        &mut self,
        nodes: Vec<Node>,
    ) -> Result<ReconcileReport, SceneError> {
        let mut seen = HashSet::with_capacity(nodes.len());
        for n in &nodes {
            if !seen.insert(n.id) {
                log::warn!("rejecting node update: duplicate id `{}`", n.id);
                return Err(SceneError::DuplicateNodeId(n.id));
            }
        }

        let mut report = ReconcileReport::default();
        let mut graph = StableDiGraph::with_capacity(nodes.len(), self.edges.len());
        let mut id_index = HashMap::with_capacity(nodes.len());
        let mut order = Vec::with_capacity(nodes.len());

        for mut node in nodes {
            match self.node(node.id) {
                Some(prev) => {
                    if node.width == 0.0 && node.height == 0.0 {
                        node.width = prev.width;
                        node.height = prev.height;
                    }
                    let resized = prev.width != node.width || prev.height != node.height;
                    if resized {
                        report.resized.push((node.id, prev.size()));
                    }
                    if resized || prev.position != node.position {
                        report.moved.push(node.id);
                    }
                }
                None => report.added.push(node.id),
            }
            let id = node.id;
            let idx = graph.add_node(node);
            id_index.insert(id, idx);
            order.push(idx);
        }

        report.removed = self
            .nodes()
            .filter(|n| !id_index.contains_key(&n.id))
            .map(|n| n.id)
            .collect();

        self.graph = graph;
        self.id_index = id_index;
        self.order = order;

        let edges = std::mem::take(&mut self.edges);
        report.diagnostics = self.install_edges(edges);
        Ok(report)
    }

    /// Replace the edge set with the host's array.
    ///
    /// Edges referencing missing nodes are dropped with a diagnostic; a
    /// duplicate edge id rejects the whole update.
    pub fn apply_external_edges(&mut self, edges: Vec<Edge>) -> Result<Vec<Diagnostic>, SceneError> {
        let mut seen = HashSet::with_capacity(edges.len());
        for e in &edges {
            if !seen.insert(e.id) {
                log::warn!("rejecting edge update: duplicate id `{}`", e.id);
                return Err(SceneError::DuplicateEdgeId(e.id));
            }
        }
        Ok(self.install_edges(edges))
    }

    fn install_edges(&mut self, edges: Vec<Edge>) -> Vec<Diagnostic> {
        self.graph.clear_edges();
        self.edges.clear();
        self.edge_index.clear();

        let mut diagnostics = Vec::new();
        for edge in edges {
            let endpoints = (self.id_index.get(&edge.source), self.id_index.get(&edge.target));
            match endpoints {
                (Some(&s), Some(&t)) => {
                    self.graph.add_edge(s, t, edge.id);
                    self.edge_index.insert(edge.id, self.edges.len());
                    self.edges.push(edge);
                }
                (s, _) => {
                    let missing = if s.is_none() { edge.source } else { edge.target };
                    log::warn!("dropping edge `{}`: missing node `{missing}`", edge.id);
                    diagnostics.push(Diagnostic::dangling_edge(edge.id, missing));
                }
            }
        }
        diagnostics
    }

    fn rebuild_edge_index(&mut self) {
        self.edge_index.clear();
        for (i, e) in self.edges.iter().enumerate() {
            self.edge_index.insert(e.id, i);
        }
    }

    // ─── Internal mutations ──────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> Result<(), SceneError> {
        if self.contains_node(node.id) {
            return Err(SceneError::DuplicateNodeId(node.id));
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.order.push(idx);
        Ok(())
    }

    /// Remove a node and every edge that references it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, SceneError> {
        let idx = *self.id_index.get(&id).ok_or(SceneError::UnknownNode(id))?;
        let incident: HashSet<EdgeId> = self.connected_edges(id).into_iter().collect();

        let mut removed_edges = Vec::with_capacity(incident.len());
        self.edges.retain(|e| {
            if incident.contains(&e.id) {
                removed_edges.push(e.clone());
                false
            } else {
                true
            }
        });
        self.rebuild_edge_index();

        // Removing the graph node drops its incident graph edges as well.
        let node = self
            .graph
            .remove_node(idx)
            .ok_or(SceneError::UnknownNode(id))?;
        self.id_index.remove(&id);
        self.order.retain(|i| *i != idx);

        log::debug!("removed node `{id}` and {} edge(s)", removed_edges.len());
        Ok(RemovedNode {
            node,
            edges: removed_edges,
        })
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<(), SceneError> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(SceneError::DuplicateEdgeId(edge.id));
        }
        let s = *self
            .id_index
            .get(&edge.source)
            .ok_or(SceneError::UnknownNode(edge.source))?;
        let t = *self
            .id_index
            .get(&edge.target)
            .ok_or(SceneError::UnknownNode(edge.target))?;
        self.graph.add_edge(s, t, edge.id);
        self.edge_index.insert(edge.id, self.edges.len());
        self.edges.push(edge);
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, SceneError> {
        let pos = *self.edge_index.get(&id).ok_or(SceneError::UnknownEdge(id))?;
        let edge = self.edges.remove(pos);
        if let Some(gidx) = self
            .graph
            .edge_indices()
            .find(|e| self.graph.edge_weight(*e) == Some(&id))
        {
            self.graph.remove_edge(gidx);
        }
        self.rebuild_edge_index();
        Ok(edge)
    }

    /// Commit a connection as a new edge.
    ///
    /// Returns `None` when an identical connection already exists or an
    /// endpoint is missing; the scene is left untouched in that case.
    pub fn connect(&mut self, connection: &Connection) -> Option<Edge> {
        if self.edges.iter().any(|e| connection.matches(e)) {
            log::debug!("connection {connection:?} already exists");
            return None;
        }
        let mut id = EdgeId::for_connection(
            connection.source,
            connection.source_handle,
            connection.target,
            connection.target_handle,
        );
        if self.edge_index.contains_key(&id) {
            id = EdgeId::with_prefix("edge");
        }
        let edge = Edge::from_connection(id, connection);
        match self.add_edge(edge.clone()) {
            Ok(()) => Some(edge),
            Err(err) => {
                log::warn!("connection rejected: {err}");
                None
            }
        }
    }

    /// Returns true only when the node exists and actually moved.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) if node.position != position => {
                node.position = position;
                true
            }
            _ => false,
        }
    }

    /// Returns true only when the node exists and its size changed.
    pub fn set_dimensions(&mut self, id: NodeId, width: f32, height: f32) -> bool {
        match self.node_mut(id) {
            Some(node) if node.width != width || node.height != height => {
                node.width = width;
                node.height = height;
                true
            }
            _ => false,
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    /// Apply a change list produced by the canvas. Unknown ids are skipped.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    self.set_position(*id, *position);
                }
                NodeChange::Dimensions { id, width, height } => {
                    self.set_dimensions(*id, *width, *height);
                }
                NodeChange::Select { id, selected } => {
                    if let Some(node) = self.node_mut(*id) {
                        node.selected = *selected;
                    }
                }
                NodeChange::Remove { id } => {
                    let _ = self.remove_node(*id);
                }
                NodeChange::Add { node } => {
                    if let Err(err) = self.add_node(node.clone()) {
                        log::warn!("skipping add: {err}");
                    }
                }
            }
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select exactly `nodes` and `edges`, deselecting everything else.
    /// Returns only the entries whose flag actually flipped.
    pub fn select_only(
        &mut self,
        nodes: &[NodeId],
        edges: &[EdgeId],
    ) -> (Vec<NodeChange>, Vec<EdgeChange>) {
        let node_set: HashSet<NodeId> = nodes.iter().copied().collect();
        let edge_set: HashSet<EdgeId> = edges.iter().copied().collect();

        let mut node_changes = Vec::new();
        for &idx in &self.order {
            let node = &mut self.graph[idx];
            let want = node_set.contains(&node.id);
            if node.selected != want {
                node.selected = want;
                node_changes.push(NodeChange::Select {
                    id: node.id,
                    selected: want,
                });
            }
        }

        let mut edge_changes = Vec::new();
        for edge in &mut self.edges {
            let want = edge_set.contains(&edge.id);
            if edge.selected != want {
                edge.selected = want;
                edge_changes.push(EdgeChange::Select {
                    id: edge.id,
                    selected: want,
                });
            }
        }
        (node_changes, edge_changes)
    }

    /// Add to (or, with `toggle`, flip within) the current selection.
    pub fn extend_selection(
        &mut self,
        nodes: &[NodeId],
        edges: &[EdgeId],
        toggle: bool,
    ) -> (Vec<NodeChange>, Vec<EdgeChange>) {
        let mut node_changes = Vec::new();
        for &id in nodes {
            if let Some(node) = self.node_mut(id) {
                let want = if toggle { !node.selected } else { true };
                if node.selected != want {
                    node.selected = want;
                    node_changes.push(NodeChange::Select { id, selected: want });
                }
            }
        }
        let mut edge_changes = Vec::new();
        for &id in edges {
            if let Some(&i) = self.edge_index.get(&id) {
                let edge = &mut self.edges[i];
                let want = if toggle { !edge.selected } else { true };
                if edge.selected != want {
                    edge.selected = want;
                    edge_changes.push(EdgeChange::Select { id, selected: want });
                }
            }
        }
        (node_changes, edge_changes)
    }
}
