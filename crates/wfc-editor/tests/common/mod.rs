//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use wfc_core::changes::{EdgeChange, NodeChange};
use wfc_core::diagnostics::Diagnostic;
use wfc_core::id::NodeId;
use wfc_core::model::{Connection, Edge, Node, Point};
use wfc_core::options::CanvasOptions;
use wfc_editor::{CanvasEngine, CanvasHost};

/// Host that records every callback.
#[derive(Debug, Default)]
pub struct Recorder {
    pub node_calls: Vec<(Vec<NodeChange>, Vec<Node>)>,
    pub edge_calls: Vec<(Vec<EdgeChange>, Vec<Edge>)>,
    pub connects: Vec<Connection>,
    pub diagnostics: Vec<Diagnostic>,
    /// Reject every proposed connection.
    pub reject_connections: bool,
}

impl CanvasHost for Recorder {
    fn on_nodes_change(&mut self, changes: &[NodeChange], nodes: &[Node]) {
        self.node_calls.push((changes.to_vec(), nodes.to_vec()));
    }

    fn on_edges_change(&mut self, changes: &[EdgeChange], edges: &[Edge]) {
        self.edge_calls.push((changes.to_vec(), edges.to_vec()));
    }

    fn on_connect(&mut self, connection: &Connection) {
        self.connects.push(*connection);
    }

    fn is_valid_connection(&mut self, _connection: &Connection) -> bool {
        !self.reject_connections
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Nodes `a@(0,0)` and `b@(200,0)`, both 100x40, on an 800x600 screen.
pub fn two_nodes() -> CanvasEngine<Recorder> {
    init_logger();
    let mut engine = CanvasEngine::new(CanvasOptions::default(), Recorder::default());
    engine.set_screen_size(800.0, 600.0);
    engine
        .set_nodes(vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 40.0),
            Node::new("b", Point::new(200.0, 0.0)).with_size(100.0, 40.0),
        ])
        .unwrap();
    engine
}

/// `two_nodes` with default handles: `a.source` at (50,40), `b.target`
/// at (250,0).
pub fn two_nodes_with_handles() -> CanvasEngine<Recorder> {
    let mut engine = two_nodes();
    engine.register_default_handles(NodeId::intern("a"));
    engine.register_default_handles(NodeId::intern("b"));
    engine
}

pub fn position_of<H: CanvasHost>(engine: &CanvasEngine<H>, id: &str) -> Option<Point> {
    engine.scene().node(NodeId::intern(id)).map(|n| n.position)
}
