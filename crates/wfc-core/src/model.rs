//! Core data model for the workflow canvas.
//!
//! Nodes and edges are owned by the [`SceneModel`](crate::scene::SceneModel).
//! Positions are in world coordinates with a top-left origin; the
//! [`Viewport`](crate::viewport::Viewport) maps them to screen pixels.
//! Handles are derived geometry and live in the render crate's registry,
//! never here.

use crate::id::{EdgeId, HandleId, NodeId};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Arbitrary host data attached to a node or edge.
pub type ElementData = serde_json::Map<String, serde_json::Value>;

// ─── Points & Rects ──────────────────────────────────────────────────────

/// A 2D point or vector. The coordinate space is implied by context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Arithmetic mean of two points.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(self, other: Point, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanned by two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// AABB overlap. Touching edges count, so zero-size nodes inside a
    /// selection box are still picked up.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && self.x + self.width >= other.x
            && self.y <= other.y + other.height
            && self.y + self.height >= other.y
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

// ─── Handles ─────────────────────────────────────────────────────────────

/// Whether a handle starts or ends connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Source,
    Target,
}

impl HandleKind {
    pub fn opposite(self) -> Self {
        match self {
            HandleKind::Source => HandleKind::Target,
            HandleKind::Target => HandleKind::Source,
        }
    }
}

/// Side of the node's bounding box a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl HandleSide {
    /// Outward unit normal of this side.
    pub fn normal(self) -> Point {
        match self {
            HandleSide::Top => Point::new(0.0, -1.0),
            HandleSide::Right => Point::new(1.0, 0.0),
            HandleSide::Bottom => Point::new(0.0, 1.0),
            HandleSide::Left => Point::new(-1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, HandleSide::Left | HandleSide::Right)
    }
}

/// Reference to one registered handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleRef {
    pub node_id: NodeId,
    pub handle_id: HandleId,
    pub kind: HandleKind,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn default_node_type() -> String {
    "default".to_string()
}

fn default_edge_type() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// A node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    /// Renderer key, looked up in the host's node type registry.
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,

    /// World position of the top-left corner.
    #[serde(default)]
    pub position: Point,

    #[serde(default)]
    pub data: ElementData,

    #[serde(default)]
    pub selected: bool,

    #[serde(default = "default_true")]
    pub draggable: bool,

    #[serde(default)]
    pub z_index: i32,

    /// Measured size in world units; zero until the renderer reports it.
    #[serde(default)]
    pub width: f32,

    #[serde(default)]
    pub height: f32,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, position: Point) -> Self {
        Self {
            id: id.into(),
            kind: default_node_type(),
            position,
            data: ElementData::new(),
            selected: false,
            draggable: true,
            z_index: 0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,

    /// Routing / renderer key, looked up in the edge type registry.
    #[serde(rename = "type", default = "default_edge_type")]
    pub kind: String,

    #[serde(default)]
    pub data: ElementData,

    #[serde(default)]
    pub selected: bool,
}

impl Edge {
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            kind: default_edge_type(),
            data: ElementData::new(),
            selected: false,
        }
    }

    pub fn with_handles(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.source_handle = source.map(HandleId::intern);
        self.target_handle = target.map(HandleId::intern);
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Build an edge from a committed connection.
    pub fn from_connection(id: EdgeId, connection: &Connection) -> Self {
        Self {
            id,
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            kind: default_edge_type(),
            data: ElementData::new(),
            selected: false,
        }
    }
}

/// A proposed or committed connection, as reported to `on_connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
}

impl Connection {
    /// Orient a handle pair so the source-kind handle comes first.
    ///
    /// Connections may be drawn from a target handle back to a source
    /// handle; the committed edge always runs source → target.
    pub fn between(from: HandleRef, to: HandleRef) -> Self {
        let (src, tgt) = match from.kind {
            HandleKind::Source => (from, to),
            HandleKind::Target => (to, from),
        };
        Self {
            source: src.node_id,
            target: tgt.node_id,
            source_handle: Some(src.handle_id),
            target_handle: Some(tgt.handle_id),
        }
    }

    /// Whether `edge` already connects exactly these endpoints.
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
            && edge.target_handle == self.target_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(50.0, 10.0), Point::new(10.0, 40.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 40.0, 30.0));
    }

    #[test]
    fn rect_union_and_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 15.0));
        assert!(a.intersects(&Rect::new(10.0, 10.0, 5.0, 5.0)));
    }

    #[test]
    fn node_deserializes_host_shape() {
        let json = r#"{
            "id": "fetch",
            "type": "httpRequest",
            "position": { "x": 10, "y": 20 },
            "data": { "label": "Fetch" },
            "zIndex": 3
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, NodeId::intern("fetch"));
        assert_eq!(node.kind, "httpRequest");
        assert_eq!(node.position, Point::new(10.0, 20.0));
        assert_eq!(node.z_index, 3);
        assert!(node.draggable);
        assert!(!node.selected);
        assert_eq!(node.data["label"], "Fetch");
    }

    #[test]
    fn edge_serializes_without_missing_handles() {
        let edge = Edge::new("e1", "a", "b");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "default");
        assert!(json.get("sourceHandle").is_none());
    }

    #[test]
    fn connection_between_orients_source_first() {
        let out = HandleRef {
            node_id: NodeId::intern("a"),
            handle_id: HandleId::intern("out"),
            kind: HandleKind::Source,
        };
        let inp = HandleRef {
            node_id: NodeId::intern("b"),
            handle_id: HandleId::intern("in"),
            kind: HandleKind::Target,
        };
        let c = Connection::between(inp, out);
        assert_eq!(c.source, NodeId::intern("a"));
        assert_eq!(c.target, NodeId::intern("b"));
        assert_eq!(c.source_handle, Some(HandleId::intern("out")));
    }
}
