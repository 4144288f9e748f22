//! Renderer adapter: scene + viewport + transient interaction state →
//! a frame the host draws.
//!
//! Node renderers are host closures looked up by `Node::kind`; edge
//! geometry comes from the [`EdgeTypeRegistry`]. A `type` without a
//! renderer produces a `Missing` marker and a diagnostic, never a guess.

use kurbo::BezPath;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use wfc_core::diagnostics::{Diagnostic, Subject};
use wfc_core::id::{EdgeId, NodeId};
use wfc_core::model::{ElementData, HandleSide, Point, Rect, Size};
use wfc_core::options::CanvasOptions;
use wfc_core::scene::SceneModel;
use wfc_core::viewport::Viewport;

use crate::handles::HandleRegistry;
use crate::minimap::MinimapProjection;
use crate::path::{EdgePath, EdgeRenderProps, EdgeTypeRegistry, Endpoints, Routing, compute_edge_path};

/// Everything a host node renderer receives.
#[derive(Debug, Clone, Copy)]
pub struct NodeRenderProps<'a> {
    pub id: NodeId,
    pub kind: &'a str,
    pub data: &'a ElementData,
    pub selected: bool,
    pub screen_rect: Rect,
    pub zoom: f32,
}

pub type NodeRendererFn<T> = Box<dyn Fn(&NodeRenderProps<'_>) -> T>;

/// Host node renderers keyed by node `type`.
pub struct NodeTypeRegistry<T> {
    renderers: HashMap<String, NodeRendererFn<T>>,
}

impl<T> Default for NodeTypeRegistry<T> {
    fn default() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for NodeTypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: BTreeSet<&String> = self.renderers.keys().collect();
        f.debug_struct("NodeTypeRegistry")
            .field("types", &keys)
            .finish()
    }
}

impl<T> NodeTypeRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: &str, renderer: F)
    where
        F: Fn(&NodeRenderProps<'_>) -> T + 'static,
    {
        self.renderers.insert(kind.to_string(), Box::new(renderer));
    }

    pub fn get(&self, kind: &str) -> Option<&NodeRendererFn<T>> {
        self.renderers.get(kind)
    }
}

/// Renderer output or the fallback marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<T> {
    Ok(T),
    Missing { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeItem<T> {
    pub id: NodeId,
    pub screen_rect: Rect,
    pub selected: bool,
    pub content: Rendered<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeItem {
    pub id: EdgeId,
    pub selected: bool,
    /// World-space path; the host applies the viewport transform.
    pub content: Rendered<EdgePath>,
}

/// Interaction state the frame must reflect, supplied by the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transient {
    /// In-progress connection: source handle world point and side, and
    /// the current pointer in world space.
    pub connection: Option<(Point, HandleSide, Point)>,
    /// Box-select rectangle in world space.
    pub selection_box: Option<Rect>,
}

#[derive(Debug)]
pub struct RenderFrame<T> {
    pub viewport: Viewport,
    /// Bottom to top.
    pub nodes: Vec<NodeItem<T>>,
    pub edges: Vec<EdgeItem>,
    pub rubber_band: Option<EdgePath>,
    /// Screen-space selection box.
    pub selection_box: Option<Rect>,
    pub minimap: Option<MinimapProjection>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Route every edge. Unroutable edges (missing type or endpoint) are
/// returned separately by kind.
fn route_edges(
    scene: &SceneModel,
    handles: &mut HandleRegistry,
    edge_types: &EdgeTypeRegistry,
) -> Vec<(EdgeId, bool, Result<(EdgePath, BezPath), String>)> {
    let mut out = Vec::with_capacity(scene.edges().len());
    for edge in scene.edges() {
        let Some(ends) = handles.edge_endpoints(scene, edge) else {
            continue;
        };
        let props = EdgeRenderProps {
            id: edge.id,
            source_x: ends.source.x,
            source_y: ends.source.y,
            target_x: ends.target.x,
            target_y: ends.target.y,
            source_side: ends.source_side,
            target_side: ends.target_side,
            data: &edge.data,
            selected: edge.selected,
        };
        let routed = edge_types
            .route(&edge.kind, &props)
            .ok_or_else(|| edge.kind.clone());
        out.push((edge.id, edge.selected, routed));
    }
    out
}

/// World-space paths of all routable edges, in paint order, for hit-testing.
pub fn edge_paths(
    scene: &SceneModel,
    handles: &mut HandleRegistry,
    edge_types: &EdgeTypeRegistry,
) -> Vec<(EdgeId, BezPath)> {
    route_edges(scene, handles, edge_types)
        .into_iter()
        .filter_map(|(id, _, routed)| routed.ok().map(|(_, bez)| (id, bez)))
        .collect()
}

/// Rubber-band path from a source handle to the pointer.
pub fn connection_line(from: Point, from_side: HandleSide, to: Point) -> EdgePath {
    let to_side = match from_side {
        HandleSide::Top => HandleSide::Bottom,
        HandleSide::Bottom => HandleSide::Top,
        HandleSide::Left => HandleSide::Right,
        HandleSide::Right => HandleSide::Left,
    };
    compute_edge_path(&Endpoints::new(from, from_side, to, to_side), Routing::Bezier)
}

/// Build one frame. Pure with respect to the scene and viewport; only the
/// handle registry's position cache is touched.
#[allow(clippy::too_many_arguments)]
pub fn build_frame<T>(
    scene: &SceneModel,
    viewport: &Viewport,
    screen: Size,
    handles: &mut HandleRegistry,
    node_types: &NodeTypeRegistry<T>,
    edge_types: &EdgeTypeRegistry,
    transient: &Transient,
    options: &CanvasOptions,
) -> RenderFrame<T> {
    let mut diagnostics = Vec::new();
    let mut missing_node_types = BTreeSet::new();
    let mut missing_edge_types = BTreeSet::new();

    let nodes = scene
        .paint_order()
        .into_iter()
        .filter_map(|id| scene.node(id))
        .map(|node| {
            let screen_rect = viewport.rect_to_screen(&node.bounds());
            let content = match node_types.get(&node.kind) {
                Some(render) => Rendered::Ok(render(&NodeRenderProps {
                    id: node.id,
                    kind: &node.kind,
                    data: &node.data,
                    selected: node.selected,
                    screen_rect,
                    zoom: viewport.zoom,
                })),
                None => {
                    missing_node_types.insert(node.kind.clone());
                    Rendered::Missing {
                        kind: node.kind.clone(),
                    }
                }
            };
            NodeItem {
                id: node.id,
                screen_rect,
                selected: node.selected,
                content,
            }
        })
        .collect();

    let edges = route_edges(scene, handles, edge_types)
        .into_iter()
        .map(|(id, selected, routed)| {
            let content = match routed {
                Ok((path, _)) => Rendered::Ok(path),
                Err(kind) => {
                    missing_edge_types.insert(kind.clone());
                    Rendered::Missing { kind }
                }
            };
            EdgeItem {
                id,
                selected,
                content,
            }
        })
        .collect();

    for kind in missing_node_types.iter().chain(missing_edge_types.iter()) {
        diagnostics.push(Diagnostic::missing_renderer(Subject::Type, kind));
    }

    let rubber_band = transient
        .connection
        .map(|(from, side, to)| connection_line(from, side, to));
    let selection_box = transient
        .selection_box
        .map(|r| viewport.rect_to_screen(&r));

    let minimap = options.show_minimap.then(|| {
        MinimapProjection::new(
            scene.nodes_bounds(),
            viewport.visible_world_rect(screen),
            Size::new(200.0, 150.0),
        )
    });

    log::trace!(
        "frame: {} node(s), {} diagnostic(s)",
        scene.node_count(),
        diagnostics.len()
    );

    RenderFrame {
        viewport: *viewport,
        nodes,
        edges,
        rubber_band,
        selection_box,
        minimap,
        diagnostics,
    }
}
