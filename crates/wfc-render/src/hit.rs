//! Hit testing: screen point → what is under the pointer.
//!
//! Walks nodes in reverse paint order (last painted = topmost). Priority
//! when several things overlap: handle, resize grip, node body, edge, pane.

use kurbo::{BezPath, ParamCurveNearest};
use wfc_core::id::{EdgeId, NodeId};
use wfc_core::model::{HandleRef, Point, Rect};
use wfc_core::options::CanvasOptions;
use wfc_core::scene::SceneModel;
use wfc_core::viewport::Viewport;

use crate::handles::{HandleQuery, HandleRegistry};

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Handle(HandleRef),
    ResizeGrip(NodeId),
    Node(NodeId),
    Edge(EdgeId),
    Pane,
}

/// Topmost node whose box contains the world point.
pub fn hit_test_node(scene: &SceneModel, world: Point) -> Option<NodeId> {
    scene
        .paint_order()
        .into_iter()
        .rev()
        .find(|id| scene.node(*id).is_some_and(|n| n.bounds().contains(world)))
}

/// All nodes whose box intersects the world rectangle, in paint order.
/// Used for box selection.
pub fn hit_test_rect(scene: &SceneModel, rect: &Rect) -> Vec<NodeId> {
    scene
        .paint_order()
        .into_iter()
        .filter(|id| scene.node(*id).is_some_and(|n| n.bounds().intersects(rect)))
        .collect()
}

/// Topmost node whose bottom-right resize grip is under the pointer.
///
/// The grip is a square of `grip_px` screen pixels centred on the corner.
pub fn hit_test_resize_grip(
    scene: &SceneModel,
    viewport: &Viewport,
    screen: Point,
    grip_px: f32,
) -> Option<NodeId> {
    let half = grip_px / 2.0;
    scene.paint_order().into_iter().rev().find(|id| {
        scene.node(*id).is_some_and(|n| {
            let corner = viewport.world_to_screen(n.bounds().max());
            (screen.x - corner.x).abs() <= half && (screen.y - corner.y).abs() <= half
        })
    })
}

/// Distance from a world point to the nearest point on a path.
pub fn distance_to_path(path: &BezPath, world: Point) -> f32 {
    let p = kurbo::Point::new(world.x as f64, world.y as f64);
    path.segments()
        .map(|seg| seg.nearest(p, 1e-3).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt() as f32
}

/// Topmost edge passing within `tolerance_px` of the pointer.
///
/// `paths` are world-space edge paths in paint order.
pub fn hit_test_edge(
    paths: &[(EdgeId, BezPath)],
    viewport: &Viewport,
    screen: Point,
    tolerance_px: f32,
) -> Option<EdgeId> {
    let world = viewport.screen_to_world(screen);
    let tolerance = tolerance_px / viewport.zoom;
    paths
        .iter()
        .rev()
        .find(|(_, path)| distance_to_path(path, world) <= tolerance)
        .map(|(id, _)| *id)
}

/// Resolve the full target under the pointer.
pub fn pick(
    scene: &SceneModel,
    handles: &mut HandleRegistry,
    edge_paths: &[(EdgeId, BezPath)],
    viewport: &Viewport,
    screen: Point,
    options: &CanvasOptions,
) -> Target {
    if let Some(handle) = handles.hit_test_handle(
        scene,
        viewport,
        screen,
        options.handle_tolerance,
        HandleQuery::any(),
    ) {
        return Target::Handle(handle);
    }
    if let Some(id) = hit_test_resize_grip(scene, viewport, screen, options.handle_tolerance) {
        return Target::ResizeGrip(id);
    }
    let world = viewport.screen_to_world(screen);
    if let Some(id) = hit_test_node(scene, world) {
        return Target::Node(id);
    }
    if let Some(id) = hit_test_edge(edge_paths, viewport, screen, options.edge_tolerance) {
        return Target::Edge(id);
    }
    Target::Pane
}
