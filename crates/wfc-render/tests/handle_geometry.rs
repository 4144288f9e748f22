//! Integration tests: scene + viewport → handle registry → hit results.

use pretty_assertions::assert_eq;
use wfc_core::id::{HandleId, NodeId};
use wfc_core::model::{Edge, HandleKind, HandleRef, HandleSide, Node, Point};
use wfc_core::scene::SceneModel;
use wfc_core::viewport::Viewport;
use wfc_render::handles::{HandleQuery, HandleRegistry};

/// `a@(0,0)` and `b@(200,0)`, 100x40, with default handles.
fn setup() -> (SceneModel, HandleRegistry) {
    let (scene, _) = SceneModel::from_parts(
        vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 40.0),
            Node::new("b", Point::new(200.0, 0.0)).with_size(100.0, 40.0),
        ],
        vec![Edge::new("e", "a", "b")],
    )
    .unwrap();
    let mut reg = HandleRegistry::new();
    for n in scene.nodes() {
        reg.register_default_handles(n);
    }
    (scene, reg)
}

fn source_of(node: &str) -> HandleRef {
    HandleRef {
        node_id: NodeId::intern(node),
        handle_id: HandleId::intern("source"),
        kind: HandleKind::Source,
    }
}

#[test]
fn tolerance_is_in_screen_pixels() {
    let (scene, mut reg) = setup();
    let vp = Viewport::new(Point::new(100.0, 50.0), 2.0);
    // a.source at world (50,40) is screen (200,130).
    let hit = reg.hit_test_handle(&scene, &vp, Point::new(208.0, 130.0), 10.0, HandleQuery::any());
    assert_eq!(hit, Some(source_of("a")));
    let miss = reg.hit_test_handle(&scene, &vp, Point::new(212.0, 130.0), 10.0, HandleQuery::any());
    assert_eq!(miss, None);
}

#[test]
fn handle_follows_moved_node() {
    let (mut scene, mut reg) = setup();
    let a = NodeId::intern("a");
    let source = HandleId::intern("source");
    assert_eq!(
        reg.resolve_handle_world_position(&scene, a, source),
        Some(Point::new(50.0, 40.0))
    );

    scene.set_position(a, Point::new(10.0, 10.0));
    // No explicit invalidation: the cache notices the new position.
    assert_eq!(
        reg.resolve_handle_world_position(&scene, a, source),
        Some(Point::new(60.0, 50.0))
    );

    let edge = scene.edges()[0].clone();
    let ends = reg.edge_endpoints(&scene, &edge).unwrap();
    assert_eq!(ends.source, Point::new(60.0, 50.0));
    assert_eq!(ends.source_side, HandleSide::Bottom);
    assert_eq!(ends.target, Point::new(250.0, 0.0));
}

#[test]
fn unregistered_and_orphaned_handles_miss() {
    let (mut scene, mut reg) = setup();
    let vp = Viewport::default();
    let at_a_source = Point::new(50.0, 40.0);

    reg.unregister_handle(NodeId::intern("a"), HandleId::intern("source"));
    assert_eq!(
        reg.hit_test_handle(&scene, &vp, at_a_source, 5.0, HandleQuery::any()),
        None
    );

    // The registry still holds b's layouts, but b has left the scene.
    scene.remove_node(NodeId::intern("b")).unwrap();
    assert_eq!(
        reg.hit_test_handle(&scene, &vp, Point::new(250.0, 0.0), 5.0, HandleQuery::any()),
        None
    );
    assert_eq!(
        reg.resolve_handle_world_position(&scene, NodeId::intern("b"), HandleId::intern("target")),
        None
    );
}

#[test]
fn connection_query_only_finds_opposite_kind() {
    let (scene, mut reg) = setup();
    let vp = Viewport::default();
    let query = HandleQuery::compatible_with(&source_of("a"));

    // b.source sits at (250,40): same kind, not a valid target.
    assert_eq!(
        reg.hit_test_handle(&scene, &vp, Point::new(250.0, 40.0), 5.0, query),
        None
    );
    let hit = reg
        .hit_test_handle(&scene, &vp, Point::new(251.0, 1.0), 5.0, query)
        .unwrap();
    assert_eq!(hit.node_id, NodeId::intern("b"));
    assert_eq!(hit.kind, HandleKind::Target);
}
