//! Integration tests: pointer gestures through the canvas engine.
//!
//! Each test drives `CanvasEngine` with screen-space input and checks the
//! scene plus the callbacks a host would receive.

mod common;

use common::{Recorder, position_of, two_nodes, two_nodes_with_handles};
use pretty_assertions::assert_eq;
use wfc_core::changes::{EdgeChange, NodeChange};
use wfc_core::id::{EdgeId, HandleId, NodeId};
use wfc_core::model::{Edge, Node, Point, Rect, Size};
use wfc_core::options::CanvasOptions;
use wfc_editor::{CanvasEngine, InputEvent, Modifiers};

const SHIFT: Modifiers = Modifiers {
    shift: true,
    ctrl: false,
    alt: false,
    meta: false,
};

// ─── Node drag ──────────────────────────────────────────────────────────

#[test]
fn drag_reports_once_with_final_position() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    for x in [20.0, 30.0, 45.0, 60.0] {
        engine.pointer_move(Point::new(x, 10.0));
        engine.frame();
    }
    assert!(engine.host().node_calls.is_empty(), "no notification mid-drag");
    engine.pointer_up(Point::new(60.0, 10.0));

    let calls = &engine.host().node_calls;
    assert_eq!(calls.len(), 1);
    let (changes, nodes) = &calls[0];
    let a = NodeId::intern("a");
    assert!(changes.contains(&NodeChange::Position {
        id: a,
        position: Point::new(50.0, 0.0)
    }));
    assert!(changes.iter().all(|c| c.id() == a));
    let b = nodes.iter().find(|n| n.id == NodeId::intern("b")).unwrap();
    assert_eq!(b.position, Point::new(200.0, 0.0));
    assert_eq!(position_of(&engine, "a"), Some(Point::new(50.0, 0.0)));
}

#[test]
fn coalescing_never_changes_final_position() {
    for steps in [1usize, 2, 7, 30] {
        let mut engine = two_nodes();
        engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            engine.pointer_move(Point::new(10.0 + 73.0 * t, 10.0 - 21.0 * t));
            // Only every third move gets a frame.
            if i % 3 == 0 {
                engine.frame();
            }
        }
        engine.pointer_up(Point::new(83.0, -11.0));
        let got = position_of(&engine, "a").unwrap();
        assert!(
            got.approx_eq(Point::new(73.0, -21.0), 1e-3),
            "{steps} steps: {got:?}"
        );
        assert_eq!(engine.host().node_calls.len(), 1);
    }
}

#[test]
fn drag_at_zoom_uses_world_delta() {
    let mut engine = two_nodes();
    engine.set_viewport(wfc_core::Viewport::new(Point::new(100.0, 50.0), 2.0));
    // a spans screen (100,50)-(300,130) at zoom 2.
    engine.pointer_down(Point::new(120.0, 60.0), Modifiers::NONE);
    engine.pointer_move(Point::new(220.0, 60.0));
    engine.pointer_up(Point::new(220.0, 60.0));
    assert_eq!(position_of(&engine, "a"), Some(Point::new(50.0, 0.0)));
}

#[test]
fn click_without_move_only_selects() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    let calls = &engine.host().node_calls;
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        vec![NodeChange::Select {
            id: NodeId::intern("a"),
            selected: true
        }]
    );
}

#[test]
fn clicking_selected_node_notifies_nothing() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    assert_eq!(engine.host().node_calls.len(), 1);

    engine.pointer_down(Point::new(12.0, 12.0), Modifiers::NONE);
    engine.pointer_up(Point::new(12.0, 12.0));
    assert_eq!(engine.host().node_calls.len(), 1);
    assert_eq!(position_of(&engine, "a"), Some(Point::new(0.0, 0.0)));
}

#[test]
fn selected_node_owns_the_overlap() {
    let mut engine = two_nodes();
    engine
        .set_nodes(vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 100.0),
            Node::new("b", Point::new(50.0, 50.0)).with_size(100.0, 100.0),
        ])
        .unwrap();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    // The overlap now belongs to a.
    engine.pointer_down(Point::new(75.0, 75.0), Modifiers::NONE);
    engine.pointer_move(Point::new(85.0, 75.0));
    engine.pointer_up(Point::new(85.0, 75.0));
    assert_eq!(position_of(&engine, "a"), Some(Point::new(10.0, 0.0)));
    assert_eq!(position_of(&engine, "b"), Some(Point::new(50.0, 50.0)));
}

#[test]
fn cancel_restores_everything() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_move(Point::new(90.0, 10.0));
    engine.frame();
    assert_eq!(position_of(&engine, "a"), Some(Point::new(80.0, 0.0)));

    engine.cancel();
    assert!(engine.state().is_idle());
    assert_eq!(position_of(&engine, "a"), Some(Point::new(0.0, 0.0)));
    let a = engine.scene().node(NodeId::intern("a")).unwrap();
    assert!(!a.selected);
    assert_eq!(a.z_index, 0);
    assert!(engine.host().node_calls.is_empty());

    // A late pointer-up after the cancel is a no-op.
    engine.pointer_up(Point::new(90.0, 10.0));
    assert!(engine.host().node_calls.is_empty());
}

#[test]
fn escape_cancels_drag() {
    let mut engine = two_nodes();
    engine.handle(&InputEvent::PointerDown {
        x: 10.0,
        y: 10.0,
        modifiers: Modifiers::NONE,
    });
    engine.handle(&InputEvent::PointerMove {
        x: 40.0,
        y: 40.0,
        modifiers: Modifiers::NONE,
    });
    assert!(engine.handle(&InputEvent::Key {
        key: "Escape".into(),
        modifiers: Modifiers::NONE,
    }));
    assert!(engine.state().is_idle());
    assert_eq!(position_of(&engine, "a"), Some(Point::new(0.0, 0.0)));
}

// ─── Connections ────────────────────────────────────────────────────────

fn draw_connection(engine: &mut CanvasEngine<Recorder>, end: Point) {
    // a.source sits at (50,40).
    engine.pointer_down(Point::new(50.0, 41.0), Modifiers::NONE);
    assert_eq!(engine.state().name(), "drawing-connection");
    engine.pointer_move(end);
    engine.frame();
    engine.pointer_up(end);
}

#[test]
fn connection_commits_edge() {
    let mut engine = two_nodes_with_handles();
    draw_connection(&mut engine, Point::new(251.0, 2.0));

    let host = engine.host();
    assert_eq!(host.connects.len(), 1);
    let c = host.connects[0];
    assert_eq!(c.source, NodeId::intern("a"));
    assert_eq!(c.target, NodeId::intern("b"));
    assert_eq!(c.source_handle, Some(HandleId::intern("source")));
    assert_eq!(c.target_handle, Some(HandleId::intern("target")));

    assert_eq!(host.edge_calls.len(), 1);
    assert!(matches!(host.edge_calls[0].0[0], EdgeChange::Add { .. }));
    assert_eq!(engine.scene().edges().len(), 1);
}

#[test]
fn rejected_connection_changes_nothing() {
    let mut engine = two_nodes_with_handles();
    engine.host_mut().reject_connections = true;
    draw_connection(&mut engine, Point::new(251.0, 2.0));

    let host = engine.host();
    assert!(host.connects.is_empty());
    assert!(host.edge_calls.is_empty());
    assert!(engine.scene().edges().is_empty());
    assert!(engine.state().is_idle());
}

#[test]
fn connection_over_empty_space_changes_nothing() {
    let mut engine = two_nodes_with_handles();
    draw_connection(&mut engine, Point::new(500.0, 500.0));
    assert!(engine.host().connects.is_empty());
    assert!(engine.host().edge_calls.is_empty());
    assert!(engine.scene().edges().is_empty());
}

#[test]
fn connection_rubber_band_is_drawn_without_mutation() {
    let mut engine = two_nodes_with_handles();
    engine.pointer_down(Point::new(50.0, 41.0), Modifiers::NONE);
    engine.pointer_move(Point::new(400.0, 300.0));
    engine.frame();
    let frame = engine.render::<()>(&Default::default());
    assert!(frame.rubber_band.is_some());
    assert!(engine.scene().edges().is_empty());
    engine.cancel();
    let frame = engine.render::<()>(&Default::default());
    assert!(frame.rubber_band.is_none());
}

#[test]
fn existing_connection_is_not_duplicated() {
    let mut engine = two_nodes_with_handles();
    draw_connection(&mut engine, Point::new(251.0, 2.0));
    draw_connection(&mut engine, Point::new(251.0, 2.0));
    assert_eq!(engine.scene().edges().len(), 1);
    assert_eq!(engine.host().connects.len(), 1);
    assert_eq!(engine.host().edge_calls.len(), 1);
}

#[test]
fn connection_needs_opposite_handle_kind() {
    let mut engine = two_nodes_with_handles();
    // b.source sits at (250,40): same kind as the start.
    draw_connection(&mut engine, Point::new(250.0, 40.0));
    assert!(engine.scene().edges().is_empty());
}

#[test]
fn handle_press_drags_when_connections_disabled() {
    let options = CanvasOptions {
        nodes_connectable: false,
        ..CanvasOptions::default()
    };
    let mut engine = CanvasEngine::new(options, Recorder::default());
    engine.set_screen_size(800.0, 600.0);
    engine
        .set_nodes(vec![Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 40.0)])
        .unwrap();
    engine.register_default_handles(NodeId::intern("a"));
    engine.pointer_down(Point::new(50.0, 38.0), Modifiers::NONE);
    assert_eq!(engine.state().name(), "dragging-node");
}

// ─── Pan & zoom ─────────────────────────────────────────────────────────

#[test]
fn pane_drag_pans_in_screen_space() {
    let mut engine = two_nodes();
    engine.set_viewport(wfc_core::Viewport::new(Point::ZERO, 2.0));
    engine.pointer_down(Point::new(500.0, 500.0), Modifiers::NONE);
    engine.pointer_move(Point::new(530.0, 480.0));
    engine.pointer_up(Point::new(530.0, 480.0));
    assert_eq!(engine.viewport().pan, Point::new(30.0, -20.0));
    assert_eq!(engine.viewport().zoom, 2.0);
    assert!(engine.host().node_calls.is_empty());
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut engine = two_nodes();
    engine.set_viewport(wfc_core::Viewport::new(Point::new(-37.0, 12.5), 0.8));
    for (cursor, delta) in [
        (Point::new(300.0, 200.0), -120.0),
        (Point::new(10.0, 590.0), 240.0),
        (Point::new(799.0, 0.0), -33.0),
    ] {
        let before = engine.viewport().screen_to_world(cursor);
        engine.wheel(cursor, delta, Modifiers::NONE);
        let after = engine.viewport().screen_to_world(cursor);
        assert!(before.approx_eq(after, 1e-3), "{before:?} vs {after:?}");
    }
}

#[test]
fn wheel_zoom_is_clamped() {
    let mut engine = two_nodes();
    for _ in 0..20 {
        engine.wheel(Point::new(400.0, 300.0), -500.0, Modifiers::NONE);
    }
    assert_eq!(engine.viewport().zoom, 2.0);
    for _ in 0..40 {
        engine.wheel(Point::new(400.0, 300.0), 500.0, Modifiers::NONE);
    }
    assert_eq!(engine.viewport().zoom, 0.5);
}

#[test]
fn fit_view_fills_screen_with_single_node() {
    let mut engine = CanvasEngine::new(CanvasOptions::default(), Recorder::default());
    engine.set_screen_size(100.0, 100.0);
    engine
        .set_nodes(vec![Node::new("n", Point::new(100.0, 100.0)).with_size(50.0, 50.0)])
        .unwrap();
    assert!(engine.fit_view(0.0));
    let vp = engine.viewport();
    assert_eq!(vp.zoom, 2.0);
    let visible = vp.visible_world_rect(Size::new(100.0, 100.0));
    let expected = Rect::new(100.0, 100.0, 50.0, 50.0);
    assert!(visible.origin().approx_eq(expected.origin(), 1e-3));
    assert!(visible.max().approx_eq(expected.max(), 1e-3));
}

#[test]
fn fit_view_respects_zoom_clamp() {
    let mut engine = CanvasEngine::new(CanvasOptions::default(), Recorder::default());
    engine.set_screen_size(800.0, 600.0);
    assert!(!engine.fit_view(0.0), "nothing to fit");
    engine
        .set_nodes(vec![Node::new("n", Point::new(100.0, 100.0)).with_size(50.0, 50.0)])
        .unwrap();
    assert!(engine.fit_view(0.0));
    assert_eq!(engine.viewport().zoom, 2.0);
    let centre = engine.viewport().screen_to_world(Point::new(400.0, 300.0));
    assert!(centre.approx_eq(Point::new(125.0, 125.0), 1e-3));
}

#[test]
fn zoom_shortcuts_anchor_on_centre() {
    let mut engine = two_nodes();
    let centre = Point::new(400.0, 300.0);
    let before = engine.viewport().screen_to_world(centre);
    assert!(engine.key("+", Modifiers::NONE));
    assert!((engine.viewport().zoom - 1.2).abs() < 1e-5);
    assert!(engine.viewport().screen_to_world(centre).approx_eq(before, 1e-3));
    assert!(engine.key("-", Modifiers::NONE));
    assert!((engine.viewport().zoom - 1.0).abs() < 1e-5);
}

// ─── Selection ──────────────────────────────────────────────────────────

#[test]
fn click_replaces_selection_unless_modifier_held() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    engine.pointer_down(Point::new(210.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(210.0, 10.0));
    assert_eq!(engine.scene().selected_nodes(), vec![NodeId::intern("b")]);

    engine.pointer_down(Point::new(10.0, 10.0), SHIFT);
    engine.pointer_up(Point::new(10.0, 10.0));
    assert_eq!(
        engine.scene().selected_nodes(),
        vec![NodeId::intern("a"), NodeId::intern("b")]
    );

    // Modifier click on a selected node deselects it.
    engine.pointer_down(Point::new(210.0, 10.0), SHIFT);
    engine.pointer_up(Point::new(210.0, 10.0));
    assert_eq!(engine.scene().selected_nodes(), vec![NodeId::intern("a")]);
}

#[test]
fn configured_multi_select_key_is_honoured() {
    let options = CanvasOptions::from_json(r#"{"multiSelectKey":"meta"}"#).unwrap();
    let mut engine = CanvasEngine::new(options, Recorder::default());
    engine.set_screen_size(800.0, 600.0);
    engine
        .set_nodes(vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 40.0),
            Node::new("b", Point::new(200.0, 0.0)).with_size(100.0, 40.0),
        ])
        .unwrap();
    let meta = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    engine.pointer_down(Point::new(10.0, 10.0), meta);
    engine.pointer_up(Point::new(10.0, 10.0));
    engine.pointer_down(Point::new(210.0, 10.0), meta);
    engine.pointer_up(Point::new(210.0, 10.0));
    assert_eq!(engine.scene().selected_nodes().len(), 2);
}

#[test]
fn group_drag_moves_all_selected() {
    let mut engine = two_nodes();
    engine.key("a", Modifiers { ctrl: true, ..Modifiers::NONE });
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_move(Point::new(30.0, 20.0));
    engine.pointer_up(Point::new(30.0, 20.0));
    assert_eq!(position_of(&engine, "a"), Some(Point::new(20.0, 10.0)));
    assert_eq!(position_of(&engine, "b"), Some(Point::new(220.0, 10.0)));
}

#[test]
fn box_select_collects_intersecting_nodes() {
    let mut engine = two_nodes();
    engine
        .set_nodes(vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 40.0),
            Node::new("b", Point::new(200.0, 0.0)).with_size(100.0, 40.0),
            Node::new("c", Point::new(0.0, 300.0)).with_size(100.0, 40.0),
        ])
        .unwrap();
    engine.pointer_down(Point::new(50.0, 100.0), SHIFT);
    engine.pointer_move(Point::new(250.0, 20.0));
    engine.frame();
    let frame = engine.render::<()>(&Default::default());
    assert_eq!(frame.selection_box, Some(Rect::new(50.0, 20.0, 200.0, 80.0)));
    engine.pointer_up(Point::new(250.0, 20.0));

    assert_eq!(
        engine.scene().selected_nodes(),
        vec![NodeId::intern("a"), NodeId::intern("b")]
    );
    assert_eq!(engine.host().node_calls.len(), 1);
}

#[test]
fn pane_click_clears_selection() {
    let mut engine = two_nodes();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    engine.pointer_down(Point::new(600.0, 500.0), Modifiers::NONE);
    engine.pointer_up(Point::new(600.0, 500.0));
    assert!(engine.scene().selected_nodes().is_empty());
    assert_eq!(engine.host().node_calls.len(), 2);
}

#[test]
fn edge_click_selects_edge() {
    let mut engine = two_nodes();
    engine
        .set_edges(vec![Edge::new("e", "a", "b")])
        .unwrap();
    // Bezier from (50,40) to (250,0) passes through (150,20).
    engine.pointer_down(Point::new(150.0, 22.0), Modifiers::NONE);
    engine.pointer_up(Point::new(150.0, 22.0));
    assert_eq!(engine.scene().selected_edges(), vec![EdgeId::intern("e")]);
    let calls = &engine.host().edge_calls;
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        vec![EdgeChange::Select {
            id: EdgeId::intern("e"),
            selected: true
        }]
    );
}

// ─── Resize ─────────────────────────────────────────────────────────────

#[test]
fn resize_grip_commits_single_dimensions_change() {
    let mut engine = two_nodes();
    // a's bottom-right corner is (100,40).
    engine.pointer_down(Point::new(101.0, 39.0), Modifiers::NONE);
    assert_eq!(engine.state().name(), "resizing-node");
    engine.pointer_move(Point::new(130.0, 60.0));
    engine.frame();
    engine.pointer_move(Point::new(151.0, 79.0));
    engine.pointer_up(Point::new(151.0, 79.0));

    let calls = &engine.host().node_calls;
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        vec![NodeChange::Dimensions {
            id: NodeId::intern("a"),
            width: 150.0,
            height: 80.0
        }]
    );
}

// ─── Keyboard ───────────────────────────────────────────────────────────

#[test]
fn delete_removes_selection_with_edges() {
    let mut engine = two_nodes();
    engine.set_edges(vec![Edge::new("e", "a", "b")]).unwrap();
    engine.pointer_down(Point::new(10.0, 10.0), Modifiers::NONE);
    engine.pointer_up(Point::new(10.0, 10.0));
    assert!(engine.key("Delete", Modifiers::NONE));

    assert!(engine.scene().node(NodeId::intern("a")).is_none());
    assert!(engine.scene().edges().is_empty());
    let host = engine.host();
    assert_eq!(
        host.node_calls.last().map(|c| c.0.clone()),
        Some(vec![NodeChange::Remove {
            id: NodeId::intern("a")
        }])
    );
    assert_eq!(
        host.edge_calls.last().map(|c| c.0.clone()),
        Some(vec![EdgeChange::Remove {
            id: EdgeId::intern("e")
        }])
    );
}

#[test]
fn unbound_key_is_not_handled() {
    let mut engine = two_nodes();
    assert!(!engine.key("q", Modifiers::NONE));
}
