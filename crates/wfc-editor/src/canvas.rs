//! The canvas engine: one owned store per canvas instance.
//!
//! The engine holds the scene, the viewport, the handle registry, the edge
//! router registry and the interaction state. Pointer, wheel and key input
//! go in; host callbacks come out, once per committed gesture.
//!
//! - **Host → canvas**: `set_nodes` / `set_edges` replace the scene with the
//!   host's arrays (controlled mode). While a gesture is in progress the
//!   update is parked and applied when the gesture commits or cancels, so
//!   the host never fights a drag.
//! - **Canvas → host**: every gesture's selection, position, dimension and
//!   edge changes are collected and delivered through [`CanvasHost`] on
//!   pointer-up. A cancelled gesture delivers nothing and leaves the scene
//!   as it found it.

use smallvec::SmallVec;
use std::collections::HashSet;
use wfc_core::changes::{EdgeChange, NodeChange};
use wfc_core::diagnostics::{Diagnostic, SceneError};
use wfc_core::id::{EdgeId, HandleId, NodeId};
use wfc_core::model::{Connection, Edge, HandleKind, HandleSide, Node, Point, Size};
use wfc_core::options::CanvasOptions;
use wfc_core::scene::{RemovedNode, SceneModel};
use wfc_core::viewport::{Viewport, viewport_for_bounds};
use wfc_render::adapter::{NodeTypeRegistry, RenderFrame, build_frame, edge_paths};
use wfc_render::handles::{HandleQuery, HandleRegistry};
use wfc_render::hit::{Target, pick};
use wfc_render::path::EdgeTypeRegistry;

use crate::frame::FrameCoalescer;
use crate::input::{InputEvent, Modifiers, wheel_zoom_factor};
use crate::machine::{Context, Effect, InteractionState, PointerEvent, SelectMode, transition};
use crate::shortcuts::{ShortcutAction, ShortcutMap};

/// Callbacks into the host application. Every method has a no-op default.
pub trait CanvasHost {
    /// Node changes of one committed gesture, plus the full node set after
    /// they were applied.
    fn on_nodes_change(&mut self, _changes: &[NodeChange], _nodes: &[Node]) {}

    /// Edge changes of one committed gesture, plus the full edge set after
    /// they were applied. A new connection arrives here as an `Add`.
    fn on_edges_change(&mut self, _changes: &[EdgeChange], _edges: &[Edge]) {}

    /// A connection was committed. The edge is already part of the
    /// accompanying `on_edges_change` list.
    fn on_connect(&mut self, _connection: &Connection) {}

    /// Veto a connection before it is committed.
    fn is_valid_connection(&mut self, _connection: &Connection) -> bool {
        true
    }

    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

impl CanvasHost for () {}

/// Changes made by the gesture in progress, not yet reported.
#[derive(Debug, Default)]
struct PendingChanges {
    nodes: Vec<NodeChange>,
    edges: Vec<EdgeChange>,
    connection: Option<Connection>,
}

impl PendingChanges {
    /// Record a position or dimension change, replacing an earlier one of
    /// the same kind for the same node.
    fn upsert(&mut self, change: NodeChange) {
        let same = |c: &NodeChange| {
            c.id() == change.id()
                && std::mem::discriminant(c) == std::mem::discriminant(&change)
        };
        match self.nodes.iter_mut().find(|c| same(c)) {
            Some(slot) => *slot = change,
            None => self.nodes.push(change),
        }
    }
}

pub struct CanvasEngine<H: CanvasHost> {
    scene: SceneModel,
    viewport: Viewport,
    screen: Size,
    options: CanvasOptions,
    handles: HandleRegistry,
    edge_types: EdgeTypeRegistry,
    state: InteractionState,
    moves: FrameCoalescer<Point>,
    pending: PendingChanges,
    deferred_nodes: Option<Vec<Node>>,
    deferred_edges: Option<Vec<Edge>>,
    /// The one-time `fit_view` option has been honoured.
    fitted: bool,
    /// Diagnostic messages already delivered from render passes.
    reported: HashSet<String>,
    host: H,
}

impl<H: CanvasHost> CanvasEngine<H> {
    pub fn new(options: CanvasOptions, host: H) -> Self {
        let options = options.validated();
        let screen = Size::new(0.0, options.height);
        Self {
            scene: SceneModel::new(),
            viewport: Viewport::new(Point::ZERO, options.clamp_zoom(1.0)),
            screen,
            options,
            handles: HandleRegistry::new(),
            edge_types: EdgeTypeRegistry::new(),
            state: InteractionState::Idle,
            moves: FrameCoalescer::new(),
            pending: PendingChanges::default(),
            deferred_nodes: None,
            deferred_edges: None,
            fitted: false,
            reported: HashSet::new(),
            host,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn screen_size(&self) -> Size {
        self.screen
    }

    pub fn options(&self) -> &CanvasOptions {
        &self.options
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn edge_types_mut(&mut self) -> &mut EdgeTypeRegistry {
        &mut self.edge_types
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn set_options(&mut self, options: CanvasOptions) {
        self.options = options.validated();
        self.viewport = self.viewport.constrained(self.screen, &self.options);
    }

    /// Size of the canvas element in screen pixels.
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen = Size::new(width.max(0.0), height.max(0.0));
        self.viewport = self.viewport.constrained(self.screen, &self.options);
        self.fit_on_load();
    }

    // ─── Host → canvas ───────────────────────────────────────────────────

    /// Replace the node set with the host's array.
    ///
    /// Mid-gesture the update is parked and `Ok` is returned; errors from
    /// the parked update are reported through `on_diagnostic` later.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Result<(), SceneError> {
        if !self.state.is_idle() {
            log::debug!("deferring node update until {} ends", self.state.name());
            self.deferred_nodes = Some(nodes);
            return Ok(());
        }
        match self.scene.apply_external_nodes(nodes) {
            Ok(report) => {
                for id in &report.removed {
                    self.handles.unregister_node(*id);
                }
                for &(id, old) in &report.resized {
                    if let Some(new) = self.scene.node(id).map(Node::size) {
                        self.rescale_handles(id, old, new);
                    }
                }
                for id in &report.moved {
                    self.handles.invalidate_node(*id);
                }
                self.report(&report.diagnostics);
                self.fit_on_load();
                Ok(())
            }
            Err(err) => {
                self.host.on_diagnostic(&Diagnostic::from_error(&err));
                Err(err)
            }
        }
    }

    /// Replace the edge set with the host's array. Dangling edges are
    /// dropped and reported; duplicates reject the update.
    pub fn set_edges(&mut self, edges: Vec<Edge>) -> Result<(), SceneError> {
        if !self.state.is_idle() {
            log::debug!("deferring edge update until {} ends", self.state.name());
            self.deferred_edges = Some(edges);
            return Ok(());
        }
        match self.scene.apply_external_edges(edges) {
            Ok(diagnostics) => {
                self.report(&diagnostics);
                Ok(())
            }
            Err(err) => {
                self.host.on_diagnostic(&Diagnostic::from_error(&err));
                Err(err)
            }
        }
    }

    fn apply_deferred(&mut self) {
        // Errors were already delivered as diagnostics.
        if let Some(nodes) = self.deferred_nodes.take() {
            let _ = self.set_nodes(nodes);
        }
        if let Some(edges) = self.deferred_edges.take() {
            let _ = self.set_edges(edges);
        }
    }

    fn report(&mut self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            self.host.on_diagnostic(d);
        }
    }

    // ─── Handles ─────────────────────────────────────────────────────────

    pub fn register_handle(
        &mut self,
        node: NodeId,
        handle: HandleId,
        kind: HandleKind,
        side: HandleSide,
        offset: Point,
    ) {
        self.handles.register_handle(node, handle, kind, side, offset);
    }

    /// Register the conventional target-top / source-bottom pair for a node.
    pub fn register_default_handles(&mut self, node: NodeId) -> bool {
        match self.scene.node(node) {
            Some(n) => {
                self.handles.register_default_handles(n);
                true
            }
            None => false,
        }
    }

    pub fn unregister_handle(&mut self, node: NodeId, handle: HandleId) {
        self.handles.unregister_handle(node, handle);
    }

    pub fn unregister_node_handles(&mut self, node: NodeId) {
        self.handles.unregister_node(node);
    }

    /// Keep handle offsets proportional when a node changes size.
    fn rescale_handles(&mut self, node: NodeId, old: Size, new: Size) {
        if old.width <= 0.0 || old.height <= 0.0 {
            return;
        }
        let sx = new.width / old.width;
        let sy = new.height / old.height;
        let layouts: SmallVec<[_; 4]> = self.handles.handles_of(node).collect();
        for (handle, layout) in layouts {
            let offset = Point::new(layout.offset.x * sx, layout.offset.y * sy);
            self.handles
                .register_handle(node, handle, layout.kind, layout.side, offset);
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Dispatch a normalized input event. Returns false for unbound keys.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(Point::new(*x, *y), *modifiers);
            }
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(Point::new(*x, *y)),
            InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers,
            } => self.wheel(Point::new(*x, *y), *delta_y, *modifiers),
            InputEvent::Key { key, modifiers } => return self.key(key, *modifiers),
        }
        true
    }

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        self.flush_move();
        let paths = edge_paths(&self.scene, &mut self.handles, &self.edge_types);
        let target = pick(
            &self.scene,
            &mut self.handles,
            &paths,
            &self.viewport,
            screen,
            &self.options,
        );
        log::trace!("pointer down at {screen:?} on {target:?}");
        self.step(PointerEvent::Down {
            screen,
            target,
            modifiers,
        });
    }

    /// Queue a move; it is processed on the next [`frame`](Self::frame).
    pub fn pointer_move(&mut self, screen: Point) {
        if self.state.is_idle() {
            return;
        }
        self.moves.push(screen);
    }

    pub fn pointer_up(&mut self, screen: Point) {
        self.flush_move();
        let target = match &self.state {
            InteractionState::DrawingConnection { from, .. } => self
                .handles
                .hit_test_handle(
                    &self.scene,
                    &self.viewport,
                    screen,
                    self.options.handle_tolerance,
                    HandleQuery::compatible_with(from),
                )
                .map_or(Target::Pane, Target::Handle),
            _ => Target::Pane,
        };
        self.step(PointerEvent::Up { screen, target });
    }

    /// Called once per animation frame by the host.
    pub fn frame(&mut self) {
        self.flush_move();
        self.handles.begin_frame();
        log::trace!(
            "frame {}: {} pointer move(s) coalesced so far",
            self.handles.frame(),
            self.moves.dropped()
        );
    }

    fn flush_move(&mut self) {
        if let Some(screen) = self.moves.take() {
            self.step(PointerEvent::Move { screen });
        }
    }

    /// Abort the gesture in progress. The scene is restored and the host is
    /// not notified.
    pub fn cancel(&mut self) {
        self.moves.clear();
        self.step(PointerEvent::Cancel);
    }

    pub fn wheel(&mut self, screen: Point, delta_y: f32, modifiers: Modifiers) {
        // Gestures anchored to a screen-space origin would jump under a zoom.
        if matches!(
            self.state,
            InteractionState::PanningCanvas { .. }
                | InteractionState::DraggingNode { .. }
                | InteractionState::ResizingNode { .. }
        ) {
            return;
        }
        let factor = wheel_zoom_factor(delta_y, modifiers);
        self.zoom_at(screen, self.viewport.zoom * factor);
    }

    /// Run a keyboard shortcut. Returns false when the key is unbound.
    pub fn key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) =
            ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta)
        else {
            return false;
        };
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Cancel => self.cancel(),
            ShortcutAction::DeleteSelection => {
                if self.state.is_idle() {
                    self.delete_selection();
                }
            }
            ShortcutAction::SelectAll => {
                if self.state.is_idle() {
                    self.select_all();
                }
            }
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::FitView => {
                self.fit_view(self.options.fit_view_padding);
            }
        }
        true
    }

    fn step(&mut self, event: PointerEvent) {
        let ctx = Context {
            scene: &self.scene,
            handles: &self.handles,
            viewport: self.viewport,
            options: &self.options,
        };
        let (next, effects) = transition(&self.state, &event, &ctx);
        if next.name() != self.state.name() {
            log::debug!("interaction: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Select { nodes, edges, mode } => {
                let (node_changes, edge_changes) = match mode {
                    SelectMode::Replace => self.scene.select_only(&nodes, &edges),
                    SelectMode::Toggle => self.scene.extend_selection(&nodes, &edges, true),
                };
                self.pending.nodes.extend(node_changes);
                self.pending.edges.extend(edge_changes);
            }
            Effect::MoveNodes(moves) => {
                for (id, position) in moves {
                    if self.scene.set_position(id, position) {
                        self.handles.invalidate_node(id);
                        self.pending.upsert(NodeChange::Position { id, position });
                    }
                }
            }
            Effect::Resize {
                node,
                width,
                height,
            } => {
                if let Some(old) = self.scene.node(node).map(Node::size)
                    && self.scene.set_dimensions(node, width, height)
                {
                    self.rescale_handles(node, old, Size::new(width, height));
                    self.handles.invalidate_node(node);
                    self.pending.upsert(NodeChange::Dimensions {
                        id: node,
                        width,
                        height,
                    });
                }
            }
            Effect::SetPan(pan) => {
                self.viewport =
                    Viewport::new(pan, self.viewport.zoom).constrained(self.screen, &self.options);
            }
            Effect::Connect(connection) => self.connect(connection),
            Effect::Commit => self.commit(),
            Effect::Revert => self.revert(),
        }
    }

    fn connect(&mut self, connection: Connection) {
        if self.scene.edges().iter().any(|e| connection.matches(e)) {
            log::debug!("connection {connection:?} already exists");
            return;
        }
        if !self.host.is_valid_connection(&connection) {
            log::debug!("connection {connection:?} rejected by host");
            return;
        }
        if let Some(edge) = self.scene.connect(&connection) {
            log::debug!("connected `{}` -> `{}` as `{}`", edge.source, edge.target, edge.id);
            self.pending.edges.push(EdgeChange::Add { edge });
            self.pending.connection = Some(connection);
        }
    }

    fn commit(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if !pending.nodes.is_empty() {
            log::debug!("committing {} node change(s)", pending.nodes.len());
            let nodes = self.scene.node_vec();
            self.host.on_nodes_change(&pending.nodes, &nodes);
        }
        if !pending.edges.is_empty() {
            log::debug!("committing {} edge change(s)", pending.edges.len());
            self.host.on_edges_change(&pending.edges, self.scene.edges());
        }
        if let Some(connection) = pending.connection {
            self.host.on_connect(&connection);
        }
        self.apply_deferred();
    }

    fn revert(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for change in pending.nodes.iter().rev() {
            if let NodeChange::Select { id, .. } = change {
                self.scene.extend_selection(&[*id], &[], true);
            }
        }
        for change in pending.edges.iter().rev() {
            if let EdgeChange::Select { id, .. } = change {
                self.scene.extend_selection(&[], &[*id], true);
            }
        }
        log::debug!("gesture cancelled");
        self.apply_deferred();
    }

    // ─── Programmatic operations ─────────────────────────────────────────

    /// Remove a node and its edges, notifying the host.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, SceneError> {
        let removed = self.scene.remove_node(id)?;
        self.handles.unregister_node(id);
        let node_changes = [NodeChange::Remove { id }];
        let edge_changes: Vec<EdgeChange> = removed
            .edges
            .iter()
            .map(|e| EdgeChange::Remove { id: e.id })
            .collect();
        self.notify(&node_changes, &edge_changes);
        Ok(removed)
    }

    /// Remove the selected edges, then the selected nodes with their edges.
    pub fn delete_selection(&mut self) {
        let edge_ids: Vec<EdgeId> = self.scene.selected_edges();
        let node_ids: Vec<NodeId> = self.scene.selected_nodes();
        if edge_ids.is_empty() && node_ids.is_empty() {
            return;
        }

        let mut edge_changes = Vec::with_capacity(edge_ids.len());
        for id in edge_ids {
            if self.scene.remove_edge(id).is_ok() {
                edge_changes.push(EdgeChange::Remove { id });
            }
        }
        let mut node_changes = Vec::with_capacity(node_ids.len());
        for id in node_ids {
            match self.scene.remove_node(id) {
                Ok(removed) => {
                    self.handles.unregister_node(id);
                    node_changes.push(NodeChange::Remove { id });
                    edge_changes.extend(removed.edges.iter().map(|e| EdgeChange::Remove { id: e.id }));
                }
                Err(err) => log::warn!("delete: {err}"),
            }
        }
        self.notify(&node_changes, &edge_changes);
    }

    pub fn select_all(&mut self) {
        if !self.options.elements_selectable {
            return;
        }
        let all: Vec<NodeId> = self.scene.nodes().map(|n| n.id).collect();
        let (node_changes, edge_changes) = self.scene.select_only(&all, &[]);
        self.notify(&node_changes, &edge_changes);
    }

    fn notify(&mut self, node_changes: &[NodeChange], edge_changes: &[EdgeChange]) {
        if !node_changes.is_empty() {
            let nodes = self.scene.node_vec();
            self.host.on_nodes_change(node_changes, &nodes);
        }
        if !edge_changes.is_empty() {
            self.host.on_edges_change(edge_changes, self.scene.edges());
        }
    }

    /// The renderer measured a node. Returns false for unknown nodes or
    /// unchanged sizes.
    pub fn set_node_dimensions(&mut self, id: NodeId, width: f32, height: f32) -> bool {
        let Some(old) = self.scene.node(id).map(Node::size) else {
            return false;
        };
        if old.width == width && old.height == height {
            return false;
        }
        self.scene.set_dimensions(id, width, height);
        self.rescale_handles(id, old, Size::new(width, height));
        self.handles.invalidate_node(id);

        let change = NodeChange::Dimensions { id, width, height };
        if self.state.is_idle() {
            self.notify(&[change], &[]);
        } else {
            self.pending.upsert(change);
        }
        self.fit_on_load();
        true
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Fit all nodes into the screen. Returns false when there is nothing
    /// to fit or the screen has no size yet.
    pub fn fit_view(&mut self, padding: f32) -> bool {
        let Some(bounds) = self.scene.nodes_bounds() else {
            return false;
        };
        if self.screen.width <= 0.0 || self.screen.height <= 0.0 {
            return false;
        }
        self.viewport = viewport_for_bounds(&bounds, self.screen, padding, &self.options)
            .constrained(self.screen, &self.options);
        log::debug!("fit view to {bounds:?}: {:?}", self.viewport);
        true
    }

    /// Honour the `fit_view` option once nodes with a measured size exist.
    fn fit_on_load(&mut self) {
        if !self.options.fit_view || self.fitted {
            return;
        }
        let measured = self
            .scene
            .nodes_bounds()
            .is_some_and(|b| b.width > 0.0 && b.height > 0.0);
        if measured {
            self.fitted = self.fit_view(self.options.fit_view_padding);
        }
    }

    /// Zoom to `zoom` (clamped) keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, zoom: f32) {
        self.viewport = self
            .viewport
            .zoomed_at(anchor, zoom, &self.options)
            .constrained(self.screen, &self.options);
    }

    fn screen_center(&self) -> Point {
        Point::new(self.screen.width / 2.0, self.screen.height / 2.0)
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.screen_center(), self.viewport.zoom * self.options.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.screen_center(), self.viewport.zoom / self.options.zoom_step);
    }

    /// Non-finite requests are dropped and the current viewport kept.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !viewport.is_finite() {
            log::warn!("ignoring non-finite viewport {viewport:?}");
            return;
        }
        self.viewport = viewport.constrained(self.screen, &self.options);
    }

    /// Centre the screen on a world point, keeping the zoom.
    pub fn center_on(&mut self, world: Point) {
        self.viewport = self
            .viewport
            .centered_on(world, self.screen)
            .constrained(self.screen, &self.options);
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Build the frame to draw. Missing-renderer diagnostics are delivered
    /// to the host once per distinct message.
    pub fn render<T>(&mut self, node_types: &NodeTypeRegistry<T>) -> RenderFrame<T> {
        let transient = self.state.transient(&self.viewport);
        let frame = build_frame(
            &self.scene,
            &self.viewport,
            self.screen,
            &mut self.handles,
            node_types,
            &self.edge_types,
            &transient,
            &self.options,
        );
        for d in &frame.diagnostics {
            if self.reported.insert(d.message.clone()) {
                self.host.on_diagnostic(d);
            }
        }
        frame
    }
}
