//! Handle registry: where every connection handle is, and which one is
//! under the pointer.
//!
//! Layouts are registered relative to their node's top-left corner when the
//! node's visual mounts. World positions are derived on demand and cached
//! per frame; each cache entry remembers the node position it was computed
//! from, so a moved node can never serve a stale handle position even if
//! nobody invalidated it.

use smallvec::SmallVec;
use std::collections::HashMap;
use wfc_core::id::{HandleId, NodeId};
use wfc_core::model::{Edge, HandleKind, HandleRef, HandleSide, Node, Point, Size};
use wfc_core::scene::SceneModel;
use wfc_core::viewport::Viewport;

use crate::path::Endpoints;

/// Declared placement of a handle on its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleLayout {
    pub kind: HandleKind,
    pub side: HandleSide,
    /// Offset from the node's top-left corner, world units.
    pub offset: Point,
}

impl HandleLayout {
    /// Handle centred on `side` of a node of `size`.
    pub fn on_side(kind: HandleKind, side: HandleSide, size: Size) -> Self {
        let offset = match side {
            HandleSide::Top => Point::new(size.width / 2.0, 0.0),
            HandleSide::Right => Point::new(size.width, size.height / 2.0),
            HandleSide::Bottom => Point::new(size.width / 2.0, size.height),
            HandleSide::Left => Point::new(0.0, size.height / 2.0),
        };
        Self { kind, side, offset }
    }
}

/// Restricts which handles a hit-test may return.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandleQuery {
    pub kind: Option<HandleKind>,
    /// Never return this handle (the one a connection started from).
    pub exclude: Option<(NodeId, HandleId)>,
}

impl HandleQuery {
    pub fn any() -> Self {
        Self::default()
    }

    /// Handles that can complete a connection started at `from`.
    pub fn compatible_with(from: &HandleRef) -> Self {
        Self {
            kind: Some(from.kind.opposite()),
            exclude: Some((from.node_id, from.handle_id)),
        }
    }

    fn accepts(&self, node: NodeId, handle: HandleId, kind: HandleKind) -> bool {
        self.kind.is_none_or(|k| k == kind) && self.exclude != Some((node, handle))
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedPosition {
    node_position: Point,
    world: Point,
}

#[derive(Debug, Default)]
pub struct HandleRegistry {
    layouts: HashMap<NodeId, SmallVec<[(HandleId, HandleLayout); 4]>>,
    cache: HashMap<(NodeId, HandleId), CachedPosition>,
    frame: u64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a handle. Re-registering the same id replaces its layout.
    pub fn register_handle(
        &mut self,
        node: NodeId,
        handle: HandleId,
        kind: HandleKind,
        side: HandleSide,
        offset: Point,
    ) {
        let layout = HandleLayout { kind, side, offset };
        let entries = self.layouts.entry(node).or_default();
        match entries.iter_mut().find(|(h, _)| *h == handle) {
            Some(entry) => entry.1 = layout,
            None => entries.push((handle, layout)),
        }
        self.cache.remove(&(node, handle));
    }

    /// Register the conventional pair: target on top, source on bottom.
    pub fn register_default_handles(&mut self, node: &Node) {
        for (id, kind, side) in [
            ("target", HandleKind::Target, HandleSide::Top),
            ("source", HandleKind::Source, HandleSide::Bottom),
        ] {
            let layout = HandleLayout::on_side(kind, side, node.size());
            self.register_handle(node.id, HandleId::intern(id), kind, side, layout.offset);
        }
    }

    /// Forget a handle. Unknown handles are ignored.
    pub fn unregister_handle(&mut self, node: NodeId, handle: HandleId) {
        if let Some(entries) = self.layouts.get_mut(&node) {
            entries.retain(|(h, _)| *h != handle);
            if entries.is_empty() {
                self.layouts.remove(&node);
            }
        }
        self.cache.remove(&(node, handle));
    }

    /// Forget every handle of a node (node unmounted or removed).
    pub fn unregister_node(&mut self, node: NodeId) {
        self.layouts.remove(&node);
        self.invalidate_node(node);
    }

    /// Drop cached positions for a node after it moved or resized.
    pub fn invalidate_node(&mut self, node: NodeId) {
        self.cache.retain(|(n, _), _| *n != node);
    }

    /// Start a new render frame: all cached positions are recomputed lazily.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.cache.clear();
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn layout(&self, node: NodeId, handle: HandleId) -> Option<HandleLayout> {
        self.layouts
            .get(&node)?
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, l)| *l)
    }

    pub fn handles_of(&self, node: NodeId) -> impl Iterator<Item = (HandleId, HandleLayout)> + '_ {
        self.layouts.get(&node).into_iter().flatten().copied()
    }

    /// World position of a handle, or `None` if the node or handle is gone.
    pub fn resolve_handle_world_position(
        &mut self,
        scene: &SceneModel,
        node: NodeId,
        handle: HandleId,
    ) -> Option<Point> {
        let node_position = scene.node(node)?.position;
        if let Some(hit) = self.cache.get(&(node, handle))
            && hit.node_position == node_position
        {
            return Some(hit.world);
        }
        let layout = self.layout(node, handle)?;
        let world = node_position + layout.offset;
        self.cache.insert(
            (node, handle),
            CachedPosition {
                node_position,
                world,
            },
        );
        Some(world)
    }

    /// Nearest handle within `tolerance_px` screen pixels of `screen`.
    ///
    /// Handles of higher nodes in paint order win exact ties. Handles whose
    /// node has left the scene are never returned.
    pub fn hit_test_handle(
        &mut self,
        scene: &SceneModel,
        viewport: &Viewport,
        screen: Point,
        tolerance_px: f32,
        query: HandleQuery,
    ) -> Option<HandleRef> {
        let world = viewport.screen_to_world(screen);
        let tolerance = tolerance_px / viewport.zoom;

        let mut best: Option<(f32, HandleRef)> = None;
        for node_id in scene.paint_order().into_iter().rev() {
            let Some(entries) = self.layouts.get(&node_id) else {
                continue;
            };
            let candidates: SmallVec<[(HandleId, HandleKind); 4]> = entries
                .iter()
                .filter(|(h, l)| query.accepts(node_id, *h, l.kind))
                .map(|(h, l)| (*h, l.kind))
                .collect();
            for (handle_id, kind) in candidates {
                let Some(pos) = self.resolve_handle_world_position(scene, node_id, handle_id)
                else {
                    continue;
                };
                let d = pos.distance(world);
                if d > tolerance {
                    continue;
                }
                // Strictly closer only: earlier (topmost) candidates keep ties.
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((
                        d,
                        HandleRef {
                            node_id,
                            handle_id,
                            kind,
                        },
                    ));
                }
            }
        }
        best.map(|(_, h)| h)
    }

    /// First registered handle of `kind` on a node.
    fn first_of_kind(&self, node: NodeId, kind: HandleKind) -> Option<HandleId> {
        self.layouts
            .get(&node)?
            .iter()
            .find(|(_, l)| l.kind == kind)
            .map(|(h, _)| *h)
    }

    /// Resolve both ends of an edge to world points and sides.
    ///
    /// Uses the edge's named handles, then the node's first handle of the
    /// right kind, then the conventional bottom-centre (source) / top-centre
    /// (target) of the node box. `None` if either node is missing.
    pub fn edge_endpoints(&mut self, scene: &SceneModel, edge: &Edge) -> Option<Endpoints> {
        let (source, source_side) =
            self.endpoint(scene, edge.source, edge.source_handle, HandleKind::Source)?;
        let (target, target_side) =
            self.endpoint(scene, edge.target, edge.target_handle, HandleKind::Target)?;
        Some(Endpoints::new(source, source_side, target, target_side))
    }

    fn endpoint(
        &mut self,
        scene: &SceneModel,
        node_id: NodeId,
        handle: Option<HandleId>,
        kind: HandleKind,
    ) -> Option<(Point, HandleSide)> {
        let node = scene.node(node_id)?;
        let handle = handle
            .filter(|h| self.layout(node_id, *h).is_some())
            .or_else(|| self.first_of_kind(node_id, kind));
        if let Some(h) = handle
            && let Some(layout) = self.layout(node_id, h)
            && let Some(world) = self.resolve_handle_world_position(scene, node_id, h)
        {
            return Some((world, layout.side));
        }
        let side = match kind {
            HandleKind::Source => HandleSide::Bottom,
            HandleKind::Target => HandleSide::Top,
        };
        let layout = HandleLayout::on_side(kind, side, node.size());
        Some((node.position + layout.offset, side))
    }
}
