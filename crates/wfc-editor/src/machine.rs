//! Interaction state machine.
//!
//! Each transition is a pure function of the current state, one pointer
//! event and a read-only view of the canvas. It returns the next state and
//! a list of effects; the engine applies the effects, collects the
//! resulting changes, and notifies the host once on `Commit`.
//!
//! | state               | entered by                         | left by            |
//! |---------------------|------------------------------------|--------------------|
//! | `PanningCanvas`     | press on empty pane                | release / cancel   |
//! | `BoxSelecting`      | press on pane with multi-select key | release / cancel  |
//! | `DraggingNode`      | press on a node body               | release / cancel   |
//! | `DrawingConnection` | press on a handle                  | release / cancel   |
//! | `ResizingNode`      | press on a node's resize grip      | release / cancel   |

use smallvec::{SmallVec, smallvec};
use wfc_core::id::{EdgeId, NodeId};
use wfc_core::model::{Connection, HandleRef, HandleSide, Point, Rect, Size};
use wfc_core::options::CanvasOptions;
use wfc_core::scene::SceneModel;
use wfc_core::viewport::Viewport;
use wfc_render::adapter::Transient;
use wfc_render::handles::HandleRegistry;
use wfc_render::hit::{Target, hit_test_rect};

use crate::input::Modifiers;

/// Node positions captured when a drag starts.
pub type Origins = SmallVec<[(NodeId, Point); 4]>;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    PanningCanvas {
        /// Screen point where the press happened.
        start: Point,
        origin_pan: Point,
        moved: bool,
    },
    DraggingNode {
        node: NodeId,
        start_world: Point,
        /// Every node moving with this drag, at its pre-drag position.
        origins: Origins,
    },
    DrawingConnection {
        from: HandleRef,
        from_world: Point,
        from_side: HandleSide,
        /// Current pointer, screen space.
        pointer: Point,
    },
    BoxSelecting {
        start_world: Point,
        current_world: Point,
    },
    ResizingNode {
        node: NodeId,
        start_world: Point,
        origin: Size,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::PanningCanvas { .. } => "panning",
            InteractionState::DraggingNode { .. } => "dragging-node",
            InteractionState::DrawingConnection { .. } => "drawing-connection",
            InteractionState::BoxSelecting { .. } => "box-selecting",
            InteractionState::ResizingNode { .. } => "resizing-node",
        }
    }

    /// Transient geometry the renderer draws for this state.
    pub fn transient(&self, viewport: &Viewport) -> Transient {
        match self {
            InteractionState::DrawingConnection {
                from_world,
                from_side,
                pointer,
                ..
            } => Transient {
                connection: Some((*from_world, *from_side, viewport.screen_to_world(*pointer))),
                selection_box: None,
            },
            InteractionState::BoxSelecting {
                start_world,
                current_world,
            } => Transient {
                connection: None,
                selection_box: Some(Rect::from_corners(*start_world, *current_world)),
            },
            _ => Transient::default(),
        }
    }
}

/// Pointer input after hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        screen: Point,
        target: Target,
        modifiers: Modifiers,
    },
    Move {
        screen: Point,
    },
    /// For a connection gesture `target` is the compatible handle under the
    /// pointer, or `Pane` when there is none.
    Up {
        screen: Point,
        target: Target,
    },
    /// Host-triggered abort (focus lost, Escape, explicit cancel).
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Select exactly these, deselect everything else.
    Replace,
    /// Flip these, leave the rest alone.
    Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Select {
        nodes: SmallVec<[NodeId; 4]>,
        edges: SmallVec<[EdgeId; 4]>,
        mode: SelectMode,
    },
    MoveNodes(Origins),
    Resize {
        node: NodeId,
        width: f32,
        height: f32,
    },
    SetPan(Point),
    Connect(Connection),
    /// Gesture finished: notify the host of everything it changed.
    Commit,
    /// Gesture aborted: undo selection changes, notify nothing.
    Revert,
}

/// Read-only view of the canvas a transition may consult.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub scene: &'a SceneModel,
    pub handles: &'a HandleRegistry,
    pub viewport: Viewport,
    pub options: &'a CanvasOptions,
}

/// Smallest size a resize may produce, world units.
const MIN_NODE_SIZE: f32 = 1.0;

pub fn transition(
    state: &InteractionState,
    event: &PointerEvent,
    ctx: &Context<'_>,
) -> (InteractionState, Vec<Effect>) {
    use InteractionState as S;
    use PointerEvent as E;

    match (state, event) {
        (S::Idle, E::Cancel) => (S::Idle, Vec::new()),
        (_, E::Cancel) => (S::Idle, cancel_effects(state)),

        (
            S::Idle,
            E::Down {
                screen,
                target,
                modifiers,
            },
        ) => pointer_down(*screen, *target, *modifiers, ctx),
        (S::Idle, _) => (S::Idle, Vec::new()),

        // A second press mid-gesture (another button, another finger) is ignored.
        (_, E::Down { .. }) => (state.clone(), Vec::new()),

        (
            S::PanningCanvas {
                start,
                origin_pan,
                moved,
            },
            E::Move { screen },
        ) => {
            let delta = *screen - *start;
            let next = S::PanningCanvas {
                start: *start,
                origin_pan: *origin_pan,
                moved: *moved || delta != Point::ZERO,
            };
            (next, vec![Effect::SetPan(*origin_pan + delta)])
        }
        (
            S::PanningCanvas {
                start,
                origin_pan,
                moved,
            },
            E::Up { screen, .. },
        ) => {
            let delta = *screen - *start;
            let mut effects = vec![Effect::SetPan(*origin_pan + delta)];
            // A click on the empty pane clears the selection.
            if !*moved && delta == Point::ZERO && ctx.options.elements_selectable {
                effects.push(Effect::Select {
                    nodes: SmallVec::new(),
                    edges: SmallVec::new(),
                    mode: SelectMode::Replace,
                });
            }
            effects.push(Effect::Commit);
            (S::Idle, effects)
        }

        (
            S::DraggingNode {
                node,
                start_world,
                origins,
            },
            E::Move { screen },
        ) => {
            let next = S::DraggingNode {
                node: *node,
                start_world: *start_world,
                origins: origins.clone(),
            };
            let effects = drag_to(*start_world, origins, *screen, ctx)
                .into_iter()
                .collect();
            (next, effects)
        }
        (
            S::DraggingNode {
                start_world,
                origins,
                ..
            },
            E::Up { screen, .. },
        ) => {
            let mut effects: Vec<Effect> = drag_to(*start_world, origins, *screen, ctx)
                .into_iter()
                .collect();
            effects.push(Effect::Commit);
            (S::Idle, effects)
        }

        (
            S::DrawingConnection {
                from,
                from_world,
                from_side,
                ..
            },
            E::Move { screen },
        ) => (
            S::DrawingConnection {
                from: *from,
                from_world: *from_world,
                from_side: *from_side,
                pointer: *screen,
            },
            Vec::new(),
        ),
        (S::DrawingConnection { from, .. }, E::Up { target, .. }) => {
            let mut effects = Vec::with_capacity(2);
            match target {
                Target::Handle(to) if to.kind != from.kind => {
                    effects.push(Effect::Connect(Connection::between(*from, *to)));
                }
                _ => log::debug!("connection from {:?} ended without a target", from.node_id),
            }
            effects.push(Effect::Commit);
            (S::Idle, effects)
        }

        (
            S::BoxSelecting { start_world, .. },
            E::Move { screen },
        ) => (
            S::BoxSelecting {
                start_world: *start_world,
                current_world: ctx.viewport.screen_to_world(*screen),
            },
            Vec::new(),
        ),
        (S::BoxSelecting { start_world, .. }, E::Up { screen, .. }) => {
            let rect = Rect::from_corners(*start_world, ctx.viewport.screen_to_world(*screen));
            let nodes = hit_test_rect(ctx.scene, &rect).into_iter().collect();
            let effects = vec![
                Effect::Select {
                    nodes,
                    edges: SmallVec::new(),
                    mode: SelectMode::Replace,
                },
                Effect::Commit,
            ];
            (S::Idle, effects)
        }

        (
            S::ResizingNode {
                node,
                start_world,
                origin,
            },
            E::Move { screen },
        ) => (
            state.clone(),
            vec![resize_to(*node, *start_world, *origin, *screen, ctx)],
        ),
        (
            S::ResizingNode {
                node,
                start_world,
                origin,
            },
            E::Up { screen, .. },
        ) => (
            S::Idle,
            vec![
                resize_to(*node, *start_world, *origin, *screen, ctx),
                Effect::Commit,
            ],
        ),
    }
}

fn pointer_down(
    screen: Point,
    target: Target,
    modifiers: Modifiers,
    ctx: &Context<'_>,
) -> (InteractionState, Vec<Effect>) {
    let world = ctx.viewport.screen_to_world(screen);
    let multi = modifiers.holds(ctx.options.multi_select_key);

    match target {
        Target::Handle(from) if ctx.options.nodes_connectable => {
            match handle_anchor(ctx, &from) {
                Some((from_world, from_side)) => (
                    InteractionState::DrawingConnection {
                        from,
                        from_world,
                        from_side,
                        pointer: screen,
                    },
                    Vec::new(),
                ),
                None => (InteractionState::Idle, Vec::new()),
            }
        }
        Target::Handle(h) => node_down(h.node_id, world, multi, ctx),
        Target::Node(id) => node_down(id, world, multi, ctx),
        Target::ResizeGrip(id) => match ctx.scene.node(id) {
            Some(node) => (
                InteractionState::ResizingNode {
                    node: id,
                    start_world: world,
                    origin: node.size(),
                },
                Vec::new(),
            ),
            None => (InteractionState::Idle, Vec::new()),
        },
        Target::Edge(id) if ctx.options.elements_selectable => {
            let mode = if multi {
                SelectMode::Toggle
            } else {
                SelectMode::Replace
            };
            let effects = vec![
                Effect::Select {
                    nodes: SmallVec::new(),
                    edges: smallvec![id],
                    mode,
                },
                Effect::Commit,
            ];
            (InteractionState::Idle, effects)
        }
        Target::Pane if multi && ctx.options.elements_selectable => (
            InteractionState::BoxSelecting {
                start_world: world,
                current_world: world,
            },
            Vec::new(),
        ),
        // An edge that cannot be selected behaves like the pane.
        Target::Edge(_) | Target::Pane => (
            InteractionState::PanningCanvas {
                start: screen,
                origin_pan: ctx.viewport.pan,
                moved: false,
            },
            Vec::new(),
        ),
    }
}

fn node_down(
    id: NodeId,
    world: Point,
    multi: bool,
    ctx: &Context<'_>,
) -> (InteractionState, Vec<Effect>) {
    let Some(node) = ctx.scene.node(id) else {
        return (InteractionState::Idle, Vec::new());
    };
    let selectable = ctx.options.elements_selectable;

    let mut effects = Vec::with_capacity(1);
    if selectable && (multi || !node.selected) {
        let mode = if multi {
            SelectMode::Toggle
        } else {
            SelectMode::Replace
        };
        effects.push(Effect::Select {
            nodes: smallvec![id],
            edges: SmallVec::new(),
            mode,
        });
    }

    let selected_after = if !selectable {
        node.selected
    } else if multi {
        !node.selected
    } else {
        true
    };
    // Grabbing a node that is (or joins) a multi-selection drags the group.
    let group = selectable && selected_after && (node.selected || multi);

    let origins: Origins = if !ctx.options.nodes_draggable {
        SmallVec::new()
    } else if group {
        ctx.scene
            .nodes()
            .filter(|n| (n.selected || n.id == id) && n.draggable)
            .map(|n| (n.id, n.position))
            .collect()
    } else if node.draggable {
        smallvec![(id, node.position)]
    } else {
        SmallVec::new()
    };

    (
        InteractionState::DraggingNode {
            node: id,
            start_world: world,
            origins,
        },
        effects,
    )
}

/// World position and side of a handle, from its layout and node.
fn handle_anchor(ctx: &Context<'_>, handle: &HandleRef) -> Option<(Point, HandleSide)> {
    let node = ctx.scene.node(handle.node_id)?;
    let layout = ctx.handles.layout(handle.node_id, handle.handle_id)?;
    Some((node.position + layout.offset, layout.side))
}

/// Positions for a drag whose pointer is now at `screen`, or `None` when
/// nothing moves.
fn drag_to(start_world: Point, origins: &Origins, screen: Point, ctx: &Context<'_>) -> Option<Effect> {
    if origins.is_empty() {
        return None;
    }
    let delta = ctx.viewport.screen_to_world(screen) - start_world;
    let moved = origins.iter().map(|(id, p)| (*id, *p + delta)).collect();
    Some(Effect::MoveNodes(moved))
}

fn resize_to(node: NodeId, start_world: Point, origin: Size, screen: Point, ctx: &Context<'_>) -> Effect {
    let delta = ctx.viewport.screen_to_world(screen) - start_world;
    Effect::Resize {
        node,
        width: (origin.width + delta.x).max(MIN_NODE_SIZE),
        height: (origin.height + delta.y).max(MIN_NODE_SIZE),
    }
}

fn cancel_effects(state: &InteractionState) -> Vec<Effect> {
    match state {
        InteractionState::Idle => Vec::new(),
        InteractionState::PanningCanvas { origin_pan, .. } => {
            vec![Effect::SetPan(*origin_pan), Effect::Revert]
        }
        InteractionState::DraggingNode { origins, .. } if !origins.is_empty() => {
            vec![Effect::MoveNodes(origins.clone()), Effect::Revert]
        }
        InteractionState::ResizingNode { node, origin, .. } => vec![
            Effect::Resize {
                node: *node,
                width: origin.width,
                height: origin.height,
            },
            Effect::Revert,
        ],
        _ => vec![Effect::Revert],
    }
}
