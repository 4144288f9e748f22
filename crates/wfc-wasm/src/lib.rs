//! WASM bridge: exposes the canvas engine to a JavaScript host.
//!
//! Compiled via `wasm-pack build --target web`. Nodes, edges and options
//! cross the boundary as JSON strings; pointer, wheel and key input as
//! scalars. Host notifications are queued and drained with `take_events()`.

mod host;
pub mod render2d;

use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt::Display;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;
use wfc_core::id::{HandleId, NodeId};
use wfc_core::model::{Edge, HandleKind, HandleSide, Node, Point};
use wfc_core::options::CanvasOptions;
use wfc_core::viewport::Viewport;
use wfc_editor::{CanvasEngine, Modifiers};
use wfc_render::adapter::{NodeTypeRegistry, RenderFrame, Rendered};
use wfc_render::path::{EdgePath, EdgeRenderProps, Routing, compute_edge_path};

pub use host::EventQueue;

/// Node types the host draws without registering them.
const BUILTIN_NODE_TYPES: [&str; 3] = ["default", "input", "output"];

/// One canvas instance, owned by the JS side.
#[wasm_bindgen]
pub struct WorkflowCanvas {
    engine: CanvasEngine<EventQueue>,
    /// Node bodies are DOM elements; the registry only records which types
    /// the host can draw.
    node_types: NodeTypeRegistry<()>,
    dark_mode: bool,
}

#[wasm_bindgen]
impl WorkflowCanvas {
    /// Create a canvas from the host's options object (JSON, camelCase).
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: &str) -> Result<WorkflowCanvas, JsValue> {
        console_error_panic_hook_setup();
        Self::from_options(options_json).map_err(js_err)
    }

    pub fn set_options(&mut self, options_json: &str) -> Result<(), JsValue> {
        let options = CanvasOptions::from_json(options_json).map_err(js_err)?;
        self.engine.set_options(options);
        Ok(())
    }

    /// Size of the canvas element in CSS pixels.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.engine.set_screen_size(width, height);
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    // ─── Controlled data ─────────────────────────────────────────────────

    /// Replace the node array. Rejected updates also queue a diagnostic.
    pub fn set_nodes(&mut self, nodes_json: &str) -> Result<(), JsValue> {
        self.load_nodes(nodes_json).map_err(js_err)
    }

    pub fn set_edges(&mut self, edges_json: &str) -> Result<(), JsValue> {
        self.load_edges(edges_json).map_err(js_err)
    }

    /// Report a node's measured size from the DOM.
    pub fn set_node_dimensions(&mut self, id: &str, width: f32, height: f32) -> bool {
        self.engine
            .set_node_dimensions(NodeId::intern(id), width, height)
    }

    pub fn remove_node(&mut self, id: &str) -> Result<(), JsValue> {
        self.engine
            .remove_node(NodeId::intern(id))
            .map(|_| ())
            .map_err(js_err)
    }

    pub fn delete_selection(&mut self) {
        self.engine.delete_selection();
    }

    pub fn select_all(&mut self) {
        self.engine.select_all();
    }

    // ─── Handles ─────────────────────────────────────────────────────────

    pub fn register_default_handles(&mut self, node: &str) -> bool {
        self.engine.register_default_handles(NodeId::intern(node))
    }

    /// Register a handle at an offset from the node's top-left corner.
    /// `kind` is `"source"` or `"target"`, `side` one of
    /// `"top" | "right" | "bottom" | "left"`.
    pub fn register_handle(
        &mut self,
        node: &str,
        handle: &str,
        kind: &str,
        side: &str,
        offset_x: f32,
        offset_y: f32,
    ) -> Result<(), JsValue> {
        let (kind, side) = parse_handle(kind, side).map_err(js_err)?;
        self.engine.register_handle(
            NodeId::intern(node),
            HandleId::intern(handle),
            kind,
            side,
            Point::new(offset_x, offset_y),
        );
        Ok(())
    }

    pub fn unregister_handle(&mut self, node: &str, handle: &str) {
        self.engine
            .unregister_handle(NodeId::intern(node), HandleId::intern(handle));
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool) {
        self.engine
            .pointer_down(Point::new(x, y), Modifiers::new(shift, ctrl, alt, meta));
    }

    /// Buffered until the next `frame()`.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.engine.pointer_move(Point::new(x, y));
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.engine.pointer_up(Point::new(x, y));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn wheel(
        &mut self,
        x: f32,
        y: f32,
        delta_y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) {
        self.engine.wheel(
            Point::new(x, y),
            delta_y,
            Modifiers::new(shift, ctrl, alt, meta),
        );
    }

    /// Returns false when the key is not a canvas shortcut, so the host can
    /// let the browser handle it.
    pub fn key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.engine.key(key, Modifiers::new(shift, ctrl, alt, meta))
    }

    /// Call once per animation frame.
    pub fn frame(&mut self) {
        self.engine.frame();
    }

    pub fn cancel(&mut self) {
        self.engine.cancel();
    }

    /// Current interaction state, e.g. `"idle"` or `"dragging-node"`.
    pub fn state_name(&self) -> String {
        self.engine.state().name().to_string()
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn fit_view(&mut self, padding: f32) -> bool {
        self.engine.fit_view(padding)
    }

    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, zoom: f32) {
        self.engine.set_viewport(Viewport::new(Point::new(x, y), zoom));
    }

    pub fn center_on(&mut self, x: f32, y: f32) {
        self.engine.center_on(Point::new(x, y));
    }

    /// `{"x":…,"y":…,"zoom":…}`
    pub fn get_viewport(&self) -> String {
        let vp = self.engine.viewport();
        json!({ "x": vp.pan.x, "y": vp.pan.y, "zoom": vp.zoom }).to_string()
    }

    // ─── Host callbacks ──────────────────────────────────────────────────

    /// Drain queued notifications as a JSON array of
    /// `nodesChange` / `edgesChange` / `connect` / `diagnostic` events.
    pub fn take_events(&mut self) -> String {
        self.engine.host_mut().take_json()
    }

    /// `validator(connectionJson) => boolean`; `undefined` removes it.
    pub fn set_connection_validator(&mut self, validator: Option<js_sys::Function>) {
        self.engine.host_mut().set_validator(validator);
    }

    /// Register a JS edge router: `router(propsJson)` returns either SVG
    /// path data or `{"path", "labelX", "labelY"}` as a JSON string.
    pub fn register_edge_type(&mut self, kind: &str, router: js_sys::Function) {
        self.engine
            .edge_types_mut()
            .register(kind, move |props| call_router(&router, props));
    }

    pub fn unregister_edge_type(&mut self, kind: &str) -> bool {
        self.engine.edge_types_mut().unregister(kind)
    }

    /// Declare a node type the host knows how to draw.
    pub fn register_node_type(&mut self, kind: &str) {
        self.node_types.register(kind, |_| ());
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// The frame as JSON, for the host's DOM layer.
    pub fn frame_json(&mut self) -> String {
        let frame = self.engine.render(&self.node_types);
        frame_to_json(&frame).to_string()
    }

    /// Stroke edges, rubber band, selection box and minimap into `ctx`.
    pub fn render_edges(&mut self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let frame = self.engine.render(&self.node_types);
        let theme = if self.dark_mode {
            render2d::OverlayTheme::dark()
        } else {
            render2d::OverlayTheme::light()
        };
        render2d::render_overlay(
            ctx,
            &frame,
            self.engine.screen_size(),
            self.engine.options().minimap_position,
            &theme,
        )
    }
}

impl WorkflowCanvas {
    fn from_options(options_json: &str) -> Result<Self, String> {
        let options = CanvasOptions::from_json(options_json).map_err(|e| e.to_string())?;
        let mut node_types = NodeTypeRegistry::new();
        for kind in BUILTIN_NODE_TYPES {
            node_types.register(kind, |_| ());
        }
        Ok(Self {
            engine: CanvasEngine::new(options, EventQueue::new()),
            node_types,
            dark_mode: false,
        })
    }

    fn load_nodes(&mut self, json: &str) -> Result<(), String> {
        let nodes: Vec<Node> = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.engine.set_nodes(nodes).map_err(|e| e.to_string())
    }

    fn load_edges(&mut self, json: &str) -> Result<(), String> {
        let edges: Vec<Edge> = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.engine.set_edges(edges).map_err(|e| e.to_string())
    }

    pub fn engine(&self) -> &CanvasEngine<EventQueue> {
        &self.engine
    }
}

fn js_err(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_handle(kind: &str, side: &str) -> Result<(HandleKind, HandleSide), String> {
    let kind = serde_json::from_value(Value::String(kind.to_string()))
        .map_err(|_| format!("unknown handle kind `{kind}`"))?;
    let side = serde_json::from_value(Value::String(side.to_string()))
        .map_err(|_| format!("unknown handle side `{side}`"))?;
    Ok((kind, side))
}

fn edge_props_json(props: &EdgeRenderProps<'_>) -> Value {
    json!({
        "id": props.id,
        "sourceX": props.source_x,
        "sourceY": props.source_y,
        "targetX": props.target_x,
        "targetY": props.target_y,
        "sourcePosition": props.source_side,
        "targetPosition": props.target_side,
        "data": props.data,
        "selected": props.selected,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouterOutput {
    path: String,
    label_x: Option<f32>,
    label_y: Option<f32>,
}

/// Interpret a JS router's return value. A bare string is path data with
/// the label at the endpoint midpoint.
fn parse_router_output(raw: &str, props: &EdgeRenderProps<'_>) -> Option<EdgePath> {
    let mid = Point::new(props.source_x, props.source_y)
        .midpoint(Point::new(props.target_x, props.target_y));
    if raw.trim_start().starts_with('{') {
        let out: RouterOutput = serde_json::from_str(raw).ok()?;
        return Some(EdgePath {
            path: out.path,
            label_anchor: Point::new(out.label_x.unwrap_or(mid.x), out.label_y.unwrap_or(mid.y)),
        });
    }
    Some(EdgePath {
        path: raw.to_string(),
        label_anchor: mid,
    })
}

fn call_router(router: &js_sys::Function, props: &EdgeRenderProps<'_>) -> EdgePath {
    let arg = JsValue::from_str(&edge_props_json(props).to_string());
    let raw = router
        .call1(&JsValue::NULL, &arg)
        .ok()
        .and_then(|v| v.as_string());
    match raw.as_deref().and_then(|r| parse_router_output(r, props)) {
        Some(path) => path,
        None => {
            log::warn!("edge {}: router returned no usable path", props.id);
            compute_edge_path(&props.endpoints(), Routing::Straight)
        }
    }
}

fn frame_to_json(frame: &RenderFrame<()>) -> Value {
    let nodes: Vec<Value> = frame
        .nodes
        .iter()
        .map(|n| {
            let mut v = json!({
                "id": n.id,
                "x": n.screen_rect.x,
                "y": n.screen_rect.y,
                "width": n.screen_rect.width,
                "height": n.screen_rect.height,
                "selected": n.selected,
            });
            if let Rendered::Missing { kind } = &n.content {
                v["missing"] = Value::String(kind.clone());
            }
            v
        })
        .collect();
    let edges: Vec<Value> = frame
        .edges
        .iter()
        .map(|e| match &e.content {
            Rendered::Ok(p) => json!({
                "id": e.id,
                "selected": e.selected,
                "path": p.path,
                "labelX": p.label_anchor.x,
                "labelY": p.label_anchor.y,
            }),
            Rendered::Missing { kind } => json!({
                "id": e.id,
                "selected": e.selected,
                "missing": kind,
            }),
        })
        .collect();
    json!({
        "viewport": { "x": frame.viewport.pan.x, "y": frame.viewport.pan.y, "zoom": frame.viewport.zoom },
        "nodes": nodes,
        "edges": edges,
        "rubberBand": frame.rubber_band.as_ref().map(|p| p.path.clone()),
        "selectionBox": frame.selection_box,
    })
}

/// Forward panic messages to `console.error`.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("workflow canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
