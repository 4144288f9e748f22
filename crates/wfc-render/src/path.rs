//! Edge path geometry: endpoints → SVG path data + label anchor.
//!
//! Built-in routings are straight, cubic bezier, and orthogonal step.
//! Hosts can register their own router per edge `type`; it receives the same
//! endpoint geometry as the built-ins and replaces them for that type.

use kurbo::{BezPath, CubicBez, ParamCurve};
use std::collections::HashMap;
use std::fmt;
use wfc_core::id::EdgeId;
use wfc_core::model::{ElementData, HandleSide, Point};

/// Minimum control-point distance for bezier edges, in world units.
const MIN_CONTROL_OFFSET: f64 = 20.0;

/// Built-in routing kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Straight,
    Bezier,
    Step,
}

impl Routing {
    /// Built-in routing for an edge `type`, if there is one.
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "default" | "bezier" | "simplebezier" => Some(Routing::Bezier),
            "straight" => Some(Routing::Straight),
            "step" | "smoothstep" => Some(Routing::Step),
            _ => None,
        }
    }
}

/// Resolved world-space endpoints of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints {
    pub source: Point,
    pub source_side: HandleSide,
    pub target: Point,
    pub target_side: HandleSide,
}

impl Endpoints {
    pub fn new(source: Point, source_side: HandleSide, target: Point, target_side: HandleSide) -> Self {
        Self {
            source,
            source_side,
            target,
            target_side,
        }
    }
}

/// Output of a router.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    /// SVG path data in world coordinates.
    pub path: String,
    pub label_anchor: Point,
}

/// Everything a host edge renderer receives.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRenderProps<'a> {
    pub id: EdgeId,
    pub source_x: f32,
    pub source_y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub source_side: HandleSide,
    pub target_side: HandleSide,
    pub data: &'a ElementData,
    pub selected: bool,
}

impl EdgeRenderProps<'_> {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            Point::new(self.source_x, self.source_y),
            self.source_side,
            Point::new(self.target_x, self.target_y),
            self.target_side,
        )
    }
}

fn kp(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn from_kp(p: kurbo::Point) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

/// Build the `BezPath` for a built-in routing.
pub fn route(ends: &Endpoints, routing: Routing) -> (BezPath, Point) {
    let s = kp(ends.source);
    let t = kp(ends.target);
    let mut path = BezPath::new();
    path.move_to(s);

    let anchor = match routing {
        Routing::Straight => {
            path.line_to(t);
            ends.source.midpoint(ends.target)
        }
        Routing::Bezier => {
            let offset = (s.distance(t) * 0.25).max(MIN_CONTROL_OFFSET);
            let n1 = kp(ends.source_side.normal());
            let n2 = kp(ends.target_side.normal());
            let c1 = s + n1.to_vec2() * offset;
            let c2 = t + n2.to_vec2() * offset;
            path.curve_to(c1, c2, t);
            from_kp(CubicBez::new(s, c1, c2, t).eval(0.5))
        }
        Routing::Step => {
            if ends.source_side.is_horizontal() {
                let mx = (s.x + t.x) / 2.0;
                path.line_to((mx, s.y));
                path.line_to((mx, t.y));
            } else {
                let my = (s.y + t.y) / 2.0;
                path.line_to((s.x, my));
                path.line_to((t.x, my));
            }
            path.line_to(t);
            // The middle segment's midpoint is the endpoint mean.
            ends.source.midpoint(ends.target)
        }
    };
    (path, anchor)
}

/// Compute the SVG path and label anchor for a built-in routing.
pub fn compute_edge_path(ends: &Endpoints, routing: Routing) -> EdgePath {
    let (path, label_anchor) = route(ends, routing);
    EdgePath {
        path: path.to_svg(),
        label_anchor,
    }
}

/// Host-supplied router for one edge type.
pub type EdgeRouterFn = Box<dyn Fn(&EdgeRenderProps<'_>) -> EdgePath>;

/// How an edge `type` resolved.
pub enum ResolvedRouter<'r> {
    Custom(&'r EdgeRouterFn),
    Builtin(Routing),
    /// No built-in and no registered router: render an error marker.
    Missing,
}

/// Registry of host edge routers keyed by edge `type`.
#[derive(Default)]
pub struct EdgeTypeRegistry {
    routers: HashMap<String, EdgeRouterFn>,
}

impl fmt::Debug for EdgeTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.routers.keys().collect();
        keys.sort();
        f.debug_struct("EdgeTypeRegistry")
            .field("types", &keys)
            .finish()
    }
}

impl EdgeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the router for `kind`. Overrides any built-in.
    pub fn register<F>(&mut self, kind: &str, router: F)
    where
        F: Fn(&EdgeRenderProps<'_>) -> EdgePath + 'static,
    {
        self.routers.insert(kind.to_string(), Box::new(router));
    }

    pub fn unregister(&mut self, kind: &str) -> bool {
        self.routers.remove(kind).is_some()
    }

    pub fn resolve(&self, kind: &str) -> ResolvedRouter<'_> {
        if let Some(router) = self.routers.get(kind) {
            return ResolvedRouter::Custom(router);
        }
        match Routing::from_type(kind) {
            Some(r) => ResolvedRouter::Builtin(r),
            None => ResolvedRouter::Missing,
        }
    }

    /// Route one edge. `None` means the type has no router.
    ///
    /// The returned `BezPath` is what hit-testing walks; custom paths are
    /// parsed back from their SVG data and fall back to a straight segment
    /// when the host's data is not parseable.
    pub fn route(&self, kind: &str, props: &EdgeRenderProps<'_>) -> Option<(EdgePath, BezPath)> {
        match self.resolve(kind) {
            ResolvedRouter::Custom(router) => {
                let out = router(props);
                let bez = BezPath::from_svg(&out.path).unwrap_or_else(|_| {
                    log::debug!("edge {:?}: custom path is not SVG data", props.id);
                    route(&props.endpoints(), Routing::Straight).0
                });
                Some((out, bez))
            }
            ResolvedRouter::Builtin(routing) => {
                let (bez, label_anchor) = route(&props.endpoints(), routing);
                let path = EdgePath {
                    path: bez.to_svg(),
                    label_anchor,
                };
                Some((path, bez))
            }
            ResolvedRouter::Missing => None,
        }
    }
}
