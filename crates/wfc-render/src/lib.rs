pub mod adapter;
pub mod handles;
pub mod hit;
pub mod minimap;
pub mod path;

pub use adapter::{
    EdgeItem, NodeItem, NodeRenderProps, NodeTypeRegistry, RenderFrame, Rendered, Transient,
    build_frame, connection_line, edge_paths,
};
pub use handles::{HandleLayout, HandleQuery, HandleRegistry};
pub use hit::{Target, hit_test_edge, hit_test_node, hit_test_rect, hit_test_resize_grip, pick};
pub use minimap::MinimapProjection;
pub use path::{
    EdgePath, EdgeRenderProps, EdgeRouterFn, EdgeTypeRegistry, Endpoints, Routing,
    compute_edge_path, route,
};
