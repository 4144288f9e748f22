pub mod changes;
pub mod diagnostics;
pub mod id;
pub mod model;
pub mod options;
pub mod scene;
pub mod viewport;

pub use changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
pub use diagnostics::{Diagnostic, SceneError, Severity, Subject};
pub use id::{EdgeId, HandleId, NodeId};
pub use model::*;
pub use options::{CanvasOptions, MinimapPosition, MultiSelectKey};
pub use scene::{ReconcileReport, RemovedNode, SELECTED_NODE_LIFT, SceneModel};
pub use viewport::{Viewport, screen_to_world, viewport_for_bounds, world_to_screen};
