pub mod canvas;
pub mod frame;
pub mod input;
pub mod machine;
pub mod shortcuts;

pub use canvas::{CanvasEngine, CanvasHost};
pub use input::{InputEvent, Modifiers};
pub use machine::{Effect, InteractionState, PointerEvent, transition};
pub use shortcuts::{ShortcutAction, ShortcutMap};
