//! Input abstraction layer.
//!
//! Normalizes mouse, touch, wheel and keyboard events from the host into
//! a unified `InputEvent` enum consumed by the canvas engine. Coordinates
//! are screen pixels relative to the canvas element's top-left corner.

use wfc_core::options::MultiSelectKey;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn new(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Self {
        Self {
            shift,
            ctrl,
            alt,
            meta,
        }
    }

    /// Whether the configured multi-select modifier is held.
    pub fn holds(&self, key: MultiSelectKey) -> bool {
        match key {
            MultiSelectKey::Shift => self.shift,
            MultiSelectKey::Ctrl => self.ctrl,
            MultiSelectKey::Meta => self.meta,
        }
    }

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event from any pointing device or the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed (mouse down, touch start, pen contact).
    PointerDown { x: f32, y: f32, modifiers: Modifiers },

    PointerMove { x: f32, y: f32, modifiers: Modifiers },

    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// Wheel or trackpad pinch at the pointer position.
    Wheel {
        x: f32,
        y: f32,
        /// `WheelEvent.deltaY` in pixels; positive scrolls down (zoom out).
        delta_y: f32,
        modifiers: Modifiers,
    },

    /// Keyboard shortcut. `key` is the `KeyboardEvent.key` value.
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    /// Screen position, for pointer and wheel events.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Wheel { modifiers, .. }
            | Self::Key { modifiers, .. } => *modifiers,
        }
    }
}

/// Zoom multiplier for one wheel event.
///
/// Matches the browser convention of `2^(-deltaY * 0.002)`; a pinch
/// (reported as wheel + ctrl) is ten times as sensitive.
pub fn wheel_zoom_factor(delta_y: f32, modifiers: Modifiers) -> f32 {
    let scale = if modifiers.ctrl { 0.02 } else { 0.002 };
    2f32.powf(-delta_y * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_select_key_matches_modifier() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert!(shift.holds(MultiSelectKey::Shift));
        assert!(!shift.holds(MultiSelectKey::Meta));
        assert!(Modifiers::new(false, false, false, true).holds(MultiSelectKey::Meta));
    }

    #[test]
    fn wheel_direction() {
        assert!(wheel_zoom_factor(-100.0, Modifiers::NONE) > 1.0);
        assert!(wheel_zoom_factor(100.0, Modifiers::NONE) < 1.0);
        assert_eq!(wheel_zoom_factor(0.0, Modifiers::NONE), 1.0);
        let pinch = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(wheel_zoom_factor(-10.0, pinch) > wheel_zoom_factor(-10.0, Modifiers::NONE));
    }

    #[test]
    fn position_of_key_event_is_none() {
        let key = InputEvent::Key {
            key: "Escape".into(),
            modifiers: Modifiers::NONE,
        };
        assert_eq!(key.position(), None);
        let down = InputEvent::PointerDown {
            x: 3.0,
            y: 4.0,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(down.position(), Some((3.0, 4.0)));
    }
}
