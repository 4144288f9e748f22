//! Screen ↔ world coordinate transforms.
//!
//! `world = (screen - pan) / zoom` and `screen = world * zoom + pan`.
//! Everything here is a pure function of its inputs.

use crate::model::{Point, Rect, Size};
use crate::options::CanvasOptions;
use serde::{Deserialize, Serialize};

/// Pan offset (screen pixels) and zoom scalar for one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Point,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub const fn new(pan: Point, zoom: f32) -> Self {
        Self { pan, zoom }
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        screen_to_world(screen, self)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        world_to_screen(world, self)
    }

    /// Map a world rectangle to screen space.
    pub fn rect_to_screen(&self, rect: &Rect) -> Rect {
        let origin = self.world_to_screen(rect.origin());
        Rect::new(
            origin.x,
            origin.y,
            rect.width * self.zoom,
            rect.height * self.zoom,
        )
    }

    /// The world rectangle currently visible in a screen of `size`.
    pub fn visible_world_rect(&self, size: Size) -> Rect {
        let min = self.screen_to_world(Point::ZERO);
        Rect::new(min.x, min.y, size.width / self.zoom, size.height / self.zoom)
    }

    /// Shift the pan by a screen-space delta.
    #[must_use]
    pub fn panned_by(&self, delta: Point) -> Viewport {
        Viewport::new(self.pan + delta, self.zoom)
    }

    /// Finite pan and a finite, positive zoom.
    pub fn is_finite(&self) -> bool {
        self.pan.x.is_finite() && self.pan.y.is_finite() && self.zoom.is_finite() && self.zoom > 0.0
    }

    /// Zoom to `zoom` (clamped) keeping the world point under `anchor` fixed.
    /// A non-finite `zoom` leaves the viewport unchanged.
    #[must_use]
    pub fn zoomed_at(&self, anchor: Point, zoom: f32, options: &CanvasOptions) -> Viewport {
        if !zoom.is_finite() {
            return *self;
        }
        let zoom = options.clamp_zoom(zoom);
        let world = self.screen_to_world(anchor);
        Viewport::new(anchor - world * zoom, zoom)
    }

    /// Center `world` in a screen of `size` without changing zoom.
    #[must_use]
    pub fn centered_on(&self, world: Point, size: Size) -> Viewport {
        let center = Point::new(size.width / 2.0, size.height / 2.0);
        Viewport::new(center - world * self.zoom, self.zoom)
    }

    /// Clamp zoom to the configured range, then keep the visible area
    /// inside `translate_extent` when one is set.
    #[must_use]
    pub fn constrained(&self, size: Size, options: &CanvasOptions) -> Viewport {
        let zoom = options.clamp_zoom(self.zoom);
        let mut vp = Viewport::new(self.pan, zoom);
        if let Some(extent) = options.translate_extent {
            vp.pan.x = clamp_axis(vp.pan.x, extent.x, extent.width, size.width, zoom);
            vp.pan.y = clamp_axis(vp.pan.y, extent.y, extent.height, size.height, zoom);
        }
        vp
    }
}

/// Convert a screen point to world coordinates.
pub fn screen_to_world(screen: Point, viewport: &Viewport) -> Point {
    (screen - viewport.pan) / viewport.zoom
}

/// Convert a world point to screen coordinates.
pub fn world_to_screen(world: Point, viewport: &Viewport) -> Point {
    world * viewport.zoom + viewport.pan
}

/// Viewport that shows `bounds` centered in a screen of `size`.
///
/// `padding` is a fraction of the bounds added around them
/// (0.1 leaves 10% of slack). Zoom is clamped to the configured range;
/// degenerate bounds zoom to the maximum.
pub fn viewport_for_bounds(
    bounds: &Rect,
    size: Size,
    padding: f32,
    options: &CanvasOptions,
) -> Viewport {
    let pad = 1.0 + padding.max(0.0);
    let x_zoom = size.width / (bounds.width * pad);
    let y_zoom = size.height / (bounds.height * pad);
    let raw = x_zoom.min(y_zoom);
    let zoom = if raw.is_nan() {
        options.max_zoom
    } else {
        options.clamp_zoom(raw)
    };
    let center = bounds.center();
    let pan = Point::new(
        size.width / 2.0 - center.x * zoom,
        size.height / 2.0 - center.y * zoom,
    );
    Viewport::new(pan, zoom)
}

fn clamp_axis(pan: f32, ext_min: f32, ext_len: f32, screen_len: f32, zoom: f32) -> f32 {
    let ext_screen = ext_len * zoom;
    if ext_screen <= screen_len {
        // Extent fits entirely: center it.
        return (screen_len - ext_screen) / 2.0 - ext_min * zoom;
    }
    // Visible world range is [-pan/zoom, (screen - pan)/zoom].
    let max_pan = -ext_min * zoom;
    let min_pan = screen_len - (ext_min + ext_len) * zoom;
    pan.clamp(min_pan, max_pan)
}
