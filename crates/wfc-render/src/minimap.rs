//! Minimap projection: world ↔ minimap coordinates.
//!
//! The minimap shows the union of the node bounds and the visible area,
//! scaled uniformly to fit and centred in the minimap box.

use wfc_core::model::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjection {
    /// World rectangle the minimap displays.
    world: Rect,
    /// Minimap pixels per world unit.
    scale: f32,
    /// Minimap-space offset that centres the content.
    offset: Point,
    /// Visible world area at construction time.
    viewport_world: Rect,
}

impl MinimapProjection {
    /// `content` is the node bounds (if any), `viewport_world` the visible
    /// world area, `size` the minimap box in pixels.
    pub fn new(content: Option<Rect>, viewport_world: Rect, size: Size) -> Self {
        let world = content.map_or(viewport_world, |c| c.union(&viewport_world));
        let sx = size.width / world.width.max(f32::EPSILON);
        let sy = size.height / world.height.max(f32::EPSILON);
        let scale = sx.min(sy);
        let offset = Point::new(
            (size.width - world.width * scale) / 2.0,
            (size.height - world.height * scale) / 2.0,
        );
        Self {
            world,
            scale,
            offset,
            viewport_world,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn world_to_minimap(&self, p: Point) -> Point {
        (p - self.world.origin()) * self.scale + self.offset
    }

    pub fn minimap_to_world(&self, p: Point) -> Point {
        (p - self.offset) / self.scale + self.world.origin()
    }

    pub fn rect_to_minimap(&self, r: &Rect) -> Rect {
        let o = self.world_to_minimap(r.origin());
        Rect::new(o.x, o.y, r.width * self.scale, r.height * self.scale)
    }

    /// The viewport indicator drawn over the minimap.
    pub fn viewport_indicator(&self) -> Rect {
        self.rect_to_minimap(&self.viewport_world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn content_fits_and_centres() {
        let proj = MinimapProjection::new(
            Some(Rect::new(0.0, 0.0, 400.0, 200.0)),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(200.0, 200.0),
        );
        assert_eq!(proj.scale(), 0.5);
        // 400x200 world → 200x100 minimap, centred vertically.
        assert_eq!(proj.world_to_minimap(Point::new(0.0, 0.0)), Point::new(0.0, 50.0));
        assert_eq!(
            proj.viewport_indicator(),
            Rect::new(0.0, 50.0, 50.0, 50.0)
        );
    }

    #[test]
    fn click_maps_back_to_world() {
        let proj = MinimapProjection::new(
            Some(Rect::new(-100.0, -50.0, 300.0, 300.0)),
            Rect::new(0.0, 0.0, 80.0, 60.0),
            Size::new(150.0, 100.0),
        );
        let world = Point::new(42.0, 17.0);
        let back = proj.minimap_to_world(proj.world_to_minimap(world));
        assert!(back.approx_eq(world, 1e-3));
    }
}
