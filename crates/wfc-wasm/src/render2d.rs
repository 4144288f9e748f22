//! Canvas2D overlay renderer.
//!
//! Node bodies are DOM elements owned by the host; this layer strokes what
//! lives between them: edge paths, the in-progress connection, the box-select
//! rectangle and the minimap. Edge paths are SVG data in world space and are
//! drawn through `Path2d` under the viewport transform.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Path2d};
use wfc_core::model::{Point, Rect, Size};
use wfc_core::options::MinimapPosition;
use wfc_render::adapter::{RenderFrame, Rendered};
use wfc_render::minimap::MinimapProjection;

/// Minimap box in screen pixels.
pub const MINIMAP_SIZE: Size = Size::new(200.0, 150.0);

/// Distance of the minimap from the canvas edges.
const MINIMAP_MARGIN: f32 = 12.0;

pub struct OverlayTheme {
    pub edge: &'static str,
    pub edge_selected: &'static str,
    pub rubber_band: &'static str,
    pub selection_fill: &'static str,
    pub selection_stroke: &'static str,
    pub minimap_bg: &'static str,
    pub minimap_node: &'static str,
    pub minimap_viewport: &'static str,
}

impl OverlayTheme {
    pub fn light() -> Self {
        Self {
            edge: "#B1B1B7",
            edge_selected: "#555555",
            rubber_band: "#B1B1B7",
            selection_fill: "rgba(0, 89, 220, 0.08)",
            selection_stroke: "rgba(0, 89, 220, 0.8)",
            minimap_bg: "#FFFFFF",
            minimap_node: "#E2E2E2",
            minimap_viewport: "rgba(240, 240, 240, 0.6)",
        }
    }

    pub fn dark() -> Self {
        Self {
            edge: "#5C5C63",
            edge_selected: "#D0D0D5",
            rubber_band: "#8E8E93",
            selection_fill: "rgba(10, 132, 255, 0.12)",
            selection_stroke: "rgba(10, 132, 255, 0.9)",
            minimap_bg: "#2C2C2E",
            minimap_node: "#48484A",
            minimap_viewport: "rgba(60, 60, 62, 0.6)",
        }
    }

    fn edge_color(&self, selected: bool) -> &'static str {
        if selected { self.edge_selected } else { self.edge }
    }
}

/// Screen-space stroke width for an edge. Edges keep a constant on-screen
/// weight regardless of zoom.
fn edge_width(selected: bool, zoom: f32) -> f64 {
    let px = if selected { 2.0 } else { 1.0 };
    px / f64::from(zoom.max(f32::EPSILON))
}

/// Top-left corner of the minimap box on a `screen`-sized canvas.
pub fn minimap_origin(position: MinimapPosition, screen: Size) -> Point {
    let right = screen.width - MINIMAP_SIZE.width - MINIMAP_MARGIN;
    let bottom = screen.height - MINIMAP_SIZE.height - MINIMAP_MARGIN;
    match position {
        MinimapPosition::TopLeft => Point::new(MINIMAP_MARGIN, MINIMAP_MARGIN),
        MinimapPosition::TopRight => Point::new(right, MINIMAP_MARGIN),
        MinimapPosition::BottomLeft => Point::new(MINIMAP_MARGIN, bottom),
        MinimapPosition::BottomRight => Point::new(right, bottom),
    }
}

/// Draw one frame's overlay. Clears the canvas first.
pub fn render_overlay<T>(
    ctx: &CanvasRenderingContext2d,
    frame: &RenderFrame<T>,
    screen: Size,
    minimap_position: MinimapPosition,
    theme: &OverlayTheme,
) -> Result<(), JsValue> {
    ctx.reset_transform()?;
    ctx.clear_rect(0.0, 0.0, f64::from(screen.width), f64::from(screen.height));

    let vp = frame.viewport;
    ctx.save();
    ctx.set_transform(
        f64::from(vp.zoom),
        0.0,
        0.0,
        f64::from(vp.zoom),
        f64::from(vp.pan.x),
        f64::from(vp.pan.y),
    )?;
    for edge in &frame.edges {
        // Missing edge types are reported as diagnostics; nothing to stroke.
        let Rendered::Ok(path) = &edge.content else {
            continue;
        };
        ctx.set_stroke_style_str(theme.edge_color(edge.selected));
        ctx.set_line_width(edge_width(edge.selected, vp.zoom));
        stroke_svg(ctx, &path.path)?;
    }
    if let Some(band) = &frame.rubber_band {
        ctx.set_stroke_style_str(theme.rubber_band);
        ctx.set_line_width(edge_width(false, vp.zoom));
        ctx.set_line_dash(&dash(5.0 / f64::from(vp.zoom)))?;
        stroke_svg(ctx, &band.path)?;
        ctx.set_line_dash(&js_sys::Array::new())?;
    }
    ctx.restore();

    if let Some(rect) = frame.selection_box {
        draw_selection_box(ctx, &rect, theme);
    }
    if let Some(minimap) = &frame.minimap {
        let rects: Vec<Rect> = frame
            .nodes
            .iter()
            .map(|n| vp_rect_to_world(&n.screen_rect, vp.pan, vp.zoom))
            .collect();
        draw_minimap(ctx, minimap, &rects, minimap_origin(minimap_position, screen), theme);
    }
    Ok(())
}

fn dash(len: f64) -> js_sys::Array {
    let segments = js_sys::Array::new();
    segments.push(&JsValue::from_f64(len));
    segments.push(&JsValue::from_f64(len));
    segments
}

fn stroke_svg(ctx: &CanvasRenderingContext2d, data: &str) -> Result<(), JsValue> {
    let path = Path2d::new_with_path_string(data)?;
    ctx.stroke_with_path(&path);
    Ok(())
}

/// Undo the viewport transform on a screen rectangle.
fn vp_rect_to_world(r: &Rect, pan: Point, zoom: f32) -> Rect {
    let z = zoom.max(f32::EPSILON);
    Rect::new((r.x - pan.x) / z, (r.y - pan.y) / z, r.width / z, r.height / z)
}

fn draw_selection_box(ctx: &CanvasRenderingContext2d, r: &Rect, theme: &OverlayTheme) {
    let (x, y, w, h) = (
        f64::from(r.x),
        f64::from(r.y),
        f64::from(r.width),
        f64::from(r.height),
    );
    ctx.set_fill_style_str(theme.selection_fill);
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(theme.selection_stroke);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(x, y, w, h);
}

fn draw_minimap(
    ctx: &CanvasRenderingContext2d,
    minimap: &MinimapProjection,
    node_rects: &[Rect],
    origin: Point,
    theme: &OverlayTheme,
) {
    let ox = f64::from(origin.x);
    let oy = f64::from(origin.y);
    ctx.set_fill_style_str(theme.minimap_bg);
    ctx.fill_rect(
        ox,
        oy,
        f64::from(MINIMAP_SIZE.width),
        f64::from(MINIMAP_SIZE.height),
    );

    ctx.set_fill_style_str(theme.minimap_node);
    for world in node_rects {
        let r = minimap.rect_to_minimap(world);
        ctx.fill_rect(
            ox + f64::from(r.x),
            oy + f64::from(r.y),
            f64::from(r.width),
            f64::from(r.height),
        );
    }

    let v = minimap.viewport_indicator();
    ctx.set_stroke_style_str(theme.minimap_viewport);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(
        ox + f64::from(v.x),
        oy + f64::from(v.y),
        f64::from(v.width),
        f64::from(v.height),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimap_corners() {
        let screen = Size::new(800.0, 600.0);
        assert_eq!(
            minimap_origin(MinimapPosition::TopLeft, screen),
            Point::new(12.0, 12.0)
        );
        assert_eq!(
            minimap_origin(MinimapPosition::BottomRight, screen),
            Point::new(588.0, 438.0)
        );
    }

    #[test]
    fn edges_keep_screen_width() {
        assert_eq!(edge_width(false, 2.0), 0.5);
        assert_eq!(edge_width(true, 0.5), 4.0);
    }

    #[test]
    fn screen_rects_map_back_to_world() {
        let r = vp_rect_to_world(&Rect::new(30.0, 40.0, 200.0, 80.0), Point::new(10.0, 20.0), 2.0);
        assert_eq!(r, Rect::new(10.0, 10.0, 100.0, 40.0));
    }
}
