//! Canvas options: the host's toggles and interaction tuning.
//!
//! Deserializes from the host's camelCase props object; every field has a
//! default, so `{}` is a valid configuration.

use crate::model::Rect;
use serde::{Deserialize, Serialize};

/// Modifier key that extends the selection instead of replacing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiSelectKey {
    #[default]
    Shift,
    Ctrl,
    Meta,
}

/// Corner the minimap is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinimapPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasOptions {
    /// Fit all nodes into view on the first node update.
    pub fit_view: bool,
    pub nodes_draggable: bool,
    pub nodes_connectable: bool,
    pub elements_selectable: bool,

    pub show_controls: bool,
    pub show_minimap: bool,
    pub show_background: bool,
    pub minimap_position: MinimapPosition,

    /// Host container height in pixels.
    pub height: f32,

    pub min_zoom: f32,
    pub max_zoom: f32,

    /// World rectangle the visible area may not leave. `None` = unbounded.
    pub translate_extent: Option<Rect>,

    /// Screen-pixel radius for handle hit-testing.
    pub handle_tolerance: f32,
    /// Screen-pixel distance for edge hit-testing.
    pub edge_tolerance: f32,

    /// Multiplicative zoom step for zoom in/out controls.
    pub zoom_step: f32,
    /// Default padding for `fit_view`, as a fraction of the visible area.
    pub fit_view_padding: f32,

    pub multi_select_key: MultiSelectKey,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            fit_view: false,
            nodes_draggable: true,
            nodes_connectable: true,
            elements_selectable: true,
            show_controls: true,
            show_minimap: false,
            show_background: true,
            minimap_position: MinimapPosition::default(),
            height: 500.0,
            min_zoom: 0.5,
            max_zoom: 2.0,
            translate_extent: None,
            handle_tolerance: 10.0,
            edge_tolerance: 6.0,
            zoom_step: 1.2,
            fit_view_padding: 0.1,
            multi_select_key: MultiSelectKey::default(),
        }
    }
}

impl CanvasOptions {
    /// Parse host props JSON and normalize the result.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let options: CanvasOptions = serde_json::from_str(json)?;
        Ok(options.validated())
    }

    /// Repair inconsistent zoom limits instead of rejecting them.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.min_zoom.is_nan() || self.min_zoom <= 0.0 {
            log::warn!("minZoom {} is not positive; using 0.01", self.min_zoom);
            self.min_zoom = 0.01;
        }
        if self.max_zoom.is_nan() {
            self.max_zoom = self.min_zoom.max(2.0);
        }
        if self.max_zoom < self.min_zoom {
            log::warn!(
                "maxZoom {} below minZoom {}; swapping",
                self.max_zoom,
                self.min_zoom
            );
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if self.zoom_step.is_nan() || self.zoom_step <= 1.0 {
            self.zoom_step = 1.2;
        }
        self.handle_tolerance = self.handle_tolerance.max(0.0);
        self.edge_tolerance = self.edge_tolerance.max(0.0);
        self
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        let options = CanvasOptions::from_json("{}").unwrap();
        assert_eq!(options, CanvasOptions::default());
    }

    #[test]
    fn camel_case_props() {
        let options = CanvasOptions::from_json(
            r#"{ "nodesDraggable": false, "minZoom": 0.25, "multiSelectKey": "meta",
                 "minimapPosition": "top-left", "showMinimap": true }"#,
        )
        .unwrap();
        assert!(!options.nodes_draggable);
        assert_eq!(options.min_zoom, 0.25);
        assert_eq!(options.multi_select_key, MultiSelectKey::Meta);
        assert_eq!(options.minimap_position, MinimapPosition::TopLeft);
        assert!(options.show_minimap);
    }

    #[test]
    fn reversed_zoom_limits_are_swapped() {
        let options = CanvasOptions {
            min_zoom: 4.0,
            max_zoom: 0.5,
            ..Default::default()
        }
        .validated();
        assert_eq!(options.min_zoom, 0.5);
        assert_eq!(options.max_zoom, 4.0);
        assert_eq!(options.clamp_zoom(10.0), 4.0);
    }
}
