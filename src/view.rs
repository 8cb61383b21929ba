//! Canvas view: the logical/screen coordinate transform.
//!
//! Logical coordinates are zoom/pan independent and are what the model
//! stores; screen coordinates are derived per frame. The transform is
//! `screen = logical * scale + pan_offset`.

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::constants::{FIT_MARGIN, MIN_SCALE, ZOOM_STEP};

/// Pan/zoom state for one open flowsheet.
///
/// `scale` is strictly positive and unbounded above; zoom steps multiply or
/// divide it by [`ZOOM_STEP`], anchored at the coordinate-space origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasView {
    /// Current zoom level (1.0 = 100%)
    pub scale: f32,
    /// Current pan translation in screen pixels
    #[serde(skip)]
    pub pan_offset: egui::Vec2,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_offset: egui::Vec2::ZERO,
        }
    }
}

impl CanvasView {
    /// Converts a logical position to screen space.
    pub fn to_screen(&self, logical: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            logical.x * self.scale + self.pan_offset.x,
            logical.y * self.scale + self.pan_offset.y,
        )
    }

    /// Converts a screen position to logical space.
    pub fn to_logical(&self, screen: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            (screen.x - self.pan_offset.x) / self.scale,
            (screen.y - self.pan_offset.y) / self.scale,
        )
    }

    /// Converts a logical rectangle to screen space.
    pub fn to_screen_rect(&self, logical: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(self.to_screen(logical.min), self.to_screen(logical.max))
    }

    /// Zooms in by one step, anchored at the origin.
    pub fn zoom_in(&mut self) {
        self.scale *= ZOOM_STEP;
    }

    /// Zooms out by one step, anchored at the origin.
    ///
    /// The scale floor keeps the inverse transform well defined after
    /// arbitrarily many zoom-out steps.
    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).max(MIN_SCALE);
    }

    /// Restores the default 100% zoom and zero pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translates the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: egui::Vec2) {
        self.pan_offset += delta;
    }

    /// Scales and centers the view so `content` (a logical bounding box,
    /// padded by [`FIT_MARGIN`]) fills `viewport`.
    ///
    /// Fit never zooms in past 100%, only out or to 100%. A missing or
    /// zero-area content box leaves the view untouched.
    pub fn fit_to_contents(&mut self, content: Option<egui::Rect>, viewport: egui::Rect) {
        let Some(content) = content else {
            return;
        };
        let padded = content.expand(FIT_MARGIN);
        if padded.width() <= 0.0 || padded.height() <= 0.0 {
            return;
        }
        let scale = (viewport.width() / padded.width())
            .min(viewport.height() / padded.height())
            .min(1.0);
        self.scale = scale.max(MIN_SCALE);
        self.pan_offset = viewport.center().to_vec2() - padded.center().to_vec2() * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_transform() {
        let view = CanvasView {
            scale: 1.7,
            pan_offset: egui::vec2(-320.0, 48.5),
        };
        for p in [
            egui::pos2(0.0, 0.0),
            egui::pos2(123.4, -567.8),
            egui::pos2(-1.0, 10_000.0),
        ] {
            let back = view.to_logical(view.to_screen(p));
            assert!((back - p).length() < 1e-3, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn test_zoom_cycle_returns_to_start() {
        let mut view = CanvasView::default();
        let original = view.scale;
        let unit_pos = egui::pos2(100.0, 50.0);
        let before = view.to_screen(unit_pos);

        for _ in 0..5 {
            view.zoom_in();
        }
        for _ in 0..5 {
            view.zoom_out();
        }

        assert!((view.scale - original).abs() < 1e-5);
        let after = view.to_screen(unit_pos);
        assert!((after - before).length() < 1e-3);
    }

    #[test]
    fn test_zoom_out_never_reaches_zero() {
        let mut view = CanvasView::default();
        for _ in 0..10_000 {
            view.zoom_out();
        }
        assert!(view.scale >= MIN_SCALE);
        // The inverse transform stays finite
        let p = view.to_logical(egui::pos2(100.0, 100.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_fit_zooms_out_to_show_contents() {
        let mut view = CanvasView::default();
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let content = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(2000.0, 500.0));
        view.fit_to_contents(Some(content), viewport);

        let padded = content.expand(FIT_MARGIN);
        let expected = (viewport.width() / padded.width())
            .min(viewport.height() / padded.height());
        assert!((view.scale - expected).abs() < 1e-5);

        // The padded box is centered in the viewport
        let screen_center = view.to_screen(padded.center());
        assert!((screen_center - viewport.center()).length() < 1e-2);
        // And fully visible
        assert!(viewport.contains_rect(view.to_screen_rect(content)));
    }

    #[test]
    fn test_fit_caps_at_full_scale() {
        let mut view = CanvasView {
            scale: 0.2,
            pan_offset: egui::vec2(50.0, 50.0),
        };
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let content = egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(50.0, 40.0));
        view.fit_to_contents(Some(content), viewport);
        // Small content never zooms in past 100%
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn test_fit_is_noop_for_empty_diagram() {
        let mut view = CanvasView {
            scale: 2.5,
            pan_offset: egui::vec2(7.0, 9.0),
        };
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        view.fit_to_contents(None, viewport);
        assert_eq!(view.scale, 2.5);
        assert_eq!(view.pan_offset, egui::vec2(7.0, 9.0));
    }
}
