//! The equipment palette: a side panel of draggable unit kinds.
//!
//! Each entry is an egui drag source carrying a [`UnitKind`] payload; the
//! canvas consumes the payload on release and places a unit under the drop
//! position.

use eframe::egui;

use super::state::FlowsheetApp;
use crate::types::UnitKind;

impl FlowsheetApp {
    /// Draws the palette panel contents.
    pub fn draw_palette(&mut self, ui: &mut egui::Ui) {
        ui.heading("Equipment");
        ui.separator();
        ui.label("Drag onto the canvas");
        ui.add_space(4.0);

        for kind in UnitKind::ALL {
            let id = egui::Id::new("palette_entry").with(kind.display_name());
            ui.dnd_drag_source(id, kind, |ui| {
                let entry = egui::Frame::group(ui.style())
                    .inner_margin(egui::Margin::symmetric(8, 6))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(kind.display_name());
                    });
                entry.response.on_hover_text(format!(
                    "Drag to place a {}",
                    kind.display_name().to_lowercase()
                ));
            });
        }
    }
}
