//! User interface components and interaction logic for the flowsheet editor.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main FlowsheetApp
//! - `canvas` - Hit-testing and the pointer gesture state machine
//! - `rendering` - Building and painting the per-frame draw-command list
//! - `palette` - The draggable equipment palette
//! - `file_ops` - File save/load operations

mod canvas;
mod file_ops;
mod palette;
mod rendering;
mod state;


pub use rendering::DrawCommand;
pub use state::FlowsheetApp;

use self::state::{ContextTarget, Mode, PendingConfirmAction};
use eframe::egui;

impl eframe::App for FlowsheetApp {
    /// Persist UI preferences and the open flowsheet between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::error!("failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_keyboard(ctx);

        // Intercept native window close requests (titlebar X)
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.file.has_unsaved_changes && !self.file.allow_close_on_next_request {
                // Abort close and show confirmation dialog
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                if !self.file.show_unsaved_dialog {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
                }
            } else {
                self.file.allow_close_on_next_request = false;
            }
        }

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("equipment_palette")
            .resizable(false)
            .default_width(160.0)
            .show(ctx, |ui| {
                self.draw_palette(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        if self.file.show_unsaved_dialog {
            self.draw_unsaved_dialog(ctx);
        }
    }
}

impl FlowsheetApp {
    /// Draws the main toolbar with file and view controls.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            // File operations
            if ui.button("New").clicked() {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::New);
                } else {
                    self.new_flowsheet();
                }
            }
            if ui.button("Open").clicked() {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Open);
                } else {
                    self.load_flowsheet();
                }
            }
            if ui.button("Save").clicked() {
                self.save_flowsheet();
            }
            if ui.button("Save As").clicked() {
                self.save_as_flowsheet();
            }
            if ui.button("Exit").clicked() {
                // Goes through the close-request interception, so unsaved
                // changes still prompt
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }

            ui.separator();

            // View controls
            if ui.button("Zoom In").clicked() {
                self.view.zoom_in();
            }
            if ui.button("Zoom Out").clicked() {
                self.view.zoom_out();
            }
            if ui.button("Reset View").clicked() {
                self.view.reset();
            }
            if ui.button("Fit").clicked() {
                let viewport = if self.canvas_rect.width() > 0.0 {
                    self.canvas_rect
                } else {
                    ui.ctx().screen_rect()
                };
                self.view.fit_to_contents(self.flowsheet.bounding_rect(), viewport);
            }

            ui.separator();

            ui.checkbox(&mut self.show_grid, "Grid");
            let pan_toggled = ui.toggle_value(&mut self.pan_mode, "Pan").changed();
            if pan_toggled && !self.pan_mode {
                // Leaving pan mode must not strand an active pan gesture
                if matches!(self.mode, Mode::Panning { .. }) {
                    self.mode = Mode::Idle;
                }
            }
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.0}%", self.view.scale * 100.0));
                if self.file.has_unsaved_changes {
                    ui.label("●");
                }
            });
        });
    }

    /// Handles global keyboard shortcuts.
    ///
    /// Zoom keys are ignored mid drag/resize/connect so the pointer's logical
    /// mapping stays stable under an active gesture; Escape cancels an
    /// in-progress connect; Delete removes the selection while idle.
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        if !self.mode.blocks_zoom_keys() {
            let zoom_in = ctx.input(|i| {
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals)
            });
            if zoom_in {
                self.view.zoom_in();
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Minus)) {
                self.view.zoom_out();
            }
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if matches!(self.mode, Mode::Connecting { .. }) {
                self.mode = Mode::Idle;
            }
            self.context_menu.show = false;
        }

        let delete = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if delete && self.mode == Mode::Idle {
            self.delete_selected();
        }
    }

    /// Draws the right-click context menu for the stored target.
    pub(crate) fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        let screen_pos = self.context_menu.screen_pos;

        let area_response = egui::Area::new(egui::Id::new("context_menu"))
            .fixed_pos(screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| match self.context_menu.target {
                        Some(ContextTarget::Unit(id)) => {
                            if ui.button("Connect From Here").clicked() {
                                self.begin_connect(id, screen_pos);
                                self.context_menu.show = false;
                            }
                            if ui.button("Duplicate").clicked() {
                                if let Some(copy) = self.flowsheet.duplicate(id) {
                                    self.selection.clear();
                                    self.selection.unit = Some(copy);
                                    self.mark_dirty();
                                }
                                self.context_menu.show = false;
                            }
                            if ui.button("Reset Size").clicked() {
                                self.flowsheet.reset_unit_size(id);
                                self.mark_dirty();
                                self.context_menu.show = false;
                            }
                            ui.separator();
                            if ui.button("Delete").clicked() {
                                self.delete_unit(id);
                                self.context_menu.show = false;
                            }
                        }
                        Some(ContextTarget::Connection(idx)) => {
                            if ui.button("Delete Connection").clicked() {
                                self.flowsheet.remove_connection(idx);
                                self.selection.connection = None;
                                self.mark_dirty();
                                self.context_menu.show = false;
                            }
                        }
                        None => {
                            self.context_menu.show = false;
                        }
                    });
                })
            });

        // Handle click-outside-to-close after the first frame
        if !self.context_menu.just_opened && ui.input(|i| i.pointer.primary_clicked()) {
            if let Some(click_pos) = ui.input(|i| i.pointer.interact_pos()) {
                if !area_response.response.rect.contains(click_pos) {
                    self.context_menu.show = false;
                }
            }
        }

        self.context_menu.just_opened = false;
    }

    /// Draws the unsaved-changes confirmation dialog.
    fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        let title = match self.file.pending_confirm_action {
            Some(PendingConfirmAction::Quit) => "Unsaved changes — Quit?",
            Some(PendingConfirmAction::New) => "Unsaved changes — Create New?",
            Some(PendingConfirmAction::Open) => "Unsaved changes — Open File?",
            None => "Unsaved changes",
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    let confirm_label = match self.file.pending_confirm_action {
                        Some(PendingConfirmAction::Quit) => "Discard and Quit",
                        Some(PendingConfirmAction::New) => "Discard and Create New",
                        Some(PendingConfirmAction::Open) => "Discard and Open",
                        None => "Discard",
                    };
                    if ui.button(confirm_label).clicked() {
                        match self.file.pending_confirm_action {
                            Some(PendingConfirmAction::New) => {
                                self.new_flowsheet();
                            }
                            Some(PendingConfirmAction::Open) => {
                                self.load_flowsheet();
                            }
                            Some(PendingConfirmAction::Quit) => {
                                // Allow one close request through without interception
                                self.file.allow_close_on_next_request = true;
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                            }
                            None => {}
                        }
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                });
            });
    }
}
