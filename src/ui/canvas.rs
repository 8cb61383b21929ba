//! Canvas interaction: the pointer-driven gesture state machine and
//! geometric hit-testing under the current pan/zoom transform.

use eframe::egui;

use super::rendering;
use super::state::{ContextTarget, FlowsheetApp, Mode};
use crate::constants::{CORNER_HANDLE, HIT_THRESHOLD};
use crate::routing;
use crate::types::{Corner, Unit, UnitId, UnitKind};

impl FlowsheetApp {
    /// The unit's rectangle in screen coordinates under the current view.
    pub fn screen_rect_of(&self, unit: &Unit) -> egui::Rect {
        self.view.to_screen_rect(unit.logical_rect())
    }

    /// Finds the unit under a screen point.
    ///
    /// Tie-break policy: first match in registry (insertion) order wins.
    pub fn unit_at(&self, screen_pos: egui::Pos2) -> Option<UnitId> {
        self.flowsheet
            .units
            .iter()
            .find(|u| self.screen_rect_of(u).contains(screen_pos))
            .map(|u| u.id)
    }

    /// Finds the resize corner of `id` under a screen point, if any.
    ///
    /// Each corner owns a fixed-size square just inside the unit rectangle;
    /// the squares are checked before any body hit, and at most one matches.
    pub fn resize_corner_at(&self, screen_pos: egui::Pos2, id: UnitId) -> Option<Corner> {
        let unit = self.flowsheet.unit(id)?;
        let rect = self.screen_rect_of(unit);
        let handle = egui::vec2(CORNER_HANDLE, CORNER_HANDLE);
        Corner::ALL.into_iter().find(|corner| {
            let anchor = match corner {
                Corner::TopLeft => rect.min,
                Corner::TopRight => egui::pos2(rect.max.x - CORNER_HANDLE, rect.min.y),
                Corner::BottomLeft => egui::pos2(rect.min.x, rect.max.y - CORNER_HANDLE),
                Corner::BottomRight => rect.max - handle,
            };
            egui::Rect::from_min_size(anchor, handle).contains(screen_pos)
        })
    }

    /// Finds the connection whose routed path passes within `threshold`
    /// screen pixels of the given point.
    ///
    /// Returns the first hit in rendering order (increasing index).
    pub fn connection_at(&self, screen_pos: egui::Pos2, threshold: f32) -> Option<usize> {
        self.flowsheet
            .connections
            .iter()
            .enumerate()
            .find(|(_, conn)| {
                let (Some(from), Some(to)) =
                    (self.flowsheet.unit(conn.from), self.flowsheet.unit(conn.to))
                else {
                    return false;
                };
                let path = routing::route_path(
                    self.screen_rect_of(from),
                    self.screen_rect_of(to),
                    conn.port,
                    conn.total_ports,
                );
                routing::path_hit(&path, screen_pos, threshold)
            })
            .map(|(idx, _)| idx)
    }

    /// Creates a unit of the given kind centered under a screen drop
    /// position, selects it, and raises it on top.
    pub fn create_unit_at(&mut self, kind: UnitKind, screen_pos: egui::Pos2) {
        self.unit_counter += 1;
        let label = format!("{} {}", kind.display_name(), self.unit_counter);
        let logical = self.view.to_logical(screen_pos);
        let (w, h) = kind.base_size();
        let position = (logical.x - w / 2.0, logical.y - h / 2.0);
        let id = self.flowsheet.add_unit(Unit::new(kind, label, position));
        self.selection.clear();
        self.selection.unit = Some(id);
        self.mark_dirty();
        log::debug!("placed {} at {:?}", kind.display_name(), position);
    }

    /// Deletes a unit, cascading into its connections, and defensively
    /// clears any selection or gesture that referenced it.
    pub fn delete_unit(&mut self, id: UnitId) {
        if !self.flowsheet.remove_unit(id) {
            return;
        }
        if self.selection.unit == Some(id) {
            self.selection.unit = None;
        }
        // Connection indices shifted; a stale index must not survive
        self.selection.connection = None;
        match self.mode {
            Mode::DraggingUnit { id: active, .. }
            | Mode::ResizingUnit { id: active, .. }
            | Mode::Connecting { from: active, .. }
                if active == id =>
            {
                self.mode = Mode::Idle;
            }
            _ => {}
        }
        self.mark_dirty();
    }

    /// Deletes whatever is currently selected.
    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selection.unit {
            self.delete_unit(id);
        } else if let Some(idx) = self.selection.connection.take() {
            self.flowsheet.remove_connection(idx);
            self.mark_dirty();
        }
    }

    /// Starts a connect gesture from the given unit.
    pub fn begin_connect(&mut self, from: UnitId, cursor: egui::Pos2) {
        if self.flowsheet.unit(from).is_some() {
            self.mode = Mode::Connecting { from, cursor };
        }
    }

    /// Draws the canvas and runs the interaction state machine for this frame.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas_rect = response.rect;

        // A palette entry dropped on the canvas creates a unit under the cursor
        if let Some(kind) = response.dnd_release_payload::<UnitKind>() {
            if let Some(pos) = response.hover_pos() {
                self.create_unit_at(*kind, pos);
            }
        }

        self.handle_canvas_input(ui, &response);

        let commands = rendering::build_frame(
            &self.flowsheet,
            &self.view,
            response.rect,
            &self.selection,
            &self.mode,
            self.show_grid,
        );
        rendering::paint_frame(&painter, &commands, self.dark_mode);

        if self.context_menu.show {
            self.draw_context_menu(ui);
        }
    }

    /// Advances the gesture state machine from this frame's pointer input.
    pub fn handle_canvas_input(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        // Right-click takes priority over every drag state
        if response.secondary_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.open_context_menu(pos);
            }
            return;
        }

        let pointer = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos());
        let primary_pressed = ui.input(|i| i.pointer.primary_pressed()) && response.hovered();
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let middle_down = ui.input(|i| i.pointer.middle_down());

        match self.mode {
            Mode::Idle => {
                if let Some(pos) = pointer {
                    if primary_pressed {
                        if self.pan_mode {
                            self.mode = Mode::Panning { last_pos: pos };
                        } else {
                            self.press_on_canvas(pos);
                        }
                    } else if middle_down && response.hovered() {
                        self.mode = Mode::Panning { last_pos: pos };
                    }
                }
            }
            Mode::DraggingUnit { id, grab_offset } => {
                if primary_down {
                    if let Some(pos) = pointer {
                        let logical = self.view.to_logical(pos) - grab_offset;
                        self.flowsheet.move_unit(id, (logical.x, logical.y));
                    }
                } else {
                    // Commit the position and drop the selection highlight
                    self.selection.unit = None;
                    self.mode = Mode::Idle;
                    self.mark_dirty();
                }
            }
            Mode::ResizingUnit {
                id,
                corner,
                grab_offset,
            } => {
                if primary_down {
                    if let Some(pos) = pointer {
                        let target = self.view.to_logical(pos) - grab_offset;
                        self.flowsheet.resize_unit(id, corner, target);
                    }
                } else {
                    // Size is already committed through continuous mutation
                    self.mode = Mode::Idle;
                    self.mark_dirty();
                }
            }
            Mode::Panning { last_pos } => {
                if primary_down || middle_down {
                    if let Some(pos) = pointer {
                        self.view.pan_by(pos - last_pos);
                        self.mode = Mode::Panning { last_pos: pos };
                    }
                } else {
                    self.mode = Mode::Idle;
                }
            }
            Mode::Connecting { from, .. } => {
                if let Some(pos) = pointer {
                    self.mode = Mode::Connecting { from, cursor: pos };
                    if primary_pressed {
                        match self.unit_at(pos) {
                            Some(target) if target != from => {
                                match self.flowsheet.connect(from, target, &*self.port_policy) {
                                    Ok(()) => self.mark_dirty(),
                                    Err(err) => log::debug!("connection rejected: {err}"),
                                }
                            }
                            // Empty space or the source unit cancels
                            _ => {}
                        }
                        self.mode = Mode::Idle;
                    }
                }
            }
        }
    }

    /// Handles a primary press on the canvas while idle: corner hits beat
    /// body hits, body hits beat connection hits, and empty space clears the
    /// selection.
    fn press_on_canvas(&mut self, pos: egui::Pos2) {
        if let Some(id) = self.unit_at(pos) {
            self.selection.clear();
            self.selection.unit = Some(id);
            self.flowsheet.raise(id);
            let logical = self.view.to_logical(pos);
            if let Some(corner) = self.resize_corner_at(pos, id) {
                // Safe: unit_at just found this id
                let rect = self.flowsheet.unit(id).map(|u| u.logical_rect());
                if let Some(rect) = rect {
                    self.mode = Mode::ResizingUnit {
                        id,
                        corner,
                        grab_offset: logical - corner.point_of(rect),
                    };
                }
            } else if let Some(unit) = self.flowsheet.unit(id) {
                self.mode = Mode::DraggingUnit {
                    id,
                    grab_offset: logical - unit.logical_rect().min,
                };
            }
        } else if let Some(idx) = self.connection_at(pos, HIT_THRESHOLD) {
            self.selection.clear();
            self.selection.connection = Some(idx);
        } else {
            self.selection.clear();
        }
    }

    /// Opens the context menu for whatever sits under the cursor.
    ///
    /// Connections are checked first so a path crossing a unit body can
    /// still be acted on; empty space opens no menu.
    fn open_context_menu(&mut self, pos: egui::Pos2) {
        let target = self
            .connection_at(pos, HIT_THRESHOLD)
            .map(ContextTarget::Connection)
            .or_else(|| self.unit_at(pos).map(ContextTarget::Unit));
        if let Some(target) = target {
            match target {
                ContextTarget::Unit(id) => {
                    self.selection.clear();
                    self.selection.unit = Some(id);
                }
                ContextTarget::Connection(idx) => {
                    self.selection.clear();
                    self.selection.connection = Some(idx);
                }
            }
            self.context_menu.show = true;
            self.context_menu.screen_pos = pos;
            self.context_menu.target = Some(target);
            self.context_menu.just_opened = true;
            // Right-click never enters a drag state
            self.mode = Mode::Idle;
        }
    }
}
