//! File operations for saving and loading flowsheets.
//!
//! Native file dialogs via rfd; flowsheets persist as pretty-printed JSON.

use std::path::Path;

use super::state::{FlowsheetApp, Mode};
use crate::types::Flowsheet;

impl FlowsheetApp {
    /// Opens a save dialog and writes the flowsheet under a new name.
    pub fn save_as_flowsheet(&mut self) {
        let dialog = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("flowsheet.json");
        if let Some(path) = dialog.save_file() {
            self.write_flowsheet(&path);
        }
    }

    /// Saves to the current path, or falls back to "Save As" when the
    /// flowsheet has never been saved.
    pub fn save_flowsheet(&mut self) {
        if let Some(path) = self.file.current_path.clone() {
            self.write_flowsheet(&path);
        } else {
            self.save_as_flowsheet();
        }
    }

    fn write_flowsheet(&mut self, path: &Path) {
        let json = match self.flowsheet.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize flowsheet: {err}");
                return;
            }
        };
        match std::fs::write(path, json) {
            Ok(()) => {
                self.file.current_path = Some(path.to_path_buf());
                self.file.has_unsaved_changes = false;
                log::info!("saved flowsheet to {}", path.display());
            }
            Err(err) => {
                log::error!("failed to save {}: {err}", path.display());
            }
        }
    }

    /// Opens a file picker and loads the chosen flowsheet.
    ///
    /// A parse or read failure logs the error and leaves the current
    /// flowsheet untouched.
    pub fn load_flowsheet(&mut self) {
        let dialog = rfd::FileDialog::new().add_filter("JSON", &["json"]);
        let Some(path) = dialog.pick_file() else {
            return;
        };
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to read {}: {err}", path.display());
                return;
            }
        };
        match Flowsheet::from_json(&json) {
            Ok(flowsheet) => {
                // Keep the label counter ahead of the loaded units
                self.unit_counter = flowsheet.units.len() as u32;
                self.flowsheet = flowsheet;
                self.file.current_path = Some(path.clone());
                self.file.has_unsaved_changes = false;
                self.selection.clear();
                self.mode = Mode::Idle;
                self.context_menu.show = false;
                log::info!("loaded flowsheet from {}", path.display());
            }
            Err(err) => {
                log::error!("failed to parse {}: {err}", path.display());
            }
        }
    }

    /// Replaces the current flowsheet with an empty one and resets the view.
    pub fn new_flowsheet(&mut self) {
        self.flowsheet = Flowsheet::new();
        self.file.current_path = None;
        self.file.has_unsaved_changes = false;
        self.selection.clear();
        self.mode = Mode::Idle;
        self.context_menu.show = false;
        self.unit_counter = 0;
        self.view.reset();
    }
}
