//! # Flowsheet Editor
//!
//! A visual editor for mineral processing flowsheets: process units placed
//! on an infinite pan/zoom canvas, connected by automatically routed
//! orthogonal streams.
//!
//! ## Features
//! - Drag-and-drop unit placement from an equipment palette
//! - Unit dragging, corner resizing, and z-order raising
//! - Automatic orthogonal stream routing, including loopbacks
//! - Branching units that label their outgoing streams by port
//! - Canvas panning, step zooming, and fit-to-contents
//! - JSON save/load of the full flowsheet

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod constants;
mod routing;
mod types;
mod ui;
mod view;

// Re-export public types and functions
pub use routing::{arrowhead, end_anchor, path_hit, route_path, route_preview, start_anchor};
pub use types::*;
pub use ui::{DrawCommand, FlowsheetApp};
pub use view::CanvasView;

/// Runs the flowsheet editor with default settings.
///
/// Initializes the egui application window, restores any persisted app
/// state, and starts the main event loop.
///
/// # Example
///
/// ```no_run
/// use flowsheet_editor::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Flowsheet Editor",
        options,
        Box::new(|cc| {
            let app = cc
                .storage
                .and_then(|storage| storage.get_string("app_state"))
                .and_then(|json| FlowsheetApp::from_json(&json).ok())
                .unwrap_or_default();
            Ok(Box::new(app))
        }),
    )
}
