//! Application state structures.
//!
//! Contains the interaction mode state machine, selection and context menu
//! state, file operation state, and the main [`FlowsheetApp`] struct.

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::types::{BranchingPortPolicy, Corner, Flowsheet, PortPolicy, UnitId};
use crate::view::CanvasView;

/// The active interaction gesture.
///
/// Exactly one mode is active at any time; gesture data (dragged unit, grab
/// offset, active resize corner) lives inside the variant, so inconsistent
/// flag combinations cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// No gesture in progress
    Idle,
    /// A unit body is being dragged; `grab_offset` is the logical offset
    /// from the pointer to the unit's top-left corner
    DraggingUnit {
        /// Unit being moved
        id: UnitId,
        /// Pointer-to-position offset in logical coordinates
        grab_offset: egui::Vec2,
    },
    /// A unit corner is being dragged while the opposite corner stays fixed
    ResizingUnit {
        /// Unit being resized
        id: UnitId,
        /// The corner under the pointer
        corner: Corner,
        /// Pointer-to-corner offset in logical coordinates
        grab_offset: egui::Vec2,
    },
    /// The canvas is being panned
    Panning {
        /// Last pointer position, for computing per-frame deltas
        last_pos: egui::Pos2,
    },
    /// A connect gesture is in progress; a click on another unit commits
    Connecting {
        /// Source unit of the pending connection
        from: UnitId,
        /// Current pointer position for the live preview
        cursor: egui::Pos2,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Idle
    }
}

impl Mode {
    /// Whether keyboard zoom shortcuts should be ignored right now.
    ///
    /// Zooming mid-gesture would shift the pointer-to-logical mapping under
    /// an active drag/resize/connect, so those modes block it; idle and
    /// panning do not.
    pub fn blocks_zoom_keys(&self) -> bool {
        matches!(
            self,
            Mode::DraggingUnit { .. } | Mode::ResizingUnit { .. } | Mode::Connecting { .. }
        )
    }
}

/// Current selection: at most one unit and at most one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectionState {
    /// Selected unit id, if any
    pub unit: Option<UnitId>,
    /// Selected connection index, if any
    pub connection: Option<usize>,
}

impl SelectionState {
    /// Clears both selections.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What the context menu was opened on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextTarget {
    /// Menu for a unit (connect/duplicate/reset size/delete)
    Unit(UnitId),
    /// Menu for a connection (delete)
    Connection(usize),
}

/// Right-click context menu state.
#[derive(Default)]
pub struct ContextMenuState {
    /// Whether the menu is currently visible
    pub show: bool,
    /// Screen position where the menu appears
    pub screen_pos: egui::Pos2,
    /// The unit or connection the menu acts on
    pub target: Option<ContextTarget>,
    /// Prevents the menu from closing on the click that opened it
    pub just_opened: bool,
}

/// Pending confirmation actions gated on unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is creating a new flowsheet
    New,
    /// User is opening a file
    Open,
    /// User is quitting the application
    Quit,
}

/// File operation state: current path and unsaved-changes tracking.
#[derive(Default)]
pub struct FileState {
    /// Path of the last save/open, if any
    pub current_path: Option<std::path::PathBuf>,
    /// Whether the flowsheet has been modified since the last save
    pub has_unsaved_changes: bool,
    /// Whether the unsaved-changes confirmation dialog is showing
    pub show_unsaved_dialog: bool,
    /// The action awaiting confirmation
    pub pending_confirm_action: Option<PendingConfirmAction>,
    /// One-shot flag allowing the next close request through after the user
    /// confirmed discarding changes
    pub allow_close_on_next_request: bool,
}

/// The main application: flowsheet model, canvas view, and UI state.
///
/// Implements `eframe::App`; UI preferences survive restarts through eframe
/// storage while gesture and file state stay transient.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FlowsheetApp {
    /// The flowsheet being edited
    pub flowsheet: Flowsheet,
    /// Pan/zoom state
    pub view: CanvasView,
    /// Active interaction mode
    #[serde(skip)]
    pub mode: Mode,
    /// Current selection
    #[serde(skip)]
    pub selection: SelectionState,
    /// Right-click context menu state
    #[serde(skip)]
    pub context_menu: ContextMenuState,
    /// File operation state
    #[serde(skip)]
    pub file: FileState,
    /// Strategy assigning kind/label/port to new connections
    #[serde(skip)]
    pub port_policy: Box<dyn PortPolicy>,
    /// Whether the grid is drawn behind the diagram
    pub show_grid: bool,
    /// Whether primary-drag pans the canvas instead of interacting with units
    pub pan_mode: bool,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Counter for generating default unit labels
    pub unit_counter: u32,
    /// Canvas rectangle captured on the last frame, used by fit-to-contents
    #[serde(skip)]
    pub canvas_rect: egui::Rect,
}

impl Default for FlowsheetApp {
    fn default() -> Self {
        Self {
            flowsheet: Flowsheet::default(),
            view: CanvasView::default(),
            mode: Mode::Idle,
            selection: SelectionState::default(),
            context_menu: ContextMenuState::default(),
            file: FileState::default(),
            port_policy: Box::new(BranchingPortPolicy),
            show_grid: true,
            pan_mode: false,
            dark_mode: true,
            unit_counter: 0,
            canvas_rect: egui::Rect::ZERO,
        }
    }
}

impl FlowsheetApp {
    /// Serializes the persistable app state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes app state from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Marks the flowsheet as modified since the last save.
    pub fn mark_dirty(&mut self) {
        self.file.has_unsaved_changes = true;
    }
}
