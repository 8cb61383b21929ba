//! Core data types for the flowsheet editor.
//!
//! Defines units (placed equipment nodes), connections (directed, typed edges
//! between units), the port-assignment policy seam, and the [`Flowsheet`]
//! aggregate that owns both.

use eframe::egui;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DUPLICATE_OFFSET, MIN_UNIT_SIZE};

/// Unique identifier for flowsheet units.
pub type UnitId = Uuid;

/// The kind of equipment a unit represents.
///
/// Doubles as the unit's visual: each kind maps to a vector glyph drawn by the
/// render pass, so diagrams stay resolution independent under zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Primary crushing stage
    JawCrusher,
    /// Grinding mill
    BallMill,
    /// Size classification screen
    VibratingScreen,
    /// Froth flotation cell
    FlotationCell,
    /// Dewatering thickener
    Thickener,
    /// Branching unit that routes material along conditional outputs
    Splitter,
}

impl UnitKind {
    /// All kinds, in the order they appear in the palette.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::JawCrusher,
        UnitKind::BallMill,
        UnitKind::VibratingScreen,
        UnitKind::FlotationCell,
        UnitKind::Thickener,
        UnitKind::Splitter,
    ];

    /// Human-readable name, used for default unit labels and palette entries.
    pub fn display_name(&self) -> &'static str {
        match self {
            UnitKind::JawCrusher => "Jaw Crusher",
            UnitKind::BallMill => "Ball Mill",
            UnitKind::VibratingScreen => "Vibrating Screen",
            UnitKind::FlotationCell => "Flotation Cell",
            UnitKind::Thickener => "Thickener",
            UnitKind::Splitter => "Splitter",
        }
    }

    /// Baseline dimensions in logical units, before any user resizing.
    pub fn base_size(&self) -> (f32, f32) {
        match self {
            UnitKind::Splitter => (80.0, 80.0),
            UnitKind::Thickener => (110.0, 60.0),
            _ => (100.0, 70.0),
        }
    }

    /// Whether this kind produces multiple conditional outputs.
    pub fn is_branching(&self) -> bool {
        matches!(self, UnitKind::Splitter)
    }
}

/// One of the four corners of a unit rectangle, used during resize gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-left corner
    BottomLeft,
    /// Bottom-right corner
    BottomRight,
}

impl Corner {
    /// All corners, in hit-test order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The diagonally opposite corner — the one that stays fixed while this
    /// corner is dragged.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// The position of this corner on the given rectangle.
    pub fn point_of(&self, rect: egui::Rect) -> egui::Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }
}

/// A placed equipment node on the flowsheet.
///
/// `position` is the top-left corner in logical (zoom/pan independent)
/// coordinates and is the single source of truth for placement; the screen
/// position is always derived through the canvas view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier, stable for the unit's lifetime
    pub id: UnitId,
    /// Equipment kind; also selects the rendered glyph
    pub kind: UnitKind,
    /// Display label shown below the glyph
    pub label: String,
    /// Top-left corner in logical coordinates
    pub position: (f32, f32),
    /// Current dimensions in logical units; both components stay positive
    pub size: (f32, f32),
    /// Baseline dimensions from the palette, restored by reset-size
    pub base_size: (f32, f32),
    /// Explicit z-order; higher values render on top
    pub z: u32,
}

impl Unit {
    /// Creates a new unit of the given kind at the given logical position,
    /// sized to the kind's baseline dimensions.
    pub fn new(kind: UnitKind, label: String, position: (f32, f32)) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label,
            position,
            size: kind.base_size(),
            base_size: kind.base_size(),
            z: 0,
        }
    }

    /// The unit's rectangle in logical coordinates.
    pub fn logical_rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(self.position.0, self.position.1),
            egui::vec2(self.size.0, self.size.1),
        )
    }
}

/// Rendering/semantic tag for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Material/data flow, drawn as a solid line
    Data,
    /// Conditional action flow, drawn as a dashed line
    Action,
}

/// A directed edge between two units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// ID of the source unit
    pub from: UnitId,
    /// ID of the destination unit
    pub to: UnitId,
    /// Line style tag, assigned by the port policy
    pub kind: ConnectionKind,
    /// Optional label rendered near the start endpoint
    pub label: Option<String>,
    /// Output port index on the source unit
    pub port: u32,
    /// Total output ports on the source unit, used to fan edges out
    pub total_ports: u32,
}

/// The kind/label/port assignment a [`PortPolicy`] hands back for a new
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAssignment {
    /// Line style for the new connection
    pub kind: ConnectionKind,
    /// Optional label for the new connection
    pub label: Option<String>,
    /// Output port index
    pub port: u32,
    /// Source unit's total output port count
    pub total_ports: u32,
}

/// Strategy for assigning kind, label and port to a new outgoing connection.
///
/// Encodes domain-specific branching semantics, so it is injected rather than
/// hardcoded in the graph; `outgoing` is the number of connections already
/// leaving the source unit.
pub trait PortPolicy {
    /// Computes the assignment for the next connection leaving `source`.
    fn assign(&self, source: &Unit, outgoing: usize) -> PortAssignment;
}

/// Labels for the three conditional outputs of a branching unit.
const BRANCH_LABELS: [&str; 3] = ["if(u1>0)", "elseif(u2>0)", "else"];

/// Default port policy: branching units get dashed `Action` edges cycling
/// through three labeled ports, everything else gets a single unlabeled
/// `Data` edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct BranchingPortPolicy;

impl PortPolicy for BranchingPortPolicy {
    fn assign(&self, source: &Unit, outgoing: usize) -> PortAssignment {
        if source.kind.is_branching() {
            let port = (outgoing % BRANCH_LABELS.len()) as u32;
            PortAssignment {
                kind: ConnectionKind::Action,
                label: Some(BRANCH_LABELS[port as usize].to_string()),
                port,
                total_ports: BRANCH_LABELS.len() as u32,
            }
        } else {
            PortAssignment {
                kind: ConnectionKind::Data,
                label: None,
                port: 0,
                total_ports: 1,
            }
        }
    }
}

/// Reasons a connection cannot be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// Source and target are the same unit
    SelfLoop,
    /// One of the endpoints does not exist
    MissingUnit,
    /// A connection with the same source, target and port already exists
    Duplicate,
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::SelfLoop => write!(f, "a unit cannot connect to itself"),
            ConnectError::MissingUnit => write!(f, "connection endpoint does not exist"),
            ConnectError::Duplicate => write!(f, "connection already exists on this port"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// The flowsheet aggregate: unit registry plus connection graph.
///
/// Units live in a `Vec` arena referenced by id. Vec order is insertion order
/// and is the documented tie-break order for hit-testing; draw order is the
/// explicit per-unit `z` field instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flowsheet {
    /// All placed units, in insertion order
    pub units: Vec<Unit>,
    /// All connections between units
    pub connections: Vec<Connection>,
    /// Next z value handed out by `raise`
    next_z: u32,
}

impl Flowsheet {
    /// Creates an empty flowsheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the flowsheet to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a flowsheet from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut sheet: Flowsheet = serde_json::from_str(json)?;
        // Restore the z counter above anything stored in the file
        sheet.next_z = sheet.units.iter().map(|u| u.z + 1).max().unwrap_or(0);
        Ok(sheet)
    }

    /// Looks up a unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Looks up a unit by id, mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Registers a unit and raises it above everything else.
    ///
    /// Returns the unit's id.
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        unit.z = self.next_z;
        self.next_z += 1;
        let id = unit.id;
        self.units.push(unit);
        id
    }

    /// Moves a unit to a new logical position. No-op for unknown ids.
    pub fn move_unit(&mut self, id: UnitId, position: (f32, f32)) {
        if let Some(unit) = self.unit_mut(id) {
            unit.position = position;
        }
    }

    /// Resizes a unit by dragging `corner` to `target` (logical coordinates)
    /// while the diagonally opposite corner stays fixed.
    ///
    /// Width and height are clamped to [`MIN_UNIT_SIZE`], so a gesture that
    /// would collapse or invert the rectangle degenerates to the minimum size
    /// instead.
    pub fn resize_unit(&mut self, id: UnitId, corner: Corner, target: egui::Pos2) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        let fixed = corner.opposite().point_of(unit.logical_rect());
        let (w, h, x, y) = match corner {
            Corner::TopLeft => {
                let w = (fixed.x - target.x).max(MIN_UNIT_SIZE);
                let h = (fixed.y - target.y).max(MIN_UNIT_SIZE);
                (w, h, fixed.x - w, fixed.y - h)
            }
            Corner::TopRight => {
                let w = (target.x - fixed.x).max(MIN_UNIT_SIZE);
                let h = (fixed.y - target.y).max(MIN_UNIT_SIZE);
                (w, h, fixed.x, fixed.y - h)
            }
            Corner::BottomLeft => {
                let w = (fixed.x - target.x).max(MIN_UNIT_SIZE);
                let h = (target.y - fixed.y).max(MIN_UNIT_SIZE);
                (w, h, fixed.x - w, fixed.y)
            }
            Corner::BottomRight => {
                let w = (target.x - fixed.x).max(MIN_UNIT_SIZE);
                let h = (target.y - fixed.y).max(MIN_UNIT_SIZE);
                (w, h, fixed.x, fixed.y)
            }
        };
        unit.position = (x, y);
        unit.size = (w, h);
    }

    /// Restores a unit's baseline dimensions, keeping its top-left corner.
    pub fn reset_unit_size(&mut self, id: UnitId) {
        if let Some(unit) = self.unit_mut(id) {
            unit.size = unit.base_size;
        }
    }

    /// Removes a unit and every connection touching it.
    ///
    /// Returns `true` if the unit existed. The cascade is unconditional so no
    /// dangling edges can survive a delete.
    pub fn remove_unit(&mut self, id: UnitId) -> bool {
        let before = self.units.len();
        self.units.retain(|u| u.id != id);
        let removed = self.units.len() != before;
        if removed {
            self.connections.retain(|c| c.from != id && c.to != id);
        }
        removed
    }

    /// Raises a unit above all others by giving it a fresh top z value.
    pub fn raise(&mut self, id: UnitId) {
        let z = self.next_z;
        if let Some(unit) = self.unit_mut(id) {
            unit.z = z;
            self.next_z += 1;
        }
    }

    /// Clones a unit with a fresh id, slightly offset from the original.
    ///
    /// Returns the new unit's id, or `None` for unknown ids.
    pub fn duplicate(&mut self, id: UnitId) -> Option<UnitId> {
        let mut copy = self.unit(id)?.clone();
        copy.id = Uuid::new_v4();
        copy.position.0 += DUPLICATE_OFFSET;
        copy.position.1 += DUPLICATE_OFFSET;
        Some(self.add_unit(copy))
    }

    /// Number of connections currently leaving the given unit.
    pub fn outgoing_count(&self, id: UnitId) -> usize {
        self.connections.iter().filter(|c| c.from == id).count()
    }

    /// Creates a connection from `from` to `to`, with kind, label and port
    /// assigned by `policy`.
    pub fn connect(
        &mut self,
        from: UnitId,
        to: UnitId,
        policy: &dyn PortPolicy,
    ) -> Result<(), ConnectError> {
        if from == to {
            return Err(ConnectError::SelfLoop);
        }
        if self.unit(to).is_none() {
            return Err(ConnectError::MissingUnit);
        }
        let source = self.unit(from).ok_or(ConnectError::MissingUnit)?;
        let assignment = policy.assign(source, self.outgoing_count(from));
        let duplicate = self
            .connections
            .iter()
            .any(|c| c.from == from && c.to == to && c.port == assignment.port);
        if duplicate {
            return Err(ConnectError::Duplicate);
        }
        self.connections.push(Connection {
            from,
            to,
            kind: assignment.kind,
            label: assignment.label,
            port: assignment.port,
            total_ports: assignment.total_ports,
        });
        Ok(())
    }

    /// Removes the connection at `index`. No-op if out of range.
    pub fn remove_connection(&mut self, index: usize) {
        if index < self.connections.len() {
            self.connections.remove(index);
        }
    }

    /// Logical bounding box of all units, or `None` for an empty flowsheet.
    pub fn bounding_rect(&self) -> Option<egui::Rect> {
        let mut rects = self.units.iter().map(|u| u.logical_rect());
        let first = rects.next()?;
        Some(rects.fold(first, |acc, r| acc.union(r)))
    }

    /// Units in draw order: lowest z first, so higher z paints on top.
    pub fn units_by_z(&self) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.iter().collect();
        units.sort_by_key(|u| u.z);
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(kind: UnitKind, pos: (f32, f32)) -> Unit {
        Unit::new(kind, kind.display_name().to_string(), pos)
    }

    #[test]
    fn test_unit_creation() {
        let unit = unit_at(UnitKind::BallMill, (100.0, 200.0));
        assert_eq!(unit.position, (100.0, 200.0));
        assert_eq!(unit.size, UnitKind::BallMill.base_size());
        assert_eq!(unit.size, unit.base_size);
        assert!(!unit.id.is_nil());
    }

    #[test]
    fn test_remove_unit_cascades_connections() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        let b = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, 0.0)));
        let c = sheet.add_unit(unit_at(UnitKind::Thickener, (400.0, 0.0)));
        let policy = BranchingPortPolicy;
        sheet.connect(a, b, &policy).unwrap();
        sheet.connect(b, c, &policy).unwrap();
        sheet.connect(a, c, &policy).unwrap();
        assert_eq!(sheet.connections.len(), 3);

        assert!(sheet.remove_unit(b));

        assert!(sheet
            .connections
            .iter()
            .all(|conn| conn.from != b && conn.to != b));
        assert_eq!(sheet.connections.len(), 1);
        // The surviving connection's endpoints are untouched
        assert_eq!(sheet.connections[0].from, a);
        assert_eq!(sheet.connections[0].to, c);
    }

    #[test]
    fn test_remove_nonexistent_unit() {
        let mut sheet = Flowsheet::new();
        assert!(!sheet.remove_unit(Uuid::new_v4()));
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        assert_eq!(
            sheet.connect(a, a, &BranchingPortPolicy),
            Err(ConnectError::SelfLoop)
        );
    }

    #[test]
    fn test_connect_rejects_missing_endpoint() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        assert_eq!(
            sheet.connect(a, Uuid::new_v4(), &BranchingPortPolicy),
            Err(ConnectError::MissingUnit)
        );
        assert_eq!(
            sheet.connect(Uuid::new_v4(), a, &BranchingPortPolicy),
            Err(ConnectError::MissingUnit)
        );
    }

    #[test]
    fn test_connect_rejects_duplicate_port() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        let b = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, 0.0)));
        sheet.connect(a, b, &BranchingPortPolicy).unwrap();
        assert_eq!(
            sheet.connect(a, b, &BranchingPortPolicy),
            Err(ConnectError::Duplicate)
        );
        assert_eq!(sheet.connections.len(), 1);
    }

    #[test]
    fn test_branching_policy_cycles_ports() {
        let mut sheet = Flowsheet::new();
        let splitter = sheet.add_unit(unit_at(UnitKind::Splitter, (0.0, 0.0)));
        let t1 = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, -100.0)));
        let t2 = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, 0.0)));
        let t3 = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, 100.0)));
        let policy = BranchingPortPolicy;
        sheet.connect(splitter, t1, &policy).unwrap();
        sheet.connect(splitter, t2, &policy).unwrap();
        sheet.connect(splitter, t3, &policy).unwrap();

        let ports: Vec<u32> = sheet.connections.iter().map(|c| c.port).collect();
        assert_eq!(ports, vec![0, 1, 2]);
        assert!(sheet
            .connections
            .iter()
            .all(|c| c.kind == ConnectionKind::Action && c.total_ports == 3));
        assert_eq!(sheet.connections[0].label.as_deref(), Some("if(u1>0)"));
        assert_eq!(sheet.connections[1].label.as_deref(), Some("elseif(u2>0)"));
        assert_eq!(sheet.connections[2].label.as_deref(), Some("else"));
    }

    #[test]
    fn test_plain_units_get_single_data_port() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        let b = sheet.add_unit(unit_at(UnitKind::BallMill, (200.0, 0.0)));
        sheet.connect(a, b, &BranchingPortPolicy).unwrap();
        let conn = &sheet.connections[0];
        assert_eq!(conn.kind, ConnectionKind::Data);
        assert_eq!(conn.label, None);
        assert_eq!(conn.port, 0);
        assert_eq!(conn.total_ports, 1);
    }

    #[test]
    fn test_resize_bottom_right_monotonic_and_clamped() {
        let mut sheet = Flowsheet::new();
        let id = sheet.add_unit(unit_at(UnitKind::BallMill, (10.0, 10.0)));
        let base = sheet.unit(id).unwrap().size;

        // Dragging right/down grows the rect
        let grow = egui::pos2(10.0 + base.0 + 50.0, 10.0 + base.1 + 30.0);
        sheet.resize_unit(id, Corner::BottomRight, grow);
        let grown = sheet.unit(id).unwrap();
        assert_eq!(grown.size, (base.0 + 50.0, base.1 + 30.0));
        assert_eq!(grown.position, (10.0, 10.0));

        // Dragging past the fixed corner clamps to the minimum, never inverts
        sheet.resize_unit(id, Corner::BottomRight, egui::pos2(-500.0, -500.0));
        let clamped = sheet.unit(id).unwrap();
        assert_eq!(clamped.size, (MIN_UNIT_SIZE, MIN_UNIT_SIZE));
        assert_eq!(clamped.position, (10.0, 10.0));
        assert!(clamped.size.0 > 0.0 && clamped.size.1 > 0.0);
    }

    #[test]
    fn test_resize_top_left_keeps_bottom_right_fixed() {
        let mut sheet = Flowsheet::new();
        let id = sheet.add_unit(unit_at(UnitKind::BallMill, (0.0, 0.0)));
        let fixed = sheet.unit(id).unwrap().logical_rect().right_bottom();

        sheet.resize_unit(id, Corner::TopLeft, egui::pos2(-40.0, -20.0));
        let rect = sheet.unit(id).unwrap().logical_rect();
        assert_eq!(rect.right_bottom(), fixed);
        assert_eq!(rect.min, egui::pos2(-40.0, -20.0));
    }

    #[test]
    fn test_reset_unit_size_restores_baseline() {
        let mut sheet = Flowsheet::new();
        let id = sheet.add_unit(unit_at(UnitKind::FlotationCell, (0.0, 0.0)));
        sheet.resize_unit(id, Corner::BottomRight, egui::pos2(300.0, 300.0));
        assert_ne!(sheet.unit(id).unwrap().size, UnitKind::FlotationCell.base_size());
        sheet.reset_unit_size(id);
        assert_eq!(sheet.unit(id).unwrap().size, UnitKind::FlotationCell.base_size());
    }

    #[test]
    fn test_raise_puts_unit_on_top() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        let b = sheet.add_unit(unit_at(UnitKind::BallMill, (10.0, 10.0)));
        assert!(sheet.unit(b).unwrap().z > sheet.unit(a).unwrap().z);

        sheet.raise(a);
        assert!(sheet.unit(a).unwrap().z > sheet.unit(b).unwrap().z);
        let order = sheet.units_by_z();
        assert_eq!(order.last().unwrap().id, a);
    }

    #[test]
    fn test_duplicate_offsets_copy() {
        let mut sheet = Flowsheet::new();
        let a = sheet.add_unit(unit_at(UnitKind::BallMill, (5.0, 5.0)));
        let copy = sheet.duplicate(a).unwrap();
        assert_ne!(copy, a);
        let dup = sheet.unit(copy).unwrap();
        assert_eq!(dup.position, (5.0 + DUPLICATE_OFFSET, 5.0 + DUPLICATE_OFFSET));
        assert_eq!(dup.kind, UnitKind::BallMill);
        // The copy renders on top
        assert!(dup.z > sheet.unit(a).unwrap().z);
    }

    #[test]
    fn test_bounding_rect() {
        let mut sheet = Flowsheet::new();
        assert!(sheet.bounding_rect().is_none());
        sheet.add_unit(unit_at(UnitKind::JawCrusher, (0.0, 0.0)));
        sheet.add_unit(unit_at(UnitKind::BallMill, (300.0, 100.0)));
        let rect = sheet.bounding_rect().unwrap();
        assert_eq!(rect.min, egui::pos2(0.0, 0.0));
        let mill = UnitKind::BallMill.base_size();
        assert_eq!(rect.max, egui::pos2(300.0 + mill.0, 100.0 + mill.1));
    }

    #[test]
    fn test_flowsheet_roundtrip_serialization() {
        let mut original = Flowsheet::new();
        let a = original.add_unit(unit_at(UnitKind::Splitter, (0.0, 0.0)));
        let b = original.add_unit(unit_at(UnitKind::Thickener, (250.0, 40.0)));
        original.connect(a, b, &BranchingPortPolicy).unwrap();

        let json = original.to_json().unwrap();
        let restored = Flowsheet::from_json(&json).unwrap();

        assert_eq!(restored.units.len(), 2);
        assert_eq!(restored.connections.len(), 1);
        assert_eq!(restored.connections[0].from, a);
        assert_eq!(restored.connections[0].to, b);
        assert_eq!(restored.connections[0].kind, ConnectionKind::Action);

        // A unit added after the round trip still lands on top
        let c = {
            let mut restored = restored;
            let c = restored.add_unit(unit_at(UnitKind::BallMill, (0.0, 200.0)));
            assert_eq!(restored.units_by_z().last().unwrap().id, c);
            c
        };
        assert!(!c.is_nil());
    }
}
