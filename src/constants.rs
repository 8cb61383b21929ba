//! Shared application-wide constants.
//! Centralizes tweakable values used across canvas geometry, routing and rendering.

// Canvas view
/// Multiplier applied to the scale factor per zoom step (keyboard/toolbar).
pub const ZOOM_STEP: f32 = 1.1;
/// Lower bound on the scale factor; guards against floating underflow after
/// repeated zoom-out (the transform divides by scale).
pub const MIN_SCALE: f32 = 1e-3;
/// Margin (in logical units) added around the content bounding box by fit-to-contents.
pub const FIT_MARGIN: f32 = 40.0;

// Grid
/// Grid cell size in logical units.
pub const GRID_SIZE: f32 = 20.0;

// Units
/// Minimum unit width/height in logical units; resize gestures clamp here.
pub const MIN_UNIT_SIZE: f32 = 1.0;
/// Side length (screen pixels) of the square corner handles used for resizing.
pub const CORNER_HANDLE: f32 = 10.0;
/// Offset (logical units) applied to a duplicated unit so it does not
/// land exactly on top of the original.
pub const DUPLICATE_OFFSET: f32 = 20.0;

// Connection routing (all in screen pixels)
/// Minimum horizontal clearance from a unit edge before the path turns.
pub const ROUTE_OFFSET: f32 = 24.0;
/// Vertical/horizontal clearance used to route around unit bodies on loopbacks.
pub const ROUTE_GAP: f32 = 60.0;
/// Length of the arrowhead wings.
pub const ARROW_LEN: f32 = 12.0;
/// Half-angle between an arrowhead wing and the reversed final segment, radians.
pub const ARROW_ANGLE: f32 = std::f32::consts::PI / 6.0;

// Hit-testing
/// Maximum distance (screen pixels) from a routed path at which a click
/// still selects the connection.
pub const HIT_THRESHOLD: f32 = 8.0;
