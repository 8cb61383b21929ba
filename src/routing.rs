//! Orthogonal connection routing and path geometry helpers.
//!
//! Everything in this module is a pure function of screen-space rectangles
//! and points: routing is recomputed from current unit geometry every frame,
//! so paths can never go stale against a moved or resized unit.
//!
//! Paths leave the source rectangle at its right edge and enter the target at
//! its left-center. A forward route (target clearly to the right) is an elbow
//! through either the target's level or the vertical midpoint; a loopback
//! route (target behind or overlapping the source) detours over the top of
//! both rectangles and swings around the target's left side, so the path
//! never crosses either unit's body.

use eframe::egui::{self, Pos2, Rect, Vec2};

use crate::constants::{ARROW_ANGLE, ARROW_LEN, ROUTE_GAP, ROUTE_OFFSET};

/// Attachment point on the source rectangle's right edge for the given port.
///
/// Ports are spread evenly down the edge so multiple outputs fan out without
/// overlapping; a single-port unit attaches at the right-center.
pub fn start_anchor(rect: Rect, port: u32, total_ports: u32) -> Pos2 {
    let total = total_ports.max(1) as f32;
    let frac = (port as f32 + 1.0) / (total + 1.0);
    egui::pos2(rect.max.x, rect.min.y + rect.height() * frac)
}

/// Attachment point on the target rectangle: its left-center.
pub fn end_anchor(rect: Rect) -> Pos2 {
    rect.left_center()
}

/// Routes a connection between two unit rectangles.
///
/// Deterministic: identical geometry always yields the identical polyline.
pub fn route_path(start_rect: Rect, end_rect: Rect, port: u32, total_ports: u32) -> Vec<Pos2> {
    route(start_rect, end_rect, start_anchor(start_rect, port, total_ports))
}

/// Routes a live preview from a unit to the cursor, treated as a degenerate
/// target rectangle. Used only while a connect gesture is in progress.
pub fn route_preview(start_rect: Rect, cursor: Pos2, port: u32, total_ports: u32) -> Vec<Pos2> {
    let cursor_rect = Rect::from_center_size(cursor, Vec2::ZERO);
    route(start_rect, cursor_rect, start_anchor(start_rect, port, total_ports))
}

fn route(start_rect: Rect, end_rect: Rect, start: Pos2) -> Vec<Pos2> {
    let end = end_anchor(end_rect);
    let points = if start.x < end.x - ROUTE_OFFSET {
        forward_route(start, end)
    } else {
        loopback_route(start_rect, end_rect, start, end)
    };
    dedup_consecutive(points)
}

/// Target is clearly to the right: leave horizontally, elbow over, approach
/// horizontally.
fn forward_route(start: Pos2, end: Pos2) -> Vec<Pos2> {
    let sx = start.x + ROUTE_OFFSET;
    let ex = end.x - ROUTE_OFFSET;
    if (end.y - start.y).abs() < 2.0 * ROUTE_OFFSET {
        // Close vertically: single direct elbow at the exit clearance
        vec![
            start,
            egui::pos2(sx, start.y),
            egui::pos2(sx, end.y),
            egui::pos2(ex, end.y),
            end,
        ]
    } else {
        // Step through the vertical midpoint between the two endpoints
        let mid_y = (start.y + end.y) / 2.0;
        vec![
            start,
            egui::pos2(sx, start.y),
            egui::pos2(sx, mid_y),
            egui::pos2(ex, mid_y),
            egui::pos2(ex, end.y),
            end,
        ]
    }
}

/// Target is behind or overlapping the source: climb above the topmost edge
/// of both rectangles, travel left past the target, then drop to its level.
fn loopback_route(start_rect: Rect, end_rect: Rect, start: Pos2, end: Pos2) -> Vec<Pos2> {
    let sx = start.x + ROUTE_OFFSET;
    let clear_y = start_rect.min.y.min(end_rect.min.y) - ROUTE_GAP;
    let swing_x = end_rect.min.x - ROUTE_GAP;
    vec![
        start,
        egui::pos2(sx, start.y),
        egui::pos2(sx, clear_y),
        egui::pos2(swing_x, clear_y),
        egui::pos2(swing_x, end.y),
        egui::pos2(end.x - ROUTE_OFFSET, end.y),
        end,
    ]
}

fn dedup_consecutive(points: Vec<Pos2>) -> Vec<Pos2> {
    let mut out: Vec<Pos2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|last| (*last - p).length() > f32::EPSILON) {
            out.push(p);
        }
    }
    out
}

/// Arrowhead for the final segment of a path: the tip plus two wings at
/// ±[`ARROW_ANGLE`] from the reversed segment direction.
///
/// Returns `None` for paths with no nonzero-length final segment.
pub fn arrowhead(path: &[Pos2]) -> Option<[Pos2; 3]> {
    let tip = *path.last()?;
    let prev = path
        .iter()
        .rev()
        .find(|p| (**p - tip).length() > f32::EPSILON)?;
    let back = (*prev - tip) / (*prev - tip).length();
    Some([
        tip,
        tip + rotate(back, ARROW_ANGLE) * ARROW_LEN,
        tip + rotate(back, -ARROW_ANGLE) * ARROW_LEN,
    ])
}

fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Distance from a point to a line segment, via projection clamped to the
/// segment parameter range [0, 1].
pub fn point_to_segment_distance(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let seg = b - a;
    let to_point = point - a;
    let len_sq = seg.length_sq();
    if len_sq < 1e-8 {
        // Segment is essentially a point
        return to_point.length();
    }
    let t = (to_point.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).length()
}

/// Whether `point` lies within `threshold` of the routed path.
///
/// A cheap containment test against the path's threshold-expanded bounding
/// region rejects far-away points before the per-segment distance check.
pub fn path_hit(path: &[Pos2], point: Pos2, threshold: f32) -> bool {
    if path.len() < 2 {
        return false;
    }
    let slack = threshold + 1e-4;
    let mut bounds = Rect::from_min_max(path[0], path[0]);
    for p in path {
        bounds.extend_with(*p);
    }
    if !bounds.expand(slack).contains(point) {
        return false;
    }
    path.windows(2)
        .any(|seg| point_to_segment_distance(point, seg[0], seg[1]) <= slack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(pos: (f32, f32), size: (f32, f32)) -> Rect {
        Rect::from_min_size(egui::pos2(pos.0, pos.1), egui::vec2(size.0, size.1))
    }

    #[test]
    fn test_forward_route_between_side_by_side_units() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let b = rect((300.0, 0.0), (100.0, 50.0));
        let path = route_path(a, b, 0, 1);

        // Leaves the right-center of A, enters the left-center of B
        assert_eq!(path[0], egui::pos2(100.0, 25.0));
        assert_eq!(*path.last().unwrap(), egui::pos2(300.0, 25.0));

        // Horizontal clearance of ROUTE_OFFSET at both ends
        assert_eq!(path[1], egui::pos2(100.0 + ROUTE_OFFSET, 25.0));
        assert_eq!(path[path.len() - 2], egui::pos2(300.0 - ROUTE_OFFSET, 25.0));

        // Forward, not loopback: never rises above either rectangle
        assert!(path.iter().all(|p| p.y >= 0.0));
    }

    #[test]
    fn test_route_switches_to_loopback_when_target_moves_behind() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let behind = rect((-50.0, 0.0), (100.0, 50.0));
        let path = route_path(a, behind, 0, 1);

        // Contains a vertical excursion clearing both tops by at least the gap
        let min_y = path.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        assert!(min_y <= 0.0 - ROUTE_GAP + 1e-3, "min_y = {min_y}");

        // Swings past the target's left edge by the gap
        let min_x = path.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        assert!(min_x <= -50.0 - ROUTE_GAP + 1e-3, "min_x = {min_x}");

        // Still ends at the target's left-center
        assert_eq!(*path.last().unwrap(), egui::pos2(-50.0, 25.0));
    }

    #[test]
    fn test_forward_route_uses_midpoint_elbow_for_large_dy() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let b = rect((300.0, 200.0), (100.0, 50.0));
        let path = route_path(a, b, 0, 1);
        let mid_y = (25.0 + 225.0) / 2.0;
        assert!(path.iter().any(|p| (p.y - mid_y).abs() < 1e-3));
    }

    #[test]
    fn test_route_is_deterministic() {
        let a = rect((10.0, -40.0), (120.0, 80.0));
        let b = rect((-200.0, 30.0), (90.0, 60.0));
        assert_eq!(route_path(a, b, 0, 1), route_path(a, b, 0, 1));
        assert_eq!(route_path(b, a, 2, 3), route_path(b, a, 2, 3));
    }

    #[test]
    fn test_ports_fan_out_down_the_right_edge() {
        let r = rect((0.0, 0.0), (80.0, 80.0));
        let p0 = start_anchor(r, 0, 3);
        let p1 = start_anchor(r, 1, 3);
        let p2 = start_anchor(r, 2, 3);
        assert_eq!(p0.x, 80.0);
        assert!(p0.y < p1.y && p1.y < p2.y);
        assert_eq!(p1.y, 40.0);
    }

    #[test]
    fn test_preview_routes_to_cursor() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let path = route_preview(a, egui::pos2(400.0, 25.0), 0, 1);
        assert_eq!(*path.last().unwrap(), egui::pos2(400.0, 25.0));
        // Cursor behind the source flips the preview into the loopback branch
        let back = route_preview(a, egui::pos2(-100.0, 25.0), 0, 1);
        let min_y = back.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        assert!(min_y <= -ROUTE_GAP + 1e-3);
    }

    #[test]
    fn test_arrowhead_points_along_final_segment() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let b = rect((300.0, 0.0), (100.0, 50.0));
        let path = route_path(a, b, 0, 1);
        let [tip, w1, w2] = arrowhead(&path).unwrap();

        assert_eq!(tip, egui::pos2(300.0, 25.0));
        // Final segment is left-to-right, so both wings trail behind the tip
        for wing in [w1, w2] {
            assert!(wing.x < tip.x);
            assert!(((wing - tip).length() - ARROW_LEN).abs() < 1e-3);
        }
        // Wings sit at ±30 degrees off the reversed direction
        assert!((w1.y - (tip.y + ARROW_LEN * ARROW_ANGLE.sin())).abs() < 1e-3);
        assert!((w2.y - (tip.y - ARROW_LEN * ARROW_ANGLE.sin())).abs() < 1e-3);
    }

    #[test]
    fn test_arrowhead_degenerate_path() {
        assert!(arrowhead(&[]).is_none());
        let p = egui::pos2(5.0, 5.0);
        assert!(arrowhead(&[p, p]).is_none());
    }

    #[test]
    fn test_segment_distance_projection() {
        let a = egui::pos2(0.0, 0.0);
        let b = egui::pos2(10.0, 0.0);
        assert!((point_to_segment_distance(egui::pos2(5.0, 3.0), a, b) - 3.0).abs() < 1e-5);
        // Beyond the endpoints the distance is to the nearest endpoint
        assert!((point_to_segment_distance(egui::pos2(14.0, 3.0), a, b) - 5.0).abs() < 1e-5);
        // Degenerate segment
        assert!((point_to_segment_distance(egui::pos2(3.0, 4.0), a, a) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_path_hit_symmetry() {
        let a = rect((0.0, 0.0), (100.0, 50.0));
        let b = rect((300.0, 0.0), (100.0, 50.0));
        let path = route_path(a, b, 0, 1);

        // A point exactly on a segment is found even with threshold 0
        let on_path = egui::pos2(200.0, 25.0);
        assert!(path_hit(&path, on_path, 0.0));

        // A point threshold + 1 away is not found
        let threshold = crate::constants::HIT_THRESHOLD;
        let off_path = egui::pos2(200.0, 25.0 + threshold + 1.0);
        assert!(!path_hit(&path, off_path, threshold));
    }
}
