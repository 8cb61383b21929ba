//! The render pass: a pure function from model + view to draw commands,
//! plus the thin egui painter that executes them.
//!
//! Splitting frame construction from painting keeps layering and geometry
//! testable without a windowing context, and guarantees every frame is built
//! from one consistent snapshot of the model.

use eframe::egui::{self, Pos2, Rect};

use super::state::{Mode, SelectionState};
use crate::constants::GRID_SIZE;
use crate::routing;
use crate::types::{ConnectionKind, Flowsheet, UnitKind};
use crate::view::CanvasView;

/// One drawing primitive for the current frame, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Background grid line
    GridLine {
        /// Segment start
        from: Pos2,
        /// Segment end
        to: Pos2,
        /// Whether this is an axis line (x=0 or y=0), drawn heavier
        axis: bool,
    },
    /// Routed connection polyline
    ConnectionPath {
        /// Polyline control points
        points: Vec<Pos2>,
        /// Solid (data) or dashed (action)
        kind: ConnectionKind,
        /// Whether the connection is selected
        selected: bool,
    },
    /// Filled arrowhead triangle on a connection's final segment
    Arrowhead {
        /// Tip and two wing points
        points: [Pos2; 3],
        /// Matches the owning connection's kind for coloring
        kind: ConnectionKind,
        /// Whether the owning connection is selected
        selected: bool,
    },
    /// Connection label near the start endpoint
    ConnectionLabel {
        /// Anchor position
        pos: Pos2,
        /// Label text
        text: String,
        /// Font size in screen points
        font_size: f32,
    },
    /// Live preview polyline for an in-progress connect gesture
    PreviewPath {
        /// Polyline control points
        points: Vec<Pos2>,
    },
    /// A unit's body rectangle and glyph
    UnitBody {
        /// Screen rectangle
        rect: Rect,
        /// Glyph kind
        kind: UnitKind,
        /// Whether the unit is selected (highlight border + corner handles)
        selected: bool,
        /// Whether the unit is mid drag or resize
        active: bool,
    },
    /// A unit's display label, centered below its body
    UnitLabel {
        /// Anchor position (top-center of the text)
        pos: Pos2,
        /// Label text
        text: String,
        /// Font size in screen points
        font_size: f32,
    },
}

/// Builds the complete draw-command list for one frame.
///
/// Pure and deterministic: the same model, view and viewport always yield
/// the same commands in the same order. Layering is grid, then connections,
/// then the connect preview, then units lowest-z first, then labels.
pub fn build_frame(
    sheet: &Flowsheet,
    view: &CanvasView,
    viewport: Rect,
    selection: &SelectionState,
    mode: &Mode,
    show_grid: bool,
) -> Vec<DrawCommand> {
    let mut commands = Vec::new();

    if show_grid {
        build_grid(view, viewport, &mut commands);
    }

    for (idx, conn) in sheet.connections.iter().enumerate() {
        let (Some(from), Some(to)) = (sheet.unit(conn.from), sheet.unit(conn.to)) else {
            continue;
        };
        let path = routing::route_path(
            view.to_screen_rect(from.logical_rect()),
            view.to_screen_rect(to.logical_rect()),
            conn.port,
            conn.total_ports,
        );
        let selected = selection.connection == Some(idx);
        if let Some(points) = routing::arrowhead(&path) {
            commands.push(DrawCommand::Arrowhead {
                points,
                kind: conn.kind,
                selected,
            });
        }
        if let Some(text) = &conn.label {
            // Sit the label just above the first bend, next to the source
            let anchor = path.get(1).copied().unwrap_or(path[0]);
            commands.push(DrawCommand::ConnectionLabel {
                pos: anchor + egui::vec2(4.0, -6.0) * view.scale.max(0.5),
                text: text.clone(),
                font_size: label_font_size(view),
            });
        }
        commands.push(DrawCommand::ConnectionPath {
            points: path,
            kind: conn.kind,
            selected,
        });
    }

    if let Mode::Connecting { from, cursor } = mode {
        if let Some(unit) = sheet.unit(*from) {
            // Preview from where the next port would attach
            let (port, total) = if unit.kind.is_branching() {
                ((sheet.outgoing_count(*from) as u32).min(2), 3)
            } else {
                (0, 1)
            };
            let points = routing::route_preview(
                view.to_screen_rect(unit.logical_rect()),
                *cursor,
                port,
                total,
            );
            commands.push(DrawCommand::PreviewPath { points });
        }
    }

    let active_unit = match mode {
        Mode::DraggingUnit { id, .. } | Mode::ResizingUnit { id, .. } => Some(*id),
        _ => None,
    };
    for unit in sheet.units_by_z() {
        let rect = view.to_screen_rect(unit.logical_rect());
        commands.push(DrawCommand::UnitBody {
            rect,
            kind: unit.kind,
            selected: selection.unit == Some(unit.id),
            active: active_unit == Some(unit.id),
        });
        commands.push(DrawCommand::UnitLabel {
            pos: rect.center_bottom() + egui::vec2(0.0, 4.0),
            text: unit.label.clone(),
            font_size: label_font_size(view),
        });
    }

    commands
}

fn label_font_size(view: &CanvasView) -> f32 {
    (12.0 * view.scale).clamp(8.0, 48.0)
}

/// Emits grid lines covering the visible viewport, culled when the spacing
/// collapses below a couple of pixels.
fn build_grid(view: &CanvasView, viewport: Rect, commands: &mut Vec<DrawCommand>) {
    let screen_spacing = GRID_SIZE * view.scale;
    if screen_spacing < 2.0 {
        return;
    }

    let top_left = view.to_logical(viewport.min);
    let bottom_right = view.to_logical(viewport.max);
    let start_x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
    let end_x = (bottom_right.x / GRID_SIZE).ceil() * GRID_SIZE;
    let start_y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
    let end_y = (bottom_right.y / GRID_SIZE).ceil() * GRID_SIZE;

    let mut x = start_x;
    while x <= end_x {
        let screen_x = view.to_screen(egui::pos2(x, 0.0)).x;
        commands.push(DrawCommand::GridLine {
            from: egui::pos2(screen_x, viewport.min.y),
            to: egui::pos2(screen_x, viewport.max.y),
            axis: x == 0.0,
        });
        x += GRID_SIZE;
    }
    let mut y = start_y;
    while y <= end_y {
        let screen_y = view.to_screen(egui::pos2(0.0, y)).y;
        commands.push(DrawCommand::GridLine {
            from: egui::pos2(viewport.min.x, screen_y),
            to: egui::pos2(viewport.max.x, screen_y),
            axis: y == 0.0,
        });
        y += GRID_SIZE;
    }
}

/// Executes a command list against an egui painter.
pub fn paint_frame(painter: &egui::Painter, commands: &[DrawCommand], dark_mode: bool) {
    for command in commands {
        match command {
            DrawCommand::GridLine { from, to, axis } => {
                let (width, alpha) = if *axis { (1.5, 80) } else { (1.0, 32) };
                let color = egui::Color32::from_rgba_unmultiplied(128, 128, 128, alpha);
                painter.line_segment([*from, *to], egui::Stroke::new(width, color));
            }
            DrawCommand::ConnectionPath {
                points,
                kind,
                selected,
            } => {
                let stroke = connection_stroke(*kind, *selected);
                match kind {
                    ConnectionKind::Data => {
                        painter.add(egui::Shape::line(points.clone(), stroke));
                    }
                    ConnectionKind::Action => {
                        painter.extend(egui::Shape::dashed_line(points, stroke, 8.0, 5.0));
                    }
                }
            }
            DrawCommand::Arrowhead {
                points,
                kind,
                selected,
            } => {
                painter.add(egui::Shape::convex_polygon(
                    points.to_vec(),
                    connection_stroke(*kind, *selected).color,
                    egui::Stroke::NONE,
                ));
            }
            DrawCommand::ConnectionLabel {
                pos,
                text,
                font_size,
            } => {
                painter.text(
                    *pos,
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(*font_size),
                    if dark_mode {
                        egui::Color32::from_gray(200)
                    } else {
                        egui::Color32::from_gray(60)
                    },
                );
            }
            DrawCommand::PreviewPath { points } => {
                let stroke = egui::Stroke::new(2.0, egui::Color32::from_rgb(100, 150, 255));
                painter.extend(egui::Shape::dashed_line(points, stroke, 6.0, 4.0));
                if let Some(end) = points.last() {
                    painter.circle_filled(*end, 4.0, stroke.color);
                }
            }
            DrawCommand::UnitBody {
                rect,
                kind,
                selected,
                active,
            } => {
                paint_unit_body(painter, *rect, *kind, *selected, *active);
            }
            DrawCommand::UnitLabel {
                pos,
                text,
                font_size,
            } => {
                painter.text(
                    *pos,
                    egui::Align2::CENTER_TOP,
                    text,
                    egui::FontId::proportional(*font_size),
                    if dark_mode {
                        egui::Color32::from_gray(220)
                    } else {
                        egui::Color32::from_gray(40)
                    },
                );
            }
        }
    }
}

fn connection_stroke(kind: ConnectionKind, selected: bool) -> egui::Stroke {
    if selected {
        egui::Stroke::new(3.0, egui::Color32::from_rgb(100, 150, 255))
    } else {
        let color = match kind {
            ConnectionKind::Data => egui::Color32::DARK_GRAY,
            ConnectionKind::Action => egui::Color32::from_rgb(160, 120, 60),
        };
        egui::Stroke::new(2.0, color)
    }
}

fn paint_unit_body(
    painter: &egui::Painter,
    rect: Rect,
    kind: UnitKind,
    selected: bool,
    active: bool,
) {
    let fill = match kind {
        UnitKind::JawCrusher => egui::Color32::from_rgb(188, 152, 126),
        UnitKind::BallMill => egui::Color32::from_rgb(150, 170, 200),
        UnitKind::VibratingScreen => egui::Color32::from_rgb(170, 190, 150),
        UnitKind::FlotationCell => egui::Color32::from_rgb(140, 190, 200),
        UnitKind::Thickener => egui::Color32::from_rgb(190, 170, 150),
        UnitKind::Splitter => egui::Color32::from_rgb(205, 180, 120),
    };
    painter.rect_filled(rect, 4.0, fill);

    let (stroke_color, stroke_width) = if active {
        (egui::Color32::from_rgb(255, 165, 0), 3.0)
    } else if selected {
        (egui::Color32::from_rgb(255, 60, 60), 2.5)
    } else {
        (egui::Color32::BLACK, 1.5)
    };
    painter.rect_stroke(
        rect,
        4.0,
        egui::Stroke::new(stroke_width, stroke_color),
        egui::StrokeKind::Inside,
    );

    paint_unit_glyph(painter, rect, kind);

    if selected {
        for corner in [
            rect.min,
            egui::pos2(rect.max.x, rect.min.y),
            egui::pos2(rect.min.x, rect.max.y),
            rect.max,
        ] {
            painter.rect_filled(
                Rect::from_center_size(corner, egui::vec2(6.0, 6.0)),
                0.0,
                stroke_color,
            );
        }
    }
}

/// Draws the equipment glyph inside a unit body, reflowed to the body's
/// current size but preserving the glyph's baseline aspect ratio.
fn paint_unit_glyph(painter: &egui::Painter, body: Rect, kind: UnitKind) {
    let (bw, bh) = kind.base_size();
    let inner = fit_aspect(body.shrink(body.width().min(body.height()) * 0.18), bw / bh);
    let stroke = egui::Stroke::new(1.5, egui::Color32::from_black_alpha(160));
    match kind {
        UnitKind::JawCrusher => {
            // Converging jaws
            painter.line_segment([inner.left_top(), inner.center_bottom()], stroke);
            painter.line_segment([inner.right_top(), inner.center_bottom()], stroke);
        }
        UnitKind::BallMill => {
            painter.circle_stroke(inner.center(), inner.height() / 2.0, stroke);
            painter.line_segment([inner.left_center(), inner.right_center()], stroke);
        }
        UnitKind::VibratingScreen => {
            // Inclined deck with hatching
            painter.line_segment([inner.left_top(), inner.right_bottom()], stroke);
            let third = inner.width() / 3.0;
            for i in 1..3 {
                let x = inner.min.x + third * i as f32;
                painter.line_segment(
                    [egui::pos2(x, inner.min.y), egui::pos2(x, inner.max.y)],
                    stroke,
                );
            }
        }
        UnitKind::FlotationCell => {
            painter.line_segment([inner.left_center(), inner.right_center()], stroke);
            for i in 0..3 {
                let x = inner.min.x + inner.width() * (0.25 + 0.25 * i as f32);
                painter.circle_stroke(
                    egui::pos2(x, inner.min.y + inner.height() * 0.3),
                    inner.height() * 0.12,
                    stroke,
                );
            }
        }
        UnitKind::Thickener => {
            // Settling cone
            painter.line_segment([inner.left_top(), inner.center_bottom()], stroke);
            painter.line_segment([inner.center_bottom(), inner.right_top()], stroke);
            painter.line_segment([inner.left_top(), inner.right_top()], stroke);
        }
        UnitKind::Splitter => {
            // Diamond, matching the branching decision shape
            painter.add(egui::Shape::closed_line(
                vec![
                    inner.center_top(),
                    inner.right_center(),
                    inner.center_bottom(),
                    inner.left_center(),
                ],
                stroke,
            ));
        }
    }
}

/// Largest rectangle of the given width/height ratio centered in `outer`.
fn fit_aspect(outer: Rect, aspect: f32) -> Rect {
    let (w, h) = if outer.width() / outer.height() > aspect {
        (outer.height() * aspect, outer.height())
    } else {
        (outer.width(), outer.width() / aspect)
    };
    Rect::from_center_size(outer.center(), egui::vec2(w, h))
}
