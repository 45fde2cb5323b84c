//! Conversion of board items into contours on the mesh layers.

use pcbgfx_core::board::{Drawing, DrawShape, DrillShape, PadShape, Pad, Text, Track, Via, Zone};
use pcbgfx_core::geometry::{distance, IPoint, Point};
use pcbgfx_core::layer::BoardLayer;
use pcbgfx_core::units::decideg_to_rad;
use pcbgfx_core::{Board, BoardEntity, ContourId, Footprint, GeometryError};

use crate::error::{ExportReport, ExportWarning};
use crate::model::{VrmlLayer, VrmlModel};

/// Ring holes thinner than this, in output units, are not cut.
const MIN_RING_HOLE: f64 = 0.0001;

fn record(report: &mut ExportReport, item: &str, result: Result<ContourId, GeometryError>) {
    if let Err(e) = result {
        report.warn(ExportWarning::geometry(item, &e));
    }
}

/// Add the board body and the through cutouts. Without an outline the
/// body is the bounding rectangle of the board items.
pub fn export_outline(model: &mut VrmlModel, board: &Board, report: &mut ExportReport) {
    let outline = board.outline.as_ref().filter(|o| !o.outlines.is_empty());
    let Some(outline) = outline else {
        report.warn(ExportWarning::OutlineFallback);
        if let Some(bb) = board.bounding_box() {
            let corners = [
                Point::new(bb.min.x, bb.min.y),
                Point::new(bb.max.x, bb.min.y),
                Point::new(bb.max.x, bb.max.y),
                Point::new(bb.min.x, bb.max.y),
            ]
            .map(|p| model.to_model(p));
            let result = model.board.add_polygon(&corners, false);
            record(report, "board rectangle", result);
        }
        return;
    };

    for ring in &outline.outlines {
        let points = to_model_ring(model, ring);
        let result = model.board.add_polygon(&points, false);
        record(report, "board outline", result);
    }
    for ring in &outline.holes {
        let points = to_model_ring(model, ring);
        let result = model.holes.add_polygon(&points, true);
        record(report, "board cutout", result);
    }
    log::debug!(
        "Board outline: {} contours, {} cutouts",
        outline.outlines.len(),
        outline.holes.len()
    );
}

fn to_model_ring(model: &VrmlModel, ring: &[IPoint]) -> Vec<Point> {
    ring.iter().map(|p| model.to_model(Point::from(*p))).collect()
}

/// Add the geometry of one board item.
pub fn export_entity(model: &mut VrmlModel, entity: BoardEntity<'_>, report: &mut ExportReport) {
    match entity {
        BoardEntity::Track(track) => export_track(model, track, report),
        BoardEntity::Via(via) => export_via(model, via, report),
        BoardEntity::Zone(zone) => export_zone(model, zone, report),
        BoardEntity::Drawing(drawing) => export_drawing(model, drawing, None, report),
        BoardEntity::Text(text) => export_text(model, text, report),
        BoardEntity::Footprint(fp) => export_footprint(model, fp, report),
    }
}

/// A straight stroke from `start` to `end` (board coordinates) with round
/// ends.
fn export_line(model: &mut VrmlModel, layer: VrmlLayer, start: Point, end: Point, width: f64) -> Result<ContourId, GeometryError> {
    let s = model.to_model(start);
    let e = model.to_model(end);
    let width = model.scaled(width);
    let angle = (e.y - s.y).atan2(e.x - s.x);
    let length = distance(s, e) + width;
    let center = Point::new((s.x + e.x) / 2.0, (s.y + e.y) / 2.0);
    model.layer_mut(layer).add_slot(center, length, width, angle, false)
}

/// A ring of stroke `width` through `edge`, or a disc when the stroke
/// covers the centre.
fn export_circle(model: &mut VrmlModel, layer: VrmlLayer, center: Point, edge: Point, width: f64, report: &mut ExportReport) {
    let c = model.to_model(center);
    let width = model.scaled(width);
    let radius = model.scaled(distance(center, edge)) + width / 2.0;
    let result = model.layer_mut(layer).add_circle(c, radius, false);
    record(report, "circle", result);
    let hole = radius - width;
    if hole > MIN_RING_HOLE {
        let result = model.layer_mut(layer).add_circle(c, hole, true);
        record(report, "circle", result);
    }
}

fn export_track(model: &mut VrmlModel, track: &Track, report: &mut ExportReport) {
    if !track.layer.is_outer_copper() {
        return;
    }
    let Some(layer) = VrmlLayer::for_board_layer(track.layer) else {
        return;
    };
    let result = export_line(
        model,
        layer,
        Point::from(track.start),
        Point::from(track.end),
        track.width as f64,
    );
    record(report, "track", result);
}

fn export_via(model: &mut VrmlModel, via: &Via, report: &mut ExportReport) {
    if via.is_buried() {
        log::debug!("Skipping buried via at {:?}", via.position);
        return;
    }
    let center = model.to_model(Point::from(via.position));
    let radius = model.scaled(via.diameter as f64) / 2.0;
    let hole = model.scaled(via.drill as f64) / 2.0;

    let mut ends = Vec::with_capacity(2);
    if via.top_layer == BoardLayer::FRONT_COPPER {
        ends.push(VrmlLayer::TopCopper);
    }
    if via.bottom_layer == BoardLayer::BACK_COPPER {
        ends.push(VrmlLayer::BottomCopper);
    }
    for &layer in &ends {
        let result = model.layer_mut(layer).add_circle(center, radius, false);
        record(report, "via", result);
    }

    if hole > 0.0 {
        if via.is_through() {
            let result = model.holes.add_circle(center, hole, true);
            record(report, "via drill", result);
        } else {
            // blind: the drill only opens the outer copper it reaches
            for &layer in &ends {
                let result = model.layer_mut(layer).add_circle(center, hole, true);
                record(report, "via drill", result);
            }
        }
    }
}

fn export_zone(model: &mut VrmlModel, zone: &Zone, report: &mut ExportReport) {
    let Some(layer) = VrmlLayer::for_board_layer(zone.layer) else {
        return;
    };
    for (i, polygon) in zone.filled_polygons.iter().enumerate() {
        let points = to_model_ring(model, polygon);
        let result = model.layer_mut(layer).add_polygon(&points, i > 0);
        record(report, "zone", result);
    }
}

/// `fp` is the owning footprint, needed to place relative polygon points.
fn export_drawing(model: &mut VrmlModel, drawing: &Drawing, fp: Option<&Footprint>, report: &mut ExportReport) {
    if drawing.layer == BoardLayer::EdgeCuts {
        return;
    }
    let Some(layer) = VrmlLayer::for_board_layer(drawing.layer) else {
        return;
    };
    let width = drawing.width as f64;
    match &drawing.shape {
        DrawShape::Segment { start, end } => {
            let result = export_line(model, layer, Point::from(*start), Point::from(*end), width);
            record(report, "segment", result);
        }
        DrawShape::Circle { center, edge } => {
            export_circle(model, layer, Point::from(*center), Point::from(*edge), width, report);
        }
        DrawShape::Arc { center, start, angle } => {
            let c = model.to_model(Point::from(*center));
            let s = model.to_model(Point::from(*start));
            let width = model.scaled(width);
            let result = model
                .layer_mut(layer)
                .add_arc(c, s, width, -decideg_to_rad(*angle), false);
            record(report, "arc", result);
        }
        DrawShape::Polygon { points } => {
            if points.len() < 3 {
                return;
            }
            let ring: Vec<Point> = points
                .iter()
                .map(|p| match fp {
                    Some(fp) => fp.to_board(*p),
                    None => Point::from(*p),
                })
                .map(|p| model.to_model(p))
                .collect();
            let result = model.layer_mut(layer).add_polygon(&ring, false);
            record(report, "polygon", result);
        }
    }
}

fn export_text(model: &mut VrmlModel, text: &Text, report: &mut ExportReport) {
    if !text.visible {
        return;
    }
    let Some(layer) = VrmlLayer::for_board_layer(text.layer) else {
        return;
    };
    for [start, end] in &text.strokes {
        let result = export_line(
            model,
            layer,
            Point::from(*start),
            Point::from(*end),
            text.thickness as f64,
        );
        record(report, "text", result);
    }
}

fn export_footprint(model: &mut VrmlModel, fp: &Footprint, report: &mut ExportReport) {
    for text in &fp.texts {
        export_text(model, text, report);
    }
    for drawing in &fp.graphics {
        export_drawing(model, drawing, Some(fp), report);
    }
    for pad in &fp.pads {
        export_pad(model, pad, report);
    }
}

fn export_pad(model: &mut VrmlModel, pad: &Pad, report: &mut ExportReport) {
    let drill_radius = model.scaled(pad.drill.x.min(pad.drill.y) as f64) / 2.0;
    if drill_radius > 0.0 {
        let at = model.to_model(Point::from(pad.position));
        let length = model.scaled(pad.drill.x as f64);
        let width = model.scaled(pad.drill.y as f64);
        let result = match pad.drill_shape {
            DrillShape::Oblong => {
                model
                    .holes
                    .add_slot(at, length, width, decideg_to_rad(pad.orientation), true)
            }
            DrillShape::Circle => model.holes.add_circle(at, drill_radius, true),
        };
        record(report, "pad drill", result);
    }

    if pad.layers.back {
        export_pad_shape(model, pad, VrmlLayer::BottomCopper, VrmlLayer::BottomTin, report);
    }
    if pad.layers.front {
        export_pad_shape(model, pad, VrmlLayer::TopCopper, VrmlLayer::TopTin, report);
    }
}

/// The pad shape is cut out of the copper and laid down as tin.
fn export_pad_shape(model: &mut VrmlModel, pad: &Pad, copper: VrmlLayer, tin: VrmlLayer, report: &mut ExportReport) {
    let at = model.to_model(pad.shape_pos());
    match pad.shape {
        PadShape::Circle => {
            let radius = model.scaled(pad.size.x as f64) / 2.0;
            let result = model.layer_mut(copper).add_circle(at, radius, true);
            record(report, "pad", result);
            let result = model.layer_mut(tin).add_circle(at, radius, false);
            record(report, "pad", result);
        }
        PadShape::Oval => {
            let length = model.scaled(pad.size.x as f64);
            let width = model.scaled(pad.size.y as f64);
            let angle = decideg_to_rad(pad.orientation);
            let result = model.layer_mut(copper).add_slot(at, length, width, angle, true);
            record(report, "pad", result);
            let result = model.layer_mut(tin).add_slot(at, length, width, angle, false);
            record(report, "pad", result);
        }
        PadShape::Rect | PadShape::Trapezoid => {
            let c = pad.corners().map(|p| model.to_model(p));
            let result = model.layer_mut(copper).add_polygon(&[c[1], c[3], c[2], c[0]], true);
            record(report, "pad", result);
            let result = model.layer_mut(tin).add_polygon(&[c[0], c[2], c[3], c[1]], false);
            record(report, "pad", result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbgfx_core::board::BoardOutline;
    use pcbgfx_core::LayerSet;

    use crate::settings::ExportSettings;

    fn model(board: &Board) -> VrmlModel {
        VrmlModel::new(&ExportSettings::default(), &board.settings, board.bounding_box())
    }

    fn square_board(size_mm: i32) -> Board {
        let s = size_mm * 1_000_000;
        let mut board = Board::new("test");
        board.outline = Some(BoardOutline {
            outlines: vec![vec![
                IPoint::new(0, 0),
                IPoint::new(s, 0),
                IPoint::new(s, s),
                IPoint::new(0, s),
            ]],
            holes: Vec::new(),
        });
        board
    }

    #[test]
    fn test_through_via_padstack() {
        let mut board = square_board(10);
        board
            .vias
            .push(pcbgfx_core::board::Via::through(IPoint::new(5_000_000, 5_000_000), 600_000, 300_000));
        let mut m = model(&board);
        let mut report = ExportReport::default();
        for e in board.entities() {
            export_entity(&mut m, e, &mut report);
        }
        assert_eq!(m.holes.contour_count(), 1);
        assert_eq!(m.top_copper.contour_count(), 1);
        assert_eq!(m.bot_copper.contour_count(), 1);

        let hole = m.holes.contours().next().unwrap();
        assert!(hole.is_hole());
        let r = hole.vertices().iter().map(|p| p.x.hypot(p.y)).fold(0.0, f64::max);
        assert!((r - 0.15).abs() < 1e-9);
        let pad = m.top_copper.contours().next().unwrap();
        assert!(!pad.is_hole());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_blind_via_keeps_drill_in_copper() {
        let board = square_board(10);
        let mut m = model(&board);
        let via = pcbgfx_core::board::Via {
            top_layer: BoardLayer::Copper(1),
            ..pcbgfx_core::board::Via::through(IPoint::new(1_000_000, 1_000_000), 600_000, 300_000)
        };
        let mut report = ExportReport::default();
        export_entity(&mut m, BoardEntity::Via(&via), &mut report);
        assert_eq!(m.holes.contour_count(), 0);
        assert_eq!(m.top_copper.contour_count(), 0);
        assert_eq!(m.bot_copper.contour_count(), 2);
    }

    #[test]
    fn test_missing_outline_falls_back_to_bbox() {
        let mut board = Board::new("bare");
        board.tracks.push(Track {
            start: IPoint::new(0, 0),
            end: IPoint::new(5_000_000, 0),
            width: 200_000,
            layer: BoardLayer::FRONT_COPPER,
        });
        let mut m = model(&board);
        let mut report = ExportReport::default();
        export_outline(&mut m, &board, &mut report);
        assert_eq!(report.warnings, vec![ExportWarning::OutlineFallback]);
        assert_eq!(m.board.contour_count(), 1);
    }

    #[test]
    fn test_inner_layer_items_ignored() {
        let board = square_board(10);
        let mut m = model(&board);
        let track = Track {
            start: IPoint::new(0, 0),
            end: IPoint::new(1_000_000, 0),
            width: 200_000,
            layer: BoardLayer::Copper(2),
        };
        let mut report = ExportReport::default();
        export_entity(&mut m, BoardEntity::Track(&track), &mut report);
        let drawing = Drawing {
            layer: BoardLayer::Comments,
            width: 100_000,
            shape: DrawShape::Segment {
                start: IPoint::new(0, 0),
                end: IPoint::new(1_000_000, 0),
            },
        };
        export_entity(&mut m, BoardEntity::Drawing(&drawing), &mut report);
        assert!(m.top_copper.is_empty() && m.bot_copper.is_empty());
        assert!(m.top_silk.is_empty());
    }

    #[test]
    fn test_circle_drawing_is_ring() {
        let board = square_board(10);
        let mut m = model(&board);
        let drawing = Drawing {
            layer: BoardLayer::SilkFront,
            width: 150_000,
            shape: DrawShape::Circle {
                center: IPoint::new(5_000_000, 5_000_000),
                edge: IPoint::new(6_000_000, 5_000_000),
            },
        };
        let mut report = ExportReport::default();
        export_entity(&mut m, BoardEntity::Drawing(&drawing), &mut report);
        let rings: Vec<_> = m.top_silk.contours().collect();
        assert_eq!(rings.len(), 2);
        assert!(!rings[0].is_hole());
        assert!(rings[1].is_hole());
    }

    #[test]
    fn test_through_pad_on_both_sides() {
        let board = square_board(10);
        let mut m = model(&board);
        let mut fp = Footprint::new("J1", IPoint::new(5_000_000, 5_000_000), BoardLayer::FRONT_COPPER);
        fp.pads.push(Pad {
            position: IPoint::new(5_000_000, 5_000_000),
            offset: IPoint::new(0, 0),
            size: IPoint::new(1_700_000, 1_700_000),
            delta: IPoint::new(0, 0),
            orientation: 0.0,
            shape: PadShape::Rect,
            drill: IPoint::new(1_000_000, 1_000_000),
            drill_shape: DrillShape::Circle,
            layers: LayerSet::BOTH,
        });
        let mut report = ExportReport::default();
        export_entity(&mut m, BoardEntity::Footprint(&fp), &mut report);
        assert_eq!(m.holes.contour_count(), 1);
        assert!(m.top_copper.contours().all(|c| c.is_hole()));
        assert_eq!(m.top_tin.contour_count(), 1);
        assert_eq!(m.bot_tin.contour_count(), 1);
        assert!(m.top_tin.contours().all(|c| !c.is_hole()));
        let area = m.top_tin.contours().next().unwrap().signed_area();
        assert!((area - 1.7 * 1.7).abs() < 1e-9);
    }
}
