use serde::{Deserialize, Serialize};

use crate::geometry::{rotate_point, BBox, IPoint, Point};
use crate::layer::{BoardLayer, LayerSet};
use crate::units::{decideg_to_rad, mm_to_iu};

/// Rotate a board-space point (Y down) by an orientation in tenths of a
/// degree. Positive orientations turn counter-clockwise on screen.
pub fn rotate_decideg(p: Point, orientation: f64) -> Point {
    rotate_point(p, -decideg_to_rad(orientation))
}

/// Physical board parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Board thickness in internal units.
    pub thickness: i32,
    pub copper_layer_count: u8,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            thickness: mm_to_iu(1.6),
            copper_layer_count: 2,
        }
    }
}

/// Result of extracting the board outline from edge cuts: solid outer
/// contours and the cutouts that go through the whole board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardOutline {
    pub outlines: Vec<Vec<IPoint>>,
    pub holes: Vec<Vec<IPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub start: IPoint,
    pub end: IPoint,
    pub width: i32,
    pub layer: BoardLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub position: IPoint,
    /// Outer copper diameter.
    pub diameter: i32,
    /// Drill diameter.
    pub drill: i32,
    pub top_layer: BoardLayer,
    pub bottom_layer: BoardLayer,
}

impl Via {
    pub fn through(position: IPoint, diameter: i32, drill: i32) -> Self {
        Self {
            position,
            diameter,
            drill,
            top_layer: BoardLayer::FRONT_COPPER,
            bottom_layer: BoardLayer::BACK_COPPER,
        }
    }

    pub fn is_through(&self) -> bool {
        self.top_layer == BoardLayer::FRONT_COPPER && self.bottom_layer == BoardLayer::BACK_COPPER
    }

    /// Neither end reaches an outer copper layer.
    pub fn is_buried(&self) -> bool {
        self.top_layer != BoardLayer::FRONT_COPPER && self.bottom_layer != BoardLayer::BACK_COPPER
    }
}

/// A copper zone with its fill already computed. The first polygon is the
/// outline, the rest are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub layer: BoardLayer,
    pub filled_polygons: Vec<Vec<IPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawShape {
    Segment { start: IPoint, end: IPoint },
    /// Arc around `center` beginning at `start`, sweeping `angle` tenths of
    /// a degree.
    Arc {
        center: IPoint,
        start: IPoint,
        angle: f64,
    },
    /// Circle around `center` passing through `edge`.
    Circle { center: IPoint, edge: IPoint },
    /// Closed polygon. Inside a footprint the points are relative to the
    /// footprint position and orientation.
    Polygon { points: Vec<IPoint> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub layer: BoardLayer,
    pub width: i32,
    pub shape: DrawShape,
}

/// Text already converted to strokes by the text layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub layer: BoardLayer,
    pub thickness: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub strokes: Vec<[IPoint; 2]>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadShape {
    Circle,
    Oval,
    Rect,
    Trapezoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrillShape {
    #[default]
    Circle,
    Oblong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub position: IPoint,
    /// Shape offset from the pad (drill) position, before rotation.
    #[serde(default)]
    pub offset: IPoint,
    pub size: IPoint,
    /// Trapezoid deltas; ignored for other shapes.
    #[serde(default)]
    pub delta: IPoint,
    /// Tenths of a degree.
    #[serde(default)]
    pub orientation: f64,
    pub shape: PadShape,
    /// Drill size; zero for SMD pads.
    #[serde(default)]
    pub drill: IPoint,
    #[serde(default)]
    pub drill_shape: DrillShape,
    pub layers: LayerSet,
}

impl Pad {
    /// Position of the copper shape, which may be offset from the drill.
    pub fn shape_pos(&self) -> Point {
        let offset = rotate_decideg(Point::from(self.offset), self.orientation);
        Point::from(self.position) + offset
    }

    /// Corners of a rect or trapezoid pad in board coordinates, in the
    /// order (-x,-y) (-x,+y) (+x,-y) (+x,+y) before rotation. Rect pads
    /// ignore the deltas.
    pub fn corners(&self) -> [Point; 4] {
        let w = self.size.x as f64 / 2.0;
        let h = self.size.y as f64 / 2.0;
        let (dx, dy) = match self.shape {
            PadShape::Trapezoid => (self.delta.x as f64 / 2.0, self.delta.y as f64 / 2.0),
            _ => (0.0, 0.0),
        };
        let center = self.shape_pos();
        [
            Point::new(-w + dy, -h - dx),
            Point::new(-w - dy, h + dx),
            Point::new(w - dy, -h + dx),
            Point::new(w + dy, h - dx),
        ]
        .map(|c| rotate_decideg(c, self.orientation) + center)
    }

    pub fn has_drill(&self) -> bool {
        self.drill.x > 0 && self.drill.y > 0
    }
}

/// A 3D model attached to a footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model3d {
    pub path: String,
    /// Degrees about X, Y and Z.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Inches.
    #[serde(default)]
    pub offset: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub reference: String,
    pub position: IPoint,
    /// Tenths of a degree.
    #[serde(default)]
    pub orientation: f64,
    /// Front or back copper, the side the footprint is mounted on.
    pub layer: BoardLayer,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub graphics: Vec<Drawing>,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub models: Vec<Model3d>,
}

impl Footprint {
    pub fn new(reference: &str, position: IPoint, layer: BoardLayer) -> Self {
        Self {
            reference: reference.to_string(),
            position,
            orientation: 0.0,
            layer,
            texts: Vec::new(),
            graphics: Vec::new(),
            pads: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.layer == BoardLayer::BACK_COPPER
    }

    /// Map a footprint-relative point to board coordinates.
    pub fn to_board(&self, local: IPoint) -> Point {
        rotate_decideg(Point::from(local), self.orientation) + Point::from(self.position)
    }
}

/// One item of the board, borrowed for a single walk.
#[derive(Debug, Clone, Copy)]
pub enum BoardEntity<'a> {
    Track(&'a Track),
    Via(&'a Via),
    Zone(&'a Zone),
    Drawing(&'a Drawing),
    Text(&'a Text),
    Footprint(&'a Footprint),
}

/// The board handed over by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    #[serde(default)]
    pub settings: BoardSettings,
    /// `None` when the outline could not be derived from the edge cuts.
    #[serde(default)]
    pub outline: Option<BoardOutline>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
}

impl Board {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Every board item in export order: drawings and texts, tracks and
    /// vias, zones, then footprints.
    pub fn entities(&self) -> impl Iterator<Item = BoardEntity<'_>> {
        self.drawings
            .iter()
            .map(BoardEntity::Drawing)
            .chain(self.texts.iter().map(BoardEntity::Text))
            .chain(self.tracks.iter().map(BoardEntity::Track))
            .chain(self.vias.iter().map(BoardEntity::Via))
            .chain(self.zones.iter().map(BoardEntity::Zone))
            .chain(self.footprints.iter().map(BoardEntity::Footprint))
    }

    pub fn entity_count(&self) -> usize {
        self.drawings.len()
            + self.texts.len()
            + self.tracks.len()
            + self.vias.len()
            + self.zones.len()
            + self.footprints.len()
    }

    /// Bounding box of everything on the board, in internal units.
    pub fn bounding_box(&self) -> Option<BBox> {
        let mut acc: Option<BBox> = None;
        let mut merge = |bb: BBox| {
            acc = Some(match acc {
                Some(a) => a.union(&bb),
                None => bb,
            });
        };

        if let Some(outline) = &self.outline {
            for ring in &outline.outlines {
                if let Some(bb) = ring_bbox(ring.iter().map(|p| Point::from(*p))) {
                    merge(bb);
                }
            }
        }
        for t in &self.tracks {
            if let Some(bb) = ring_bbox([Point::from(t.start), Point::from(t.end)]) {
                merge(bb.inflate(t.width as f64 / 2.0));
            }
        }
        for v in &self.vias {
            merge(BBox::around(Point::from(v.position), v.diameter as f64 / 2.0));
        }
        for z in &self.zones {
            for ring in &z.filled_polygons {
                if let Some(bb) = ring_bbox(ring.iter().map(|p| Point::from(*p))) {
                    merge(bb);
                }
            }
        }
        for d in &self.drawings {
            if let Some(bb) = drawing_bbox(d, |p| Point::from(p)) {
                merge(bb);
            }
        }
        for t in &self.texts {
            for [a, b] in &t.strokes {
                if let Some(bb) = ring_bbox([Point::from(*a), Point::from(*b)]) {
                    merge(bb.inflate(t.thickness as f64 / 2.0));
                }
            }
        }
        for fp in &self.footprints {
            for pad in &fp.pads {
                let half = pad.size.x.max(pad.size.y) as f64 / 2.0;
                merge(BBox::around(pad.shape_pos(), half));
            }
            for g in &fp.graphics {
                if let Some(bb) = drawing_bbox(g, |p| fp.to_board(p)) {
                    merge(bb);
                }
            }
            merge(BBox::around(Point::from(fp.position), 0.0));
        }
        acc
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn ring_bbox(points: impl IntoIterator<Item = Point>) -> Option<BBox> {
    let points: Vec<Point> = points.into_iter().collect();
    BBox::from_points(&points)
}

fn drawing_bbox(d: &Drawing, polygon_map: impl Fn(IPoint) -> Point) -> Option<BBox> {
    let half = d.width as f64 / 2.0;
    let bb = match &d.shape {
        DrawShape::Segment { start, end } => ring_bbox([Point::from(*start), Point::from(*end)]),
        DrawShape::Arc { center, start, .. } | DrawShape::Circle { center, edge: start } => {
            let c = Point::from(*center);
            Some(BBox::around(c, c.distance_to(&Point::from(*start))))
        }
        DrawShape::Polygon { points } => ring_bbox(points.iter().map(|p| polygon_map(*p))),
    };
    bb.map(|b| b.inflate(half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_create() {
        let board = Board::new("test_board");
        assert_eq!(board.name, "test_board");
        assert_eq!(board.entity_count(), 0);
        assert!(board.bounding_box().is_none());
        assert_eq!(board.settings.thickness, 1_600_000);
    }

    #[test]
    fn test_via_classification() {
        let thru = Via::through(IPoint::new(0, 0), 600, 300);
        assert!(thru.is_through());
        let blind = Via {
            bottom_layer: BoardLayer::Copper(2),
            ..thru.clone()
        };
        assert!(!blind.is_through());
        assert!(!blind.is_buried());
        let buried = Via {
            top_layer: BoardLayer::Copper(1),
            bottom_layer: BoardLayer::Copper(2),
            ..thru
        };
        assert!(buried.is_buried());
    }

    #[test]
    fn test_bounding_box_includes_track_width() {
        let mut board = Board::new("b");
        board.tracks.push(Track {
            start: IPoint::new(0, 0),
            end: IPoint::new(1000, 0),
            width: 200,
            layer: BoardLayer::FRONT_COPPER,
        });
        let bb = board.bounding_box().unwrap();
        assert!((bb.min.x + 100.0).abs() < 1e-10);
        assert!((bb.max.y - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_footprint_to_board() {
        let mut fp = Footprint::new("U1", IPoint::new(1000, 1000), BoardLayer::FRONT_COPPER);
        fp.orientation = 900.0;
        let p = fp.to_board(IPoint::new(100, 0));
        assert!((p.x - 1000.0).abs() < 1e-9);
        assert!((p.y - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_pad_corners() {
        let mut pad = Pad {
            position: IPoint::new(1000, 1000),
            offset: IPoint::default(),
            size: IPoint::new(200, 100),
            delta: IPoint::new(40, 0),
            orientation: 0.0,
            shape: PadShape::Rect,
            drill: IPoint::default(),
            drill_shape: DrillShape::Circle,
            layers: LayerSet::FRONT,
        };
        let c = pad.corners();
        assert_eq!(c[0], Point::new(900.0, 950.0));
        assert_eq!(c[3], Point::new(1100.0, 1050.0));
        assert!(!pad.has_drill());

        pad.shape = PadShape::Trapezoid;
        let c = pad.corners();
        // delta x narrows one side along y
        assert_eq!(c[0], Point::new(900.0, 930.0));
        assert_eq!(c[1], Point::new(900.0, 1070.0));
    }

    #[test]
    fn test_entities_cover_all_collections() {
        let mut board = Board::new("b");
        board.vias.push(Via::through(IPoint::new(0, 0), 600, 300));
        board
            .footprints
            .push(Footprint::new("R1", IPoint::new(0, 0), BoardLayer::BACK_COPPER));
        let kinds: Vec<_> = board.entities().collect();
        assert_eq!(kinds.len(), 2);
        assert!(matches!(kinds[0], BoardEntity::Via(_)));
        assert!(matches!(kinds[1], BoardEntity::Footprint(f) if f.is_flipped()));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut board = Board::new("json");
        board.zones.push(Zone {
            layer: BoardLayer::BACK_COPPER,
            filled_polygons: vec![vec![IPoint::new(0, 0), IPoint::new(10, 0), IPoint::new(0, 10)]],
        });
        let json = board.to_json().unwrap();
        let back = Board::from_json(&json).unwrap();
        assert_eq!(back.zones, board.zones);
    }
}
