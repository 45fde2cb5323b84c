//! Viewport clipping for device coordinates.
//!
//! Device back ends misbehave once coordinates overflow 16 bits (arcs and
//! filled polygons in particular), so every primitive is clipped against the
//! visible area before it reaches a surface.

use serde::{Deserialize, Serialize};

use crate::geometry::{segment_intersection, BBox, IPoint, Point};

/// An axis-aligned integer rectangle. `right()` and `bottom()` are inclusive
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ClipBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
        .normalized()
    }

    /// Box spanning two opposite corners. A span wider than `i32` can hold
    /// is cut short at `i32::MAX`.
    pub fn from_corners(a: IPoint, b: IPoint) -> Self {
        let span = |p: i32, q: i32| i32::try_from((i64::from(q) - i64::from(p)).abs()).unwrap_or(i32::MAX);
        Self::new(a.x.min(b.x), a.y.min(b.y), span(a.x, b.x), span(a.y, b.y))
    }

    fn normalized(mut self) -> Self {
        if self.width < 0 {
            self.x = self.x.saturating_add(self.width);
            self.width = self.width.saturating_neg();
        }
        if self.height < 0 {
            self.y = self.y.saturating_add(self.height);
            self.height = self.height.saturating_neg();
        }
        self
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, p: IPoint) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Grow (or shrink, for a negative amount) every side by `amount`.
    pub fn inflate(&self, amount: i32) -> Self {
        let mut out = *self;
        out.x = out.x.saturating_sub(amount);
        out.y = out.y.saturating_sub(amount);
        out.width = out.width.saturating_add(amount.saturating_mul(2)).max(0);
        out.height = out.height.saturating_add(amount.saturating_mul(2)).max(0);
        out
    }

    /// True when a circle of `radius` around `center` cannot touch the box.
    pub fn rejects_circle(&self, center: IPoint, radius: i32) -> bool {
        center.x < self.left().saturating_sub(radius)
            || center.y < self.top().saturating_sub(radius)
            || center.x > self.right().saturating_add(radius)
            || center.y > self.bottom().saturating_add(radius)
    }

    pub fn to_bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.left() as f64, self.top() as f64),
            Point::new(self.right() as f64, self.bottom() as f64),
        )
    }

    fn edges(&self) -> [(Point, Point); 4] {
        let (l, t, r, b) = (
            self.left() as f64,
            self.top() as f64,
            self.right() as f64,
            self.bottom() as f64,
        );
        [
            (Point::new(l, t), Point::new(l, b)),
            (Point::new(l, t), Point::new(r, t)),
            (Point::new(r, t), Point::new(r, b)),
            (Point::new(l, b), Point::new(r, b)),
        ]
    }

    fn edge_hits(&self, a: IPoint, b: IPoint) -> Vec<Point> {
        let (pa, pb) = (Point::from(a), Point::from(b));
        self.edges()
            .iter()
            .filter_map(|(e1, e2)| segment_intersection(pa, pb, *e1, *e2))
            .collect()
    }
}

/// Clip the segment `p1-p2` against `clip`.
///
/// Returns the visible part, or `None` when nothing of the segment lies
/// inside the box. Endpoints already inside are never moved.
pub fn clip_line(clip: &ClipBox, p1: IPoint, p2: IPoint) -> Option<(IPoint, IPoint)> {
    let in1 = clip.contains(p1);
    let in2 = clip.contains(p2);

    match (in1, in2) {
        (true, true) => Some((p1, p2)),
        (true, false) => Some((p1, clip_outside_end(clip, p1, p2))),
        (false, true) => Some((clip_outside_end(clip, p2, p1), p2)),
        (false, false) => clip_crossing(clip, p1, p2),
    }
}

fn clip_outside_end(clip: &ClipBox, inside: IPoint, outside: IPoint) -> IPoint {
    if inside.x == outside.x {
        return IPoint::new(outside.x, outside.y.clamp(clip.top(), clip.bottom()));
    }
    if inside.y == outside.y {
        return IPoint::new(outside.x.clamp(clip.left(), clip.right()), outside.y);
    }

    // The exit point is the boundary hit farthest from the inside end; the
    // nearer one can be the inside end itself when it sits on an edge.
    let origin = Point::from(inside);
    let exit = clip
        .edge_hits(inside, outside)
        .into_iter()
        .max_by(|a, b| origin.distance_to(a).total_cmp(&origin.distance_to(b)));

    match exit {
        Some(p) => p.round(),
        None => {
            log::debug!(
                "clip: no exit point for ({},{})-({},{}) in {:?}",
                inside.x,
                inside.y,
                outside.x,
                outside.y,
                clip
            );
            IPoint::new(
                outside.x.clamp(clip.left(), clip.right()),
                outside.y.clamp(clip.top(), clip.bottom()),
            )
        }
    }
}

fn clip_crossing(clip: &ClipBox, p1: IPoint, p2: IPoint) -> Option<(IPoint, IPoint)> {
    let mut distinct: Vec<Point> = Vec::with_capacity(2);
    for hit in clip.edge_hits(p1, p2) {
        // A corner crossing hits two edges at the same place.
        if distinct.iter().all(|d| d.distance_to(&hit) > 0.5) {
            distinct.push(hit);
        }
    }

    match distinct.len() {
        0 => None,
        1 => {
            log::debug!(
                "clip: ({},{})-({},{}) only touches {:?}",
                p1.x,
                p1.y,
                p2.x,
                p2.y,
                clip
            );
            None
        }
        _ => {
            let origin = Point::from(p1);
            distinct.sort_by(|a, b| origin.distance_to(a).total_cmp(&origin.distance_to(b)));
            Some((distinct[0].round(), distinct[distinct.len() - 1].round()))
        }
    }
}

/// Quick reject for polylines: false when the bounding box of `points` lies
/// entirely outside `clip`, or when there is nothing to draw. No clip box
/// means always drawable.
pub fn is_poly_drawable(clip: Option<&ClipBox>, points: &[IPoint]) -> bool {
    let Some(clip) = clip else {
        return true;
    };
    let Some(first) = points.first() else {
        return false;
    };

    let (mut xmin, mut xmax, mut ymin, mut ymax) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        xmin = xmin.min(p.x);
        xmax = xmax.max(p.x);
        ymin = ymin.min(p.y);
        ymax = ymax.max(p.y);
    }

    !(xmax < clip.left() || xmin > clip.right() || ymax < clip.top() || ymin > clip.bottom())
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Left(f64),
    Top(f64),
    Right(f64),
    Bottom(f64),
}

impl Boundary {
    fn inside(&self, p: &Point) -> bool {
        match *self {
            Boundary::Left(x) => p.x >= x,
            Boundary::Top(y) => p.y >= y,
            Boundary::Right(x) => p.x <= x,
            Boundary::Bottom(y) => p.y <= y,
        }
    }

    fn intersect(&self, a: &Point, b: &Point) -> Point {
        match *self {
            Boundary::Left(x) | Boundary::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            Boundary::Top(y) | Boundary::Bottom(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        }
    }

    fn clip(&self, input: &[Point]) -> Vec<Point> {
        let mut output = Vec::with_capacity(input.len() + 1);
        let Some(mut prev) = input.last() else {
            return output;
        };
        for cur in input {
            match (self.inside(prev), self.inside(cur)) {
                (true, true) => output.push(*cur),
                (true, false) => output.push(self.intersect(prev, cur)),
                (false, true) => {
                    output.push(self.intersect(prev, cur));
                    output.push(*cur);
                }
                (false, false) => {}
            }
            prev = cur;
        }
        output
    }
}

/// Sutherland-Hodgman clip of a (possibly concave) polygon against `clip`.
pub fn clip_polygon(clip: &ClipBox, vertices: &[IPoint]) -> Vec<IPoint> {
    let bbox = clip.to_bbox();
    let passes = [
        Boundary::Left(bbox.min.x),
        Boundary::Top(bbox.min.y),
        Boundary::Right(bbox.max.x),
        Boundary::Bottom(bbox.max.y),
    ];

    let mut ring: Vec<Point> = vertices.iter().map(|p| Point::from(*p)).collect();
    for pass in &passes {
        ring = pass.clip(&ring);
        if ring.is_empty() {
            break;
        }
    }
    ring.iter().map(Point::round).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> ClipBox {
        ClipBox::new(0, 0, 100, 100)
    }

    #[test]
    fn test_inside_segment_unchanged() {
        let a = IPoint::new(10, 10);
        let b = IPoint::new(90, 40);
        assert_eq!(clip_line(&unit_box(), a, b), Some((a, b)));
    }

    #[test]
    fn test_outside_segment_rejected() {
        let r = clip_line(&unit_box(), IPoint::new(150, 10), IPoint::new(200, 80));
        assert_eq!(r, None);
        let r = clip_line(&unit_box(), IPoint::new(-50, -10), IPoint::new(-5, 200));
        assert_eq!(r, None);
    }

    #[test]
    fn test_horizontal_entering_from_left() {
        let r = clip_line(&unit_box(), IPoint::new(-10, 50), IPoint::new(50, 50));
        assert_eq!(r, Some((IPoint::new(0, 50), IPoint::new(50, 50))));
    }

    #[test]
    fn test_vertical_leaving_bottom() {
        let r = clip_line(&unit_box(), IPoint::new(20, 50), IPoint::new(20, 500));
        assert_eq!(r, Some((IPoint::new(20, 50), IPoint::new(20, 100))));
    }

    #[test]
    fn test_diagonal_one_end_inside() {
        let r = clip_line(&unit_box(), IPoint::new(50, 50), IPoint::new(150, 150));
        assert_eq!(r, Some((IPoint::new(50, 50), IPoint::new(100, 100))));
    }

    #[test]
    fn test_inside_end_on_boundary() {
        let r = clip_line(&unit_box(), IPoint::new(0, 50), IPoint::new(200, 250));
        assert_eq!(r, Some((IPoint::new(0, 50), IPoint::new(50, 100))));
    }

    #[test]
    fn test_crossing_both_ends_outside_keeps_direction() {
        let r = clip_line(&unit_box(), IPoint::new(150, 50), IPoint::new(-50, 50));
        assert_eq!(r, Some((IPoint::new(100, 50), IPoint::new(0, 50))));
    }

    #[test]
    fn test_corner_touch_is_degenerate() {
        let r = clip_line(&unit_box(), IPoint::new(-10, 10), IPoint::new(10, -10));
        assert_eq!(r, None);
    }

    #[test]
    fn test_segment_along_edge() {
        let r = clip_line(&unit_box(), IPoint::new(-10, 0), IPoint::new(110, 0));
        assert_eq!(r, Some((IPoint::new(0, 0), IPoint::new(100, 0))));
    }

    #[test]
    fn test_corners_spanning_whole_range() {
        let b = ClipBox::from_corners(IPoint::new(i32::MAX, i32::MAX), IPoint::new(i32::MIN, i32::MIN));
        assert_eq!(b.left(), i32::MIN);
        assert_eq!(b.width, i32::MAX);
        assert_eq!(b.right(), -1);
        assert!(b.contains(IPoint::new(-1, -1)));
        assert!(!b.contains(IPoint::new(0, 0)));

        let neg = ClipBox::new(i32::MIN + 1, 0, i32::MIN, 10);
        assert_eq!(neg.left(), i32::MIN);
        assert_eq!(neg.width, i32::MAX);
    }

    #[test]
    fn test_far_outside_segment_is_clipped() {
        let r = clip_line(&unit_box(), IPoint::new(50, 50), IPoint::new(2_000_000_000, 50));
        assert_eq!(r, Some((IPoint::new(50, 50), IPoint::new(100, 50))));
        let r = clip_line(&unit_box(), IPoint::new(-2_000_000_000, -2_000_000_000), IPoint::new(2_000_000_000, 2_000_000_000));
        assert_eq!(r, Some((IPoint::new(0, 0), IPoint::new(100, 100))));
    }

    #[test]
    fn test_inflate() {
        let b = unit_box().inflate(5);
        assert_eq!(b, ClipBox::new(-5, -5, 110, 110));
        assert!(b.contains(IPoint::new(104, 104)));
    }

    #[test]
    fn test_polygon_inside_is_unchanged() {
        let poly = vec![
            IPoint::new(10, 10),
            IPoint::new(90, 10),
            IPoint::new(50, 80),
        ];
        assert_eq!(clip_polygon(&unit_box(), &poly), poly);
    }

    #[test]
    fn test_polygon_clipped_to_box() {
        let poly = vec![
            IPoint::new(-50, -50),
            IPoint::new(150, -50),
            IPoint::new(150, 150),
            IPoint::new(-50, 150),
        ];
        let out = clip_polygon(&unit_box(), &poly);
        assert_eq!(out.len(), 4);
        for p in &out {
            assert!(unit_box().contains(*p));
        }
    }

    #[test]
    fn test_polygon_outside_is_empty() {
        let poly = vec![
            IPoint::new(200, 200),
            IPoint::new(300, 200),
            IPoint::new(250, 300),
        ];
        assert!(clip_polygon(&unit_box(), &poly).is_empty());
    }

    #[test]
    fn test_poly_drawable() {
        let pts = [IPoint::new(200, 200), IPoint::new(300, 300)];
        assert!(!is_poly_drawable(Some(&unit_box()), &pts));
        assert!(is_poly_drawable(None, &pts));
        assert!(!is_poly_drawable(Some(&unit_box()), &[]));
    }
}
