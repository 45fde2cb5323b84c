use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point in real-valued coordinates (output units or design units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Round to the nearest integer point, half away from zero.
    pub fn round(&self) -> IPoint {
        IPoint::new(ki_round(self.x), ki_round(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<IPoint> for Point {
    fn from(p: IPoint) -> Self {
        Point::new(p.x as f64, p.y as f64)
    }
}

/// An integer point: board internal units or device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IPoint {
    pub x: i32,
    pub y: i32,
}

impl IPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for IPoint {
    type Output = IPoint;

    fn add(self, rhs: IPoint) -> IPoint {
        IPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for IPoint {
    type Output = IPoint;

    fn sub(self, rhs: IPoint) -> IPoint {
        IPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        })
    }

    /// A square box of half-size `radius` around `center`.
    pub fn around(center: Point, radius: f64) -> Self {
        Self {
            min: Point::new(center.x - radius, center.y - radius),
            max: Point::new(center.x + radius, center.y + radius),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn inflate(&self, amount: f64) -> Self {
        Self {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }
}

/// Round half away from zero and saturate into the `i32` range.
pub fn ki_round(v: f64) -> i32 {
    let r = v.round();
    if r >= i32::MAX as f64 {
        i32::MAX
    } else if r <= i32::MIN as f64 {
        i32::MIN
    } else {
        r as i32
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(&b)
}

/// Rotate `p` about the origin by `angle` radians, counter-clockwise in math
/// coordinates.
pub fn rotate_point(p: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}

/// Rotate `p` about `center` by `angle` radians.
pub fn rotate_about(p: Point, center: Point, angle: f64) -> Point {
    rotate_point(p - center, angle) + center
}

const PARAM_EPSILON: f64 = 1e-9;

/// Intersection point of segments `p1-p2` and `p3-p4`.
///
/// Both segment parameters must fall inside `[0, 1]` (endpoints included).
/// Parallel and collinear segments, including overlapping ones, report no
/// intersection.
pub fn segment_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.x * d2.y - d1.y * d2.x;
    let scale = (d1.x.abs() + d1.y.abs()) * (d2.x.abs() + d2.y.abs());
    if scale == 0.0 || denom.abs() <= scale * 1e-12 {
        return None;
    }

    let w = p3 - p1;
    let t = (w.x * d2.y - w.y * d2.x) / denom;
    let u = (w.x * d1.y - w.y * d1.x) / denom;
    let range = -PARAM_EPSILON..=1.0 + PARAM_EPSILON;
    if !range.contains(&t) || !range.contains(&u) {
        return None;
    }
    Some(Point::new(p1.x + t * d1.x, p1.y + t * d1.y))
}

/// Signed area of a ring: positive when counter-clockwise.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = &ring[(i + 1) % ring.len()];
        acc += a.x * b.y - b.x * a.y;
    }
    acc / 2.0
}

/// Even-odd point in polygon test. Points exactly on an edge may land on
/// either side.
pub fn point_in_polygon(p: &Point, ring: &[Point]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
