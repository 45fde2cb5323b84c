//! Flattening of quadratic and cubic Bezier curves into polylines by
//! recursive subdivision.

use pcbgfx_core::geometry::{IPoint, Point};

const RECURSION_LIMIT: u32 = 16;
/// Squared distance below which a curve piece counts as flat.
const FLATNESS_SQ: f64 = 0.25;
const COLLINEARITY_EPSILON: f64 = 1e-30;

pub fn flatten_quadratic(p1: IPoint, p2: IPoint, p3: IPoint) -> Vec<IPoint> {
    let mut out = vec![p1];
    subdivide_quadratic(p1.into(), p2.into(), p3.into(), 0, &mut out);
    push_unique(&mut out, p3);
    out
}

pub fn flatten_cubic(p1: IPoint, p2: IPoint, p3: IPoint, p4: IPoint) -> Vec<IPoint> {
    let mut out = vec![p1];
    subdivide_cubic(p1.into(), p2.into(), p3.into(), p4.into(), 0, &mut out);
    push_unique(&mut out, p4);
    out
}

fn push_unique(out: &mut Vec<IPoint>, p: IPoint) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

fn mid(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn subdivide_quadratic(p1: Point, p2: Point, p3: Point, depth: u32, out: &mut Vec<IPoint>) {
    if depth > RECURSION_LIMIT {
        return;
    }
    let p12 = mid(p1, p2);
    let p23 = mid(p2, p3);
    let p123 = mid(p12, p23);

    let dx = p3.x - p1.x;
    let dy = p3.y - p1.y;
    let d = ((p2.x - p3.x) * dy - (p2.y - p3.y) * dx).abs();
    let len_sq = dx * dx + dy * dy;
    let flat = if d > COLLINEARITY_EPSILON {
        d * d <= FLATNESS_SQ * len_sq
    } else {
        // control point on the chord; flat when it lies between the ends
        let sq = (p2.x - p123.x).powi(2) + (p2.y - p123.y).powi(2);
        sq < FLATNESS_SQ
    };
    if flat {
        push_unique(out, p123.round());
        return;
    }
    subdivide_quadratic(p1, p12, p123, depth + 1, out);
    subdivide_quadratic(p123, p23, p3, depth + 1, out);
}

fn subdivide_cubic(p1: Point, p2: Point, p3: Point, p4: Point, depth: u32, out: &mut Vec<IPoint>) {
    if depth > RECURSION_LIMIT {
        return;
    }
    let p12 = mid(p1, p2);
    let p23 = mid(p2, p3);
    let p34 = mid(p3, p4);
    let p123 = mid(p12, p23);
    let p234 = mid(p23, p34);
    let p1234 = mid(p123, p234);

    let dx = p4.x - p1.x;
    let dy = p4.y - p1.y;
    let d2 = ((p2.x - p4.x) * dy - (p2.y - p4.y) * dx).abs();
    let d3 = ((p3.x - p4.x) * dy - (p3.y - p4.y) * dx).abs();
    let len_sq = dx * dx + dy * dy;
    let flat = if d2 + d3 > COLLINEARITY_EPSILON && len_sq > COLLINEARITY_EPSILON {
        (d2 + d3) * (d2 + d3) <= FLATNESS_SQ * len_sq
    } else {
        let sq = (p1.x - p1234.x).powi(2)
            + (p1.y - p1234.y).powi(2)
            + (p4.x - p1234.x).powi(2)
            + (p4.y - p1234.y).powi(2);
        sq < FLATNESS_SQ
    };
    if flat {
        push_unique(out, p1234.round());
        return;
    }
    subdivide_cubic(p1, p12, p123, p1234, depth + 1, out);
    subdivide_cubic(p1234, p234, p34, p4, depth + 1, out);
}
