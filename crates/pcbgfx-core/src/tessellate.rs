//! Triangulation of contour sets.
//!
//! The solid contours of a layer are merged into one region and every hole
//! is subtracted from it before ear clipping, so a drill cuts through all
//! the copper it touches, not only the shape it was drawn for.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use log::{debug, warn};

use crate::contour::{Contour, GeometryError};
use crate::geometry::{signed_area, BBox, Point};
use crate::mesh::Mesh;
use crate::spatial::{ContourEntry, ContourIndex};

const MIN_AREA: f64 = 1e-12;

fn usable(c: &Contour) -> bool {
    c.len() >= 3 && c.signed_area().abs() > MIN_AREA
}

/// Ring as overlay input, counter-clockwise so overlapping rings add up.
fn to_path(points: &[Point]) -> Vec<[f64; 2]> {
    let mut path: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    if signed_area(points) < 0.0 {
        path.reverse();
    }
    path
}

/// Triangulate the union of the counter-clockwise contours in `contours`,
/// minus the union of the clockwise contours of the same set and of every
/// contour in `extra_holes`.
pub(crate) fn triangulate(contours: &[&Contour], extra_holes: &[&Contour]) -> Result<Mesh, GeometryError> {
    let mut solids = Vec::new();
    let mut holes = Vec::new();
    for c in contours {
        if !usable(c) {
            warn!("skipping degenerate contour with {} vertices", c.len());
            continue;
        }
        if c.is_hole() {
            holes.push(c.vertices());
        } else {
            solids.push(c.vertices());
        }
    }
    holes.extend(extra_holes.iter().filter(|c| usable(c)).map(|c| c.vertices()));

    let mut mesh = Mesh::new();
    if solids.is_empty() {
        return Ok(mesh);
    }

    let index = ContourIndex::build(
        solids
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                BBox::from_points(s).map(|bbox| ContourEntry {
                    contour_index: i,
                    bbox,
                })
            })
            .collect(),
    );

    let subject: Vec<Vec<[f64; 2]>> = solids.iter().map(|s| to_path(s)).collect();
    // holes clear of every solid cannot change the result
    let clip: Vec<Vec<[f64; 2]>> = holes
        .iter()
        .filter(|h| BBox::from_points(h).is_some_and(|bbox| !index.query_intersecting(&bbox).is_empty()))
        .map(|h| to_path(h))
        .collect();

    let shapes = subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);
    for shape in &shapes {
        let mut rings = shape
            .iter()
            .map(|ring| ring.iter().map(|p| Point::new(p[0], p[1])).collect::<Vec<Point>>())
            .filter(|ring| ring.len() >= 3);
        let Some(outer) = rings.next() else {
            continue;
        };
        let inner: Vec<Vec<Point>> = rings.collect();
        append_polygon(&mut mesh, outer, &inner)?;
    }
    debug!(
        "tessellated {} solids and {} holes into {} triangles",
        solids.len(),
        clip.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn append_polygon(mesh: &mut Mesh, mut outer: Vec<Point>, holes: &[Vec<Point>]) -> Result<(), GeometryError> {
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }
    let base = mesh.vertices.len();
    let mut coords = Vec::with_capacity(2 * (outer.len() + holes.iter().map(|h| h.len()).sum::<usize>()));
    let mut hole_starts = Vec::with_capacity(holes.len());

    for p in &outer {
        coords.push(p.x);
        coords.push(p.y);
    }
    mesh.rings.push((base..base + outer.len()).collect());
    mesh.vertices.extend_from_slice(&outer);

    for hole in holes {
        let start = mesh.vertices.len();
        hole_starts.push(start - base);
        for p in hole {
            coords.push(p.x);
            coords.push(p.y);
        }
        let mut ring: Vec<usize> = (start..start + hole.len()).collect();
        if signed_area(hole) > 0.0 {
            ring.reverse();
        }
        mesh.rings.push(ring);
        mesh.vertices.extend_from_slice(hole);
    }

    let indices = earcutr::earcut(&coords, &hole_starts, 2)
        .map_err(|e| GeometryError::Triangulation(format!("{:?}", e)))?;

    for tri in indices.chunks_exact(3) {
        let mut t = [tri[0] + base, tri[1] + base, tri[2] + base];
        let area = mesh.triangle_area(&t);
        if area < 0.0 {
            t.swap(1, 2);
        }
        mesh.triangles.push(t);
    }
    Ok(())
}
