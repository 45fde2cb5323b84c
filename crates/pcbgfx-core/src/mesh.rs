//! Triangle meshes produced by tessellation and their VRML serialization.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Format a number with a decimal point regardless of the host locale,
/// with at most six decimals and no trailing zeros.
pub fn format_real(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.6}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// A planar triangle mesh with the boundary rings of the region it covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    /// Counter-clockwise vertex triples.
    pub triangles: Vec<[usize; 3]>,
    /// Boundary rings as vertex indices. Outer rings run counter-clockwise
    /// and holes clockwise, so the solid is always on the left.
    pub rings: Vec<Vec<usize>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle_area(&self, tri: &[usize; 3]) -> f64 {
        let [a, b, c] = tri.map(|i| self.vertices[i]);
        ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)) / 2.0
    }

    /// Total area covered by the triangles.
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(|t| self.triangle_area(t)).sum()
    }

    /// Vertices of a flat layer at height `z`.
    pub fn write_vertices<W: Write>(&self, z: f64, out: &mut W) -> io::Result<()> {
        let z = format_real(z);
        for p in &self.vertices {
            writeln!(out, "                {} {} {},", format_real(p.x), format_real(p.y), z)?;
        }
        Ok(())
    }

    /// Face indices of a flat layer. Top layers face +Z, bottom layers -Z.
    pub fn write_indices<W: Write>(&self, top: bool, out: &mut W) -> io::Result<()> {
        for &[a, b, c] in &self.triangles {
            if top {
                writeln!(out, "              {},{},{},-1,", a, b, c)?;
            } else {
                writeln!(out, "              {},{},{},-1,", a, c, b)?;
            }
        }
        Ok(())
    }

    /// Vertices of an extruded solid: the top copy, then the bottom copy.
    pub fn write_3d_vertices<W: Write>(&self, top_z: f64, bottom_z: f64, out: &mut W) -> io::Result<()> {
        self.write_vertices(top_z, out)?;
        self.write_vertices(bottom_z, out)
    }

    /// Face indices of an extruded solid: top cap, bottom cap and the side
    /// walls of every ring, all facing outwards.
    pub fn write_3d_indices<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let n = self.vertices.len();
        self.write_indices(true, out)?;
        for &[a, b, c] in &self.triangles {
            writeln!(out, "              {},{},{},-1,", a + n, c + n, b + n)?;
        }
        for (a, b) in self.wall_edges() {
            writeln!(out, "              {},{},{},-1,", a, a + n, b + n)?;
            writeln!(out, "              {},{},{},-1,", a, b + n, b)?;
        }
        Ok(())
    }

    /// Directed boundary edges of every ring.
    pub fn wall_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rings.iter().flat_map(|ring| {
            ring.iter()
                .enumerate()
                .map(move |(i, &a)| (a, ring[(i + 1) % ring.len()]))
        })
    }
}
