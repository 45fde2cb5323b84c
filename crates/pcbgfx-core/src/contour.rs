//! Per-layer contour model.
//!
//! A [`ContourLayer`] collects closed polygons for one output layer. The
//! winding of each contour decides its role: counter-clockwise contours are
//! solid, clockwise contours are holes. Curved primitives are flattened with
//! a segment count derived from the layer's maximum chord deviation.

use std::f64::consts::{PI, TAU};
use std::io::{self, Write};

use thiserror::Error;

use crate::geometry::{distance, rotate_point, signed_area, BBox, Point};
use crate::mesh::Mesh;
use crate::tessellate;

pub type ContourId = usize;

pub const MIN_SEGMENTS: usize = 6;
pub const MAX_SEGMENTS: usize = 360;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("layer is sealed after tessellation")]
    LayerSealed,
    #[error("contour {0} does not exist or was discarded")]
    InvalidContour(ContourId),
    #[error("contour {id} has {vertices} vertices, at least 3 are required")]
    DegenerateContour { id: ContourId, vertices: usize },
    #[error("invalid shape parameter: {0}")]
    InvalidParameter(String),
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Number of polygon edges needed so a circle of `radius` stays within
/// `max_deviation` of the true curve.
pub fn segments_for_radius(radius: f64, max_deviation: f64) -> usize {
    if !(radius > 0.0) || !(max_deviation > 0.0) {
        return MIN_SEGMENTS;
    }
    let ratio = max_deviation / radius;
    if ratio >= 1.0 {
        return MIN_SEGMENTS;
    }
    let n = (PI / (1.0 - ratio).acos() - 1e-9).ceil();
    (n as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// A closed vertex ring. The closing edge from the last vertex back to the
/// first is implicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    vertices: Vec<Point>,
    discarded: bool,
}

impl Contour {
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }
}

#[derive(Debug, Clone)]
pub struct ContourLayer {
    contours: Vec<Contour>,
    max_deviation: f64,
    sealed: bool,
    mesh: Option<Mesh>,
}

impl ContourLayer {
    pub fn new() -> Self {
        Self::with_max_deviation(0.02)
    }

    pub fn with_max_deviation(max_deviation: f64) -> Self {
        Self {
            contours: Vec::new(),
            max_deviation,
            sealed: false,
            mesh: None,
        }
    }

    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    pub fn set_max_deviation(&mut self, max_deviation: f64) {
        self.max_deviation = max_deviation;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Contours that still take part in tessellation.
    pub fn contours(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| !c.discarded)
    }

    pub fn contour(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(id)
    }

    pub fn contour_count(&self) -> usize {
        self.contours().count()
    }

    pub fn is_empty(&self) -> bool {
        self.contour_count() == 0
    }

    pub fn new_contour(&mut self) -> Result<ContourId, GeometryError> {
        if self.sealed {
            return Err(GeometryError::LayerSealed);
        }
        self.contours.push(Contour::default());
        Ok(self.contours.len() - 1)
    }

    fn open_contour(&mut self, id: ContourId) -> Result<&mut Contour, GeometryError> {
        if self.sealed {
            return Err(GeometryError::LayerSealed);
        }
        match self.contours.get_mut(id) {
            Some(c) if !c.discarded => Ok(c),
            _ => Err(GeometryError::InvalidContour(id)),
        }
    }

    /// Append a vertex. A vertex equal to the previous one is dropped.
    pub fn add_vertex(&mut self, id: ContourId, x: f64, y: f64) -> Result<(), GeometryError> {
        let contour = self.open_contour(id)?;
        let p = Point::new(x, y);
        if contour.vertices.last() != Some(&p) {
            contour.vertices.push(p);
        }
        Ok(())
    }

    /// Reverse the contour if needed so it runs clockwise for a hole and
    /// counter-clockwise otherwise.
    pub fn ensure_winding(&mut self, id: ContourId, hole: bool) -> Result<(), GeometryError> {
        let contour = self.open_contour(id)?;
        if contour.vertices.first() == contour.vertices.last() && contour.vertices.len() > 1 {
            contour.vertices.pop();
        }
        if contour.vertices.len() < 3 {
            return Err(GeometryError::DegenerateContour {
                id,
                vertices: contour.vertices.len(),
            });
        }
        let area = contour.signed_area();
        if (hole && area > 0.0) || (!hole && area < 0.0) {
            contour.vertices.reverse();
        }
        Ok(())
    }

    pub fn discard_contour(&mut self, id: ContourId) -> Result<(), GeometryError> {
        let contour = self.open_contour(id)?;
        contour.discarded = true;
        Ok(())
    }

    /// Add a closed polygon from `points`. Degenerate input is discarded and
    /// reported.
    pub fn add_polygon(&mut self, points: &[Point], hole: bool) -> Result<ContourId, GeometryError> {
        let id = self.new_contour()?;
        for p in points {
            self.add_vertex(id, p.x, p.y)?;
        }
        self.finish(id, hole)
    }

    fn finish(&mut self, id: ContourId, hole: bool) -> Result<ContourId, GeometryError> {
        if let Err(e) = self.ensure_winding(id, hole) {
            self.discard_contour(id)?;
            return Err(e);
        }
        Ok(id)
    }

    pub fn add_circle(&mut self, center: Point, radius: f64, hole: bool) -> Result<ContourId, GeometryError> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(GeometryError::InvalidParameter(format!("circle radius {}", radius)));
        }
        let n = segments_for_radius(radius, self.max_deviation);
        let id = self.new_contour()?;
        for i in 0..n {
            let a = TAU * i as f64 / n as f64;
            self.add_vertex(id, center.x + radius * a.cos(), center.y + radius * a.sin())?;
        }
        self.finish(id, hole)
    }

    /// Add a stadium of overall `length` along `angle` (radians, CCW) with
    /// semicircular ends of diameter `width`.
    pub fn add_slot(
        &mut self,
        center: Point,
        length: f64,
        width: f64,
        angle: f64,
        hole: bool,
    ) -> Result<ContourId, GeometryError> {
        if !(length > 0.0) || !(width > 0.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "slot {} x {}",
                length, width
            )));
        }
        let (length, width, angle) = if width > length {
            (width, length, angle + PI / 2.0)
        } else {
            (length, width, angle)
        };
        let radius = width / 2.0;
        let half = length / 2.0 - radius;
        if half <= 0.0 {
            return self.add_circle(center, radius, hole);
        }

        let cap = (segments_for_radius(radius, self.max_deviation) / 2).max(3);
        let mut ring = Vec::with_capacity(2 * (cap + 1));
        for i in 0..=cap {
            let a = -PI / 2.0 + PI * i as f64 / cap as f64;
            ring.push(Point::new(half + radius * a.cos(), radius * a.sin()));
        }
        for i in 0..=cap {
            let a = PI / 2.0 + PI * i as f64 / cap as f64;
            ring.push(Point::new(-half + radius * a.cos(), radius * a.sin()));
        }

        let id = self.new_contour()?;
        for p in ring {
            let p = rotate_point(p, angle) + center;
            self.add_vertex(id, p.x, p.y)?;
        }
        self.finish(id, hole)
    }

    /// Add a thick arc centred on `center`, starting at `start` and sweeping
    /// `angle` radians (positive is CCW), with round end caps. When the inner
    /// radius collapses the arc becomes a pie slice.
    pub fn add_arc(
        &mut self,
        center: Point,
        start: Point,
        width: f64,
        angle: f64,
        hole: bool,
    ) -> Result<ContourId, GeometryError> {
        let radius = distance(center, start);
        if !(radius > 0.0) || !(width > 0.0) || angle == 0.0 || !angle.is_finite() {
            return Err(GeometryError::InvalidParameter(format!(
                "arc radius {} width {} angle {}",
                radius, width, angle
            )));
        }
        let half_width = width / 2.0;
        let outer = radius + half_width;
        let inner = radius - half_width;

        if angle.abs() >= TAU - 1e-9 {
            let id = self.add_circle(center, outer, hole)?;
            if inner > self.max_deviation {
                self.add_circle(center, inner, !hole)?;
            }
            return Ok(id);
        }

        let a0 = (start.y - center.y).atan2(start.x - center.x);
        let full = segments_for_radius(outer, self.max_deviation) as f64;
        let steps = ((full * angle.abs() / TAU).ceil() as usize).max(2);
        let on = |r: f64, a: f64| Point::new(center.x + r * a.cos(), center.y + r * a.sin());

        let mut ring = Vec::new();
        if inner <= self.max_deviation {
            for i in 0..=steps {
                ring.push(on(outer, a0 + angle * i as f64 / steps as f64));
            }
            ring.push(center);
        } else {
            let cap = (segments_for_radius(half_width, self.max_deviation) / 2).max(3);
            // caps turn outward, away from the sweep interior
            let dir = angle.signum();
            for i in 0..=steps {
                ring.push(on(outer, a0 + angle * i as f64 / steps as f64));
            }
            let end_mid = on(radius, a0 + angle);
            let end_out = a0 + angle;
            for j in 1..cap {
                let a = end_out + dir * PI * j as f64 / cap as f64;
                ring.push(end_mid + Point::new(half_width * a.cos(), half_width * a.sin()));
            }
            for i in (0..=steps).rev() {
                ring.push(on(inner, a0 + angle * i as f64 / steps as f64));
            }
            let start_mid = on(radius, a0);
            for j in 1..cap {
                let a = a0 + PI + dir * PI * j as f64 / cap as f64;
                ring.push(start_mid + Point::new(half_width * a.cos(), half_width * a.sin()));
            }
        }

        let id = self.new_contour()?;
        for p in ring {
            self.add_vertex(id, p.x, p.y)?;
        }
        self.finish(id, hole)
    }

    /// Triangulate the solid contours of this layer. Overlapping solids are
    /// merged, then every hole is cut out of them, whether it comes from this
    /// layer's own clockwise contours or from `holes`. The layer accepts no
    /// further geometry afterwards.
    pub fn tessellate(&mut self, holes: Option<&ContourLayer>) -> Result<&Mesh, GeometryError> {
        let extra: Vec<&Contour> = holes.map(|h| h.contours().collect()).unwrap_or_default();
        let own: Vec<&Contour> = self.contours().collect();
        let mesh = tessellate::triangulate(&own, &extra)?;
        self.sealed = true;
        Ok(self.mesh.insert(mesh))
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Drop all geometry and reopen the layer.
    pub fn clear(&mut self) {
        self.contours.clear();
        self.sealed = false;
        self.mesh = None;
    }

    pub fn write_vertices<W: Write>(&self, z: f64, out: &mut W) -> io::Result<()> {
        match &self.mesh {
            Some(m) => m.write_vertices(z, out),
            None => Ok(()),
        }
    }

    pub fn write_indices<W: Write>(&self, top: bool, out: &mut W) -> io::Result<()> {
        match &self.mesh {
            Some(m) => m.write_indices(top, out),
            None => Ok(()),
        }
    }

    pub fn write_3d_vertices<W: Write>(&self, top_z: f64, bottom_z: f64, out: &mut W) -> io::Result<()> {
        match &self.mesh {
            Some(m) => m.write_3d_vertices(top_z, bottom_z, out),
            None => Ok(()),
        }
    }

    pub fn write_3d_indices<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.mesh {
            Some(m) => m.write_3d_indices(out),
            None => Ok(()),
        }
    }
}

impl Default for ContourLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_for_radius() {
        assert_eq!(segments_for_radius(1000.0, 20.0), 16);
        assert_eq!(segments_for_radius(5.0, 20.0), MIN_SEGMENTS);
        assert_eq!(segments_for_radius(1e12, 1e-3), MAX_SEGMENTS);
        assert_eq!(segments_for_radius(0.0, 20.0), MIN_SEGMENTS);
    }

    #[test]
    fn test_ensure_winding_reverses_clockwise() {
        let mut layer = ContourLayer::new();
        let id = layer.new_contour().unwrap();
        for (x, y) in [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)] {
            layer.add_vertex(id, x, y).unwrap();
        }
        assert!(layer.contour(id).unwrap().is_hole());
        layer.ensure_winding(id, false).unwrap();
        assert!(!layer.contour(id).unwrap().is_hole());
        layer.ensure_winding(id, true).unwrap();
        assert!(layer.contour(id).unwrap().is_hole());
    }

    #[test]
    fn test_ensure_winding_is_idempotent() {
        let mut layer = ContourLayer::new();
        let id = layer.new_contour().unwrap();
        for (x, y) in [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)] {
            layer.add_vertex(id, x, y).unwrap();
        }
        for hole in [false, true] {
            layer.ensure_winding(id, hole).unwrap();
            let once = layer.contour(id).unwrap().vertices().to_vec();
            layer.ensure_winding(id, hole).unwrap();
            let twice = layer.contour(id).unwrap().vertices();
            assert_eq!(twice.len(), 4);
            assert_eq!(once.as_slice(), twice);
            assert_eq!(layer.contour(id).unwrap().is_hole(), hole);
        }
    }

    #[test]
    fn test_degenerate_contour() {
        let mut layer = ContourLayer::new();
        let id = layer.new_contour().unwrap();
        layer.add_vertex(id, 0.0, 0.0).unwrap();
        layer.add_vertex(id, 1.0, 0.0).unwrap();
        assert_eq!(
            layer.ensure_winding(id, false),
            Err(GeometryError::DegenerateContour { id, vertices: 2 })
        );
        let err = layer.add_polygon(&[Point::new(0.0, 0.0)], false).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateContour { .. }));
        // the failed polygon no longer counts
        assert_eq!(layer.contour_count(), 1);
    }

    #[test]
    fn test_discarded_contour_rejects_vertices() {
        let mut layer = ContourLayer::new();
        let id = layer.new_contour().unwrap();
        layer.discard_contour(id).unwrap();
        assert_eq!(layer.add_vertex(id, 0.0, 0.0), Err(GeometryError::InvalidContour(id)));
        assert_eq!(layer.add_vertex(42, 0.0, 0.0), Err(GeometryError::InvalidContour(42)));
    }

    #[test]
    fn test_circle_vertex_count_and_winding() {
        let mut layer = ContourLayer::with_max_deviation(20.0);
        let id = layer.add_circle(Point::new(0.0, 0.0), 1000.0, true).unwrap();
        let c = layer.contour(id).unwrap();
        assert_eq!(c.len(), 16);
        assert!(c.is_hole());
        assert!(layer.add_circle(Point::new(0.0, 0.0), 0.0, false).is_err());
    }

    #[test]
    fn test_slot_swaps_when_wider_than_long() {
        let mut layer = ContourLayer::with_max_deviation(0.01);
        let id = layer
            .add_slot(Point::new(0.0, 0.0), 1.0, 3.0, 0.0, false)
            .unwrap();
        let bbox = layer.contour(id).unwrap().bbox().unwrap();
        // the long axis ends up vertical
        assert!((bbox.height() - 3.0).abs() < 1e-9);
        assert!((bbox.width() - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_slot_area_close_to_stadium() {
        let mut layer = ContourLayer::with_max_deviation(0.001);
        let id = layer
            .add_slot(Point::new(5.0, 5.0), 4.0, 2.0, 0.3, false)
            .unwrap();
        let expected = 2.0 * 2.0 + PI;
        let area = layer.contour(id).unwrap().signed_area();
        assert!(area > 0.0);
        assert!((area - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_arc_is_solid_and_bounded() {
        let mut layer = ContourLayer::with_max_deviation(0.01);
        let id = layer
            .add_arc(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 1.0, PI / 2.0, false)
            .unwrap();
        let c = layer.contour(id).unwrap();
        assert!(!c.is_hole());
        let bbox = c.bbox().unwrap();
        assert!(bbox.max.x <= 10.5 + 1e-9);
        assert!(bbox.max.y <= 10.5 + 1e-9);
        assert!(bbox.min.x >= -0.5 - 1e-9);
        assert!(bbox.min.y >= -0.5 - 1e-9);
    }

    #[test]
    fn test_arc_collapses_to_pie() {
        let mut layer = ContourLayer::with_max_deviation(0.01);
        let id = layer
            .add_arc(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 2.0, -PI / 2.0, false)
            .unwrap();
        let c = layer.contour(id).unwrap();
        assert!(c.vertices().contains(&Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_sealed_after_tessellate() {
        let mut layer = ContourLayer::new();
        layer.add_circle(Point::new(0.0, 0.0), 1.0, false).unwrap();
        layer.tessellate(None).unwrap();
        assert!(layer.is_sealed());
        assert_eq!(layer.new_contour(), Err(GeometryError::LayerSealed));
        layer.clear();
        assert!(layer.new_contour().is_ok());
    }
}
