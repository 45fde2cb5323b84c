use pcbgfx_core::clip::ClipBox;
use pcbgfx_core::geometry::{ki_round, BBox, IPoint, Point};
use serde::{Deserialize, Serialize};

/// Mapping between board coordinates (internal units, Y down) and device
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Board point shown at the canvas centre.
    pub center: Point,
    /// Device pixels per internal unit.
    pub zoom: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Horizontal mirror, used when looking at the board from the back.
    #[serde(default)]
    pub mirrored: bool,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 1e-9;
    pub const MAX_ZOOM: f64 = 1.0;

    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            center: Point::default(),
            zoom: 1e-5,
            canvas_width,
            canvas_height,
            mirrored: false,
        }
    }

    /// Pan by a delta in device pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let dx = if self.mirrored { -dx } else { dx };
        self.center.x -= dx / self.zoom;
        self.center.y -= dy / self.zoom;
    }

    /// Zoom about a device position, keeping the board point under it fixed.
    pub fn zoom_at(&mut self, device: Point, factor: f64) {
        let before = self.to_board(device);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let after = self.to_board(device);
        self.center.x -= after.x - before.x;
        self.center.y -= after.y - before.y;
    }

    /// Centre on `bbox` and zoom so it fills the canvas with a 10% margin.
    pub fn fit(&mut self, bbox: &BBox) {
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return;
        }
        self.center = bbox.center();
        let zoom_x = self.canvas_width / bbox.width() * 0.9;
        let zoom_y = self.canvas_height / bbox.height() * 0.9;
        self.zoom = zoom_x.min(zoom_y).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    /// Device pixels per internal unit on each axis, negative when mirrored.
    pub fn axis_scale(&self) -> (f64, f64) {
        if self.mirrored {
            (-self.zoom, self.zoom)
        } else {
            (self.zoom, self.zoom)
        }
    }

    pub fn to_device(&self, p: Point) -> Point {
        let (sx, sy) = self.axis_scale();
        Point::new(
            (p.x - self.center.x) * sx + self.canvas_width / 2.0,
            (p.y - self.center.y) * sy + self.canvas_height / 2.0,
        )
    }

    pub fn to_board(&self, device: Point) -> Point {
        let (sx, sy) = self.axis_scale();
        Point::new(
            (device.x - self.canvas_width / 2.0) / sx + self.center.x,
            (device.y - self.canvas_height / 2.0) / sy + self.center.y,
        )
    }

    /// Board area currently on the canvas.
    pub fn visible_bounds(&self) -> BBox {
        let half_w = self.canvas_width / (2.0 * self.zoom);
        let half_h = self.canvas_height / (2.0 * self.zoom);
        BBox::new(
            Point::new(self.center.x - half_w, self.center.y - half_h),
            Point::new(self.center.x + half_w, self.center.y + half_h),
        )
    }

    /// Clip box in board coordinates for drawing this view. Far zoomed out,
    /// the box stops at half the `i32` range on each side.
    pub fn clip_box(&self) -> ClipBox {
        let b = self.visible_bounds();
        let limit = f64::from(i32::MAX / 2);
        let corner = |p: Point| IPoint::new(ki_round(p.x.clamp(-limit, limit)), ki_round(p.y.clamp(-limit, limit)));
        ClipBox::from_corners(corner(b.min), corner(b.max))
    }

    /// Board length of one device pixel.
    pub fn pixel_size(&self) -> f64 {
        1.0 / self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.center = Point::new(1e6, 2e6);
        vp.zoom = 1e-4;
        let p = Point::new(1.5e6, 1.8e6);
        let back = vp.to_board(vp.to_device(p));
        assert!((back.x - p.x).abs() < 1e-6);
        assert!((back.y - p.y).abs() < 1e-6);

        vp.set_mirrored(true);
        let d = vp.to_device(p);
        assert!(d.x < 400.0);
        let back = vp.to_board(d);
        assert!((back.x - p.x).abs() < 1e-6);
    }

    #[test]
    fn test_fit_and_clip_box() {
        let mut vp = Viewport::new(1000.0, 1000.0);
        vp.fit(&BBox::new(Point::new(0.0, 0.0), Point::new(1e7, 1e7)));
        assert!((vp.zoom - 9e-5).abs() < 1e-12);
        let clip = vp.clip_box();
        assert!(clip.contains(IPoint::new(0, 0)));
        assert!(clip.contains(IPoint::new(10_000_000, 10_000_000)));
        assert!(!clip.contains(IPoint::new(-1_000_000, 0)));
    }

    #[test]
    fn test_clip_box_at_min_zoom() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.zoom = Viewport::MIN_ZOOM;
        let clip = vp.clip_box();
        assert!(clip.contains(IPoint::new(0, 0)));
        assert!(clip.contains(IPoint::new(1_000_000_000, -1_000_000_000)));
        assert!(clip.right() > 0 && clip.left() < 0);
    }

    #[test]
    fn test_zoom_at_keeps_point() {
        let mut vp = Viewport::new(800.0, 600.0);
        let cursor = Point::new(100.0, 100.0);
        let before = vp.to_board(cursor);
        vp.zoom_at(cursor, 2.0);
        let after = vp.to_board(cursor);
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }
}
