use pcbgfx_core::geometry::IPoint;
use pcbgfx_core::layer::LayerColor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<LayerColor> for Color {
    fn from(c: LayerColor) -> Self {
        Self::new(c.r, c.g, c.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenStyle {
    #[default]
    Solid,
    ShortDash,
    DotDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pen {
    pub color: Color,
    /// Stroke width in logical units; zero is the thinnest visible line.
    pub width: i32,
    pub style: PenStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Color,
    /// `false` means a transparent brush.
    pub filled: bool,
}

/// Raster operation used when writing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMode {
    #[default]
    Copy,
    Or,
    Xor,
    NXor,
    Invert,
}

/// A drawing device. Coordinates are logical units; the device maps them
/// to pixels with its own transform, whose per-axis scale is reported by
/// [`Surface::axis_scale`].
pub trait Surface {
    /// Identity of the device behind this surface. Cached pen and brush
    /// state is only reused for the same identity.
    fn surface_id(&self) -> u64;

    /// Device units per logical unit on each axis. A negative component
    /// means that axis is mirrored.
    fn axis_scale(&self) -> (f64, f64) {
        (1.0, 1.0)
    }

    fn set_pen(&mut self, pen: &Pen);
    fn set_brush(&mut self, brush: &Brush);
    fn set_draw_mode(&mut self, mode: DrawMode);

    fn draw_point(&mut self, at: IPoint);
    fn draw_line(&mut self, from: IPoint, to: IPoint);

    /// Connected polyline. The final point itself is not plotted.
    fn draw_lines(&mut self, points: &[IPoint]) {
        for w in points.windows(2) {
            self.draw_line(w[0], w[1]);
        }
    }

    /// Closed polygon, filled with the current brush.
    fn draw_polygon(&mut self, points: &[IPoint]);

    /// Arc from `start` to `end` counter-clockwise on screen around
    /// `center`, filled as a pie with the current brush.
    fn draw_arc(&mut self, start: IPoint, end: IPoint, center: IPoint);

    fn draw_circle(&mut self, center: IPoint, radius: i32);
}
