//! Clipped drawing primitives on top of a [`Surface`].
//!
//! A [`RenderContext`] remembers the pen, brush and draw mode last sent to
//! each surface and only forwards a change when one of them differs. Every
//! primitive is clipped against the optional clip box before any device
//! call, which keeps the coordinates handed to the device bounded.

use log::debug;
use pcbgfx_core::clip::{clip_line, clip_polygon, is_poly_drawable, ClipBox};
use pcbgfx_core::geometry::{distance, ki_round, rotate_point, IPoint, Point};
use pcbgfx_core::units::decideg_to_rad;

use crate::bezier::{flatten_cubic, flatten_quadratic};
use crate::surface::{Brush, Color, DrawMode, Pen, PenStyle, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cached<T> {
    surface: u64,
    value: T,
}

#[derive(Debug, Default)]
pub struct RenderContext {
    pen: Option<Cached<Pen>>,
    brush: Option<Cached<Brush>>,
    draw_mode: Option<Cached<DrawMode>>,
    last_point: IPoint,
    force_black: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached device state. Call before each independent pass so
    /// the first primitive always sets its pen and brush.
    pub fn begin_frame(&mut self) {
        self.pen = None;
        self.brush = None;
        self.draw_mode = None;
    }

    /// Map every pen and brush color to black, for monochrome printing.
    pub fn set_force_black(&mut self, force: bool) {
        self.force_black = force;
    }

    pub fn force_black(&self) -> bool {
        self.force_black
    }

    pub fn last_point(&self) -> IPoint {
        self.last_point
    }

    fn effective(&self, color: Color) -> Color {
        if self.force_black {
            Color::BLACK
        } else {
            color
        }
    }

    pub fn set_pen<S: Surface + ?Sized>(&mut self, s: &mut S, color: Color, width: i32, style: PenStyle) {
        let pen = Pen {
            color: self.effective(color),
            width: width.max(0),
            style,
        };
        let wanted = Cached {
            surface: s.surface_id(),
            value: pen,
        };
        if self.pen != Some(wanted) {
            s.set_pen(&pen);
            self.pen = Some(wanted);
        }
    }

    pub fn set_brush<S: Surface + ?Sized>(&mut self, s: &mut S, color: Color, filled: bool) {
        let brush = Brush {
            color: self.effective(color),
            filled,
        };
        let wanted = Cached {
            surface: s.surface_id(),
            value: brush,
        };
        if self.brush != Some(wanted) {
            s.set_brush(&brush);
            self.brush = Some(wanted);
        }
    }

    pub fn set_draw_mode<S: Surface + ?Sized>(&mut self, s: &mut S, mode: DrawMode) {
        let wanted = Cached {
            surface: s.surface_id(),
            value: mode,
        };
        if self.draw_mode != Some(wanted) {
            s.set_draw_mode(mode);
            self.draw_mode = Some(wanted);
        }
    }

    pub fn put_pixel<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, at: IPoint, color: Color) {
        if clip.is_some_and(|c| !c.contains(at)) {
            return;
        }
        self.set_pen(s, color, 1, PenStyle::Solid);
        s.draw_point(at);
    }

    fn clipped_line<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        a: IPoint,
        b: IPoint,
        width: i32,
        color: Color,
        style: PenStyle,
    ) {
        self.last_point = b;
        let (a, b) = match clip {
            Some(c) => match clip_line(&c.inflate(width / 2), a, b) {
                Some(seg) => seg,
                None => return,
            },
            None => (a, b),
        };
        self.set_pen(s, color, width, style);
        s.draw_line(a, b);
    }

    pub fn line<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, a: IPoint, b: IPoint, width: i32, color: Color) {
        self.clipped_line(s, clip, a, b, width, color, PenStyle::Solid);
    }

    pub fn dashed_line<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, a: IPoint, b: IPoint, width: i32, color: Color) {
        self.clipped_line(s, clip, a, b, width, color, PenStyle::ShortDash);
    }

    /// Dash-dot line.
    pub fn mixed_line<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, a: IPoint, b: IPoint, width: i32, color: Color) {
        self.clipped_line(s, clip, a, b, width, color, PenStyle::DotDash);
    }

    pub fn move_to(&mut self, p: IPoint) {
        self.last_point = p;
    }

    pub fn line_to<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, p: IPoint, width: i32, color: Color) {
        let from = self.last_point;
        self.line(s, clip, from, p, width, color);
    }

    pub fn dashed_line_to<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, p: IPoint, width: i32, color: Color) {
        let from = self.last_point;
        self.dashed_line(s, clip, from, p, width, color);
    }

    /// Disconnected segments sharing one pen; `points` holds start/end pairs.
    pub fn line_array<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, points: &[IPoint], width: i32, color: Color) {
        self.set_pen(s, color, width, PenStyle::Solid);
        let clip = clip.map(|c| c.inflate(width / 2));
        for pair in points.chunks_exact(2) {
            self.last_point = pair[1];
            let seg = match &clip {
                Some(c) => clip_line(c, pair[0], pair[1]),
                None => Some((pair[0], pair[1])),
            };
            if let Some((a, b)) = seg {
                s.draw_line(a, b);
            }
        }
    }

    /// Outline of a segment with rounded ends. Widths up to 2 draw a plain
    /// line.
    pub fn thick_segment<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        a: IPoint,
        b: IPoint,
        width: i32,
        pen_width: i32,
        color: Color,
    ) {
        self.last_point = b;
        let (a, b) = match clip {
            Some(c) => match clip_line(&c.inflate(width / 2), a, b) {
                Some(seg) => seg,
                None => return,
            },
            None => (a, b),
        };

        if width <= 2 {
            self.set_pen(s, color, width, PenStyle::Solid);
            s.draw_line(a, b);
            return;
        }

        self.set_pen(s, color, pen_width, PenStyle::Solid);
        self.set_brush(s, color, false);

        let radius = f64::from(width.saturating_add(1) >> 1);
        let dx = f64::from(b.x) - f64::from(a.x);
        let dy = f64::from(b.y) - f64::from(a.y);
        let angle = dy.atan2(dx);
        let len = dx.hypot(dy).trunc();
        let origin = Point::from(a);
        let at = |x: f64, y: f64| (rotate_point(Point::new(x, y), angle) + origin).round();

        let (sx, sy) = s.axis_scale();
        let mirrored = (sx > 0.0 && sy < 0.0) || (sx < 0.0 && sy > 0.0);

        let start = at(0.0, radius);
        let end = at(len, radius);
        s.draw_line(start, end);

        let end = at(0.0, -radius);
        if mirrored {
            s.draw_arc(start, end, a);
        } else {
            s.draw_arc(end, start, a);
        }

        let start = at(len, -radius);
        s.draw_line(start, end);

        let end = at(len, radius);
        if mirrored {
            s.draw_arc(start, end, b);
        } else {
            s.draw_arc(end, start, b);
        }
    }

    /// Solid segment; the device pen draws the round ends.
    pub fn filled_segment<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, a: IPoint, b: IPoint, width: i32, color: Color) {
        self.line(s, clip, a, b, width, color);
    }

    fn rect_points(a: IPoint, b: IPoint) -> [IPoint; 5] {
        [
            a,
            IPoint::new(a.x, b.y),
            b,
            IPoint::new(b.x, a.y),
            a,
        ]
    }

    pub fn rect<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, a: IPoint, b: IPoint, width: i32, color: Color) {
        self.rect_styled(s, clip, a, b, width, color, PenStyle::Solid);
    }

    pub fn rect_styled<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        a: IPoint,
        b: IPoint,
        width: i32,
        color: Color,
        style: PenStyle,
    ) {
        let points = Self::rect_points(a, b);
        if !is_poly_drawable(clip, &points) {
            return;
        }
        self.set_pen(s, color, width, style);
        self.set_brush(s, color, false);
        Self::clipped_lines(s, clip, &points, width);
        self.last_point = a;
    }

    pub fn filled_rect<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        a: IPoint,
        b: IPoint,
        width: i32,
        background: Color,
    ) {
        let points = Self::rect_points(a, b);
        self.set_brush(s, background, true);
        self.set_pen(s, background, width, PenStyle::Solid);
        match clip {
            Some(c) if width > 0 => self.clip_and_fill(s, Some(&c.inflate(width)), &points),
            _ => self.clip_and_fill(s, clip, &points),
        }
    }

    fn clip_and_fill<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, points: &[IPoint]) {
        match clip {
            None => s.draw_polygon(points),
            Some(c) => {
                let clipped = clip_polygon(c, points);
                if !clipped.is_empty() {
                    s.draw_polygon(&clipped);
                }
            }
        }
    }

    /// Draw the open polyline `points` through `clip`, inflated by half the
    /// pen width. Each edge is clipped on its own; consecutive visible edges
    /// are sent as one run.
    fn clipped_lines<S: Surface + ?Sized>(s: &mut S, clip: Option<&ClipBox>, points: &[IPoint], width: i32) {
        let Some(c) = clip else {
            s.draw_lines(points);
            return;
        };
        let c = c.inflate(width / 2);
        let mut run: Vec<IPoint> = Vec::new();
        for edge in points.windows(2) {
            match clip_line(&c, edge[0], edge[1]) {
                Some((a, b)) => {
                    if run.last() != Some(&a) {
                        Self::flush_run(s, &mut run);
                        run.push(a);
                    }
                    run.push(b);
                }
                None => Self::flush_run(s, &mut run),
            }
        }
        Self::flush_run(s, &mut run);
    }

    fn flush_run<S: Surface + ?Sized>(s: &mut S, run: &mut Vec<IPoint>) {
        if run.len() > 1 {
            s.draw_lines(run);
        }
        run.clear();
    }

    pub fn circle<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, center: IPoint, radius: i32, width: i32, color: Color) {
        if clip.is_some_and(|c| c.rejects_circle(center, radius.saturating_add(width))) {
            return;
        }
        self.set_pen(s, color, width, PenStyle::Solid);
        self.set_brush(s, color, false);
        s.draw_circle(center, radius);
    }

    pub fn filled_circle<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        center: IPoint,
        radius: i32,
        width: i32,
        color: Color,
        background: Color,
    ) {
        if clip.is_some_and(|c| c.rejects_circle(center, radius)) {
            return;
        }
        self.set_pen(s, color, width, PenStyle::Solid);
        self.set_brush(s, background, true);
        s.draw_circle(center, radius);
    }

    /// Device point at `decideg` on a circle of `radius` around `center`.
    fn arc_point(center: IPoint, radius: i32, decideg: f64) -> IPoint {
        let v = rotate_point(Point::new(f64::from(radius), 0.0), -decideg_to_rad(decideg));
        IPoint::new(
            center.x.saturating_add(ki_round(v.x)),
            center.y.saturating_sub(ki_round(v.y)),
        )
    }

    /// Arc between two angles in tenths of a degree.
    pub fn arc<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        center: IPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        color: Color,
    ) {
        if clip.is_some_and(|c| c.rejects_circle(center, radius.saturating_add(width))) {
            return;
        }
        let from = Self::arc_point(center, radius, end_angle);
        let to = Self::arc_point(center, radius, start_angle);
        self.set_pen(s, color, width, PenStyle::Solid);
        self.set_brush(s, color, false);
        s.draw_arc(from, to, center);
    }

    /// Pie-filled arc between two angles in tenths of a degree.
    pub fn filled_arc<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        center: IPoint,
        start_angle: f64,
        end_angle: f64,
        radius: i32,
        width: i32,
        color: Color,
        background: Color,
    ) {
        if clip.is_some_and(|c| c.rejects_circle(center, radius.saturating_add(1))) {
            return;
        }
        let from = Self::arc_point(center, radius, end_angle);
        let to = Self::arc_point(center, radius, start_angle);
        self.set_brush(s, background, true);
        self.set_pen(s, color, width, PenStyle::Solid);
        s.draw_arc(from, to, center);
    }

    /// Arc given by its end points and centre.
    pub fn arc_3pt<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        start: IPoint,
        end: IPoint,
        center: IPoint,
        width: i32,
        color: Color,
    ) {
        let radius = ki_round(distance(start.into(), center.into()));
        if clip.is_some_and(|c| c.rejects_circle(center, radius)) {
            return;
        }
        self.set_pen(s, color, width, PenStyle::Solid);
        self.set_brush(s, color, false);
        s.draw_arc(start, end, center);
    }

    /// Open polyline, or a filled polygon when `fill` is set and there are
    /// at least three points.
    pub fn poly<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        points: &[IPoint],
        fill: bool,
        width: i32,
        color: Color,
        background: Color,
    ) {
        if !is_poly_drawable(clip, points) {
            return;
        }
        self.set_pen(s, color, width, PenStyle::Solid);
        if fill && points.len() > 2 {
            self.set_brush(s, background, true);
            self.clip_and_fill(s, clip, points);
            return;
        }
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return;
        };
        self.set_brush(s, color, false);
        Self::clipped_lines(s, clip, points, width);
        // the device leaves the final pixel of an open polyline unset
        if last != first && clip.map_or(true, |c| c.contains(last)) {
            s.draw_point(last);
        }
    }

    /// Closed polygon, outlined or filled.
    pub fn closed_poly<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        points: &[IPoint],
        fill: bool,
        width: i32,
        color: Color,
        background: Color,
    ) {
        if !is_poly_drawable(clip, points) {
            return;
        }
        self.set_pen(s, color, width, PenStyle::Solid);
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return;
        };
        if fill && points.len() > 2 {
            self.last_point = last;
            self.set_brush(s, background, true);
            self.clip_and_fill(s, clip, points);
            return;
        }
        self.set_brush(s, background, false);
        Self::clipped_lines(s, clip, points, width);
        if last != first {
            self.line(s, clip, first, last, width, color);
        }
    }

    pub fn bezier_quadratic<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        control: [IPoint; 3],
        width: i32,
        color: Color,
    ) {
        let points = flatten_quadratic(control[0], control[1], control[2]);
        self.poly(s, clip, &points, false, width, color, color);
    }

    pub fn bezier_cubic<S: Surface + ?Sized>(
        &mut self,
        s: &mut S,
        clip: Option<&ClipBox>,
        control: [IPoint; 4],
        width: i32,
        color: Color,
    ) {
        let points = flatten_cubic(control[0], control[1], control[2], control[3]);
        self.poly(s, clip, &points, false, width, color, color);
    }

    /// Cross marker of half-size `size` logical units.
    pub fn draw_anchor<S: Surface + ?Sized>(&mut self, s: &mut S, clip: Option<&ClipBox>, at: IPoint, size: i32, color: Color) {
        if size <= 0 {
            debug!("anchor with non-positive size {} skipped", size);
            return;
        }
        let (left, right) = (at.x.saturating_sub(size), at.x.saturating_add(size));
        let (top, bottom) = (at.y.saturating_sub(size), at.y.saturating_add(size));
        self.line(s, clip, IPoint::new(left, at.y), IPoint::new(right, at.y), 0, color);
        self.line(s, clip, IPoint::new(at.x, top), IPoint::new(at.x, bottom), 0, color);
    }
}
