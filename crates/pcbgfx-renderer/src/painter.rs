use log::debug;
use pcbgfx_core::board::{rotate_decideg, Board, DrawShape, Drawing, DrillShape, Footprint, Pad, PadShape, Text, Via};
use pcbgfx_core::clip::ClipBox;
use pcbgfx_core::geometry::{distance, ki_round, IPoint, Point};
use pcbgfx_core::layer::{BoardLayer, FillPattern, LayerStack};
use pcbgfx_core::BoardEntity;

use crate::context::RenderContext;
use crate::surface::{Color, Surface};
use crate::viewport::Viewport;

/// Counters for one paint pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub drawn: usize,
    pub hidden: usize,
}

/// Draws a [`Board`] through a [`RenderContext`] using per-layer colors.
pub struct BoardPainter {
    pub layers: LayerStack,
    /// Draw outlines instead of filled shapes.
    pub sketch: bool,
    /// Used for drill holes.
    pub background: Color,
}

struct Style {
    color: Color,
    sketch: bool,
}

impl BoardPainter {
    pub fn new(layers: LayerStack) -> Self {
        Self {
            layers,
            sketch: false,
            background: Color::BLACK,
        }
    }

    pub fn with_sketch(mut self, sketch: bool) -> Self {
        self.sketch = sketch;
        self
    }

    fn style(&self, layer: BoardLayer) -> Option<Style> {
        let appearance = self.layers.get_layer(layer).filter(|a| a.visible)?;
        Some(Style {
            color: appearance.color.into(),
            sketch: self.sketch || appearance.fill_pattern == FillPattern::Outline,
        })
    }

    /// Style of the first visible outer copper side in `sides`.
    fn copper_style(&self, front: bool, back: bool) -> Option<Style> {
        let front = front.then(|| self.style(BoardLayer::FRONT_COPPER)).flatten();
        front.or_else(|| back.then(|| self.style(BoardLayer::BACK_COPPER)).flatten())
    }

    pub fn paint<S: Surface + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        s: &mut S,
        clip: Option<&ClipBox>,
        board: &Board,
    ) -> PaintStats {
        let mut stats = PaintStats::default();
        for entity in board.entities() {
            let drawn = match entity {
                BoardEntity::Drawing(d) => self.paint_drawing(ctx, s, clip, d, |p| p.into()),
                BoardEntity::Text(t) => self.paint_text(ctx, s, clip, t),
                BoardEntity::Track(t) => match self.style(t.layer) {
                    Some(st) => {
                        self.segment(ctx, s, clip, t.start, t.end, t.width, &st);
                        true
                    }
                    None => false,
                },
                BoardEntity::Via(v) => self.paint_via(ctx, s, clip, v),
                BoardEntity::Zone(z) => match self.style(z.layer) {
                    Some(st) => {
                        for ring in &z.filled_polygons {
                            ctx.closed_poly(s, clip, ring, !st.sketch, 0, st.color, st.color);
                        }
                        true
                    }
                    None => false,
                },
                BoardEntity::Footprint(fp) => self.paint_footprint(ctx, s, clip, fp),
            };
            if drawn {
                stats.drawn += 1;
            } else {
                stats.hidden += 1;
            }
        }
        debug!("painted {} items, {} hidden", stats.drawn, stats.hidden);
        stats
    }

    /// Paint the part of `board` visible in `viewport`. The surface should
    /// use the viewport's axis scale so mirrored views draw correctly.
    pub fn paint_view<S: Surface + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        s: &mut S,
        viewport: &Viewport,
        board: &Board,
    ) -> PaintStats {
        let clip = viewport.clip_box();
        self.paint(ctx, s, Some(&clip), board)
    }

    fn segment<S: Surface + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        s: &mut S,
        clip: Option<&ClipBox>,
        a: IPoint,
        b: IPoint,
        width: i32,
        st: &Style,
    ) {
        if st.sketch {
            ctx.thick_segment(s, clip, a, b, width, 0, st.color);
        } else {
            ctx.filled_segment(s, clip, a, b, width, st.color);
        }
    }

    fn paint_text<S: Surface + ?Sized>(&self, ctx: &mut RenderContext, s: &mut S, clip: Option<&ClipBox>, text: &Text) -> bool {
        if !text.visible {
            return false;
        }
        let Some(st) = self.style(text.layer) else {
            return false;
        };
        for [a, b] in &text.strokes {
            self.segment(ctx, s, clip, *a, *b, text.thickness, &st);
        }
        true
    }

    fn paint_drawing<S: Surface + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        s: &mut S,
        clip: Option<&ClipBox>,
        d: &Drawing,
        polygon_map: impl Fn(IPoint) -> Point,
    ) -> bool {
        let Some(st) = self.style(d.layer) else {
            return false;
        };
        match &d.shape {
            DrawShape::Segment { start, end } => self.segment(ctx, s, clip, *start, *end, d.width, &st),
            DrawShape::Circle { center, edge } => {
                let radius = ki_round(distance((*center).into(), (*edge).into()));
                if st.sketch {
                    let half = d.width / 2;
                    ctx.circle(s, clip, *center, radius.saturating_add(half), 0, st.color);
                    if radius > half {
                        ctx.circle(s, clip, *center, radius - half, 0, st.color);
                    }
                } else {
                    ctx.circle(s, clip, *center, radius, d.width, st.color);
                }
            }
            DrawShape::Arc { center, start, angle } => {
                let c = Point::from(*center);
                let end = (rotate_decideg(Point::from(*start) - c, -angle) + c).round();
                // positive angles sweep clockwise on screen
                let (from, to) = if *angle >= 0.0 { (end, *start) } else { (*start, end) };
                ctx.arc_3pt(s, clip, from, to, *center, d.width, st.color);
            }
            DrawShape::Polygon { points } => {
                let pts: Vec<IPoint> = points.iter().map(|p| polygon_map(*p).round()).collect();
                ctx.closed_poly(s, clip, &pts, !st.sketch, d.width, st.color, st.color);
            }
        }
        true
    }

    fn paint_via<S: Surface + ?Sized>(&self, ctx: &mut RenderContext, s: &mut S, clip: Option<&ClipBox>, via: &Via) -> bool {
        let top = via.top_layer == BoardLayer::FRONT_COPPER;
        let bottom = via.bottom_layer == BoardLayer::BACK_COPPER;
        let st = self
            .copper_style(top, bottom)
            .or_else(|| self.style(via.top_layer));
        let Some(st) = st else {
            return false;
        };
        let radius = via.diameter / 2;
        if st.sketch {
            ctx.circle(s, clip, via.position, radius, 0, st.color);
            ctx.circle(s, clip, via.position, via.drill / 2, 0, st.color);
        } else {
            ctx.filled_circle(s, clip, via.position, radius, 0, st.color, st.color);
            ctx.filled_circle(s, clip, via.position, via.drill / 2, 0, self.background, self.background);
        }
        true
    }

    fn paint_footprint<S: Surface + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        s: &mut S,
        clip: Option<&ClipBox>,
        fp: &Footprint,
    ) -> bool {
        let mut any = false;
        for t in &fp.texts {
            any |= self.paint_text(ctx, s, clip, t);
        }
        for g in &fp.graphics {
            any |= self.paint_drawing(ctx, s, clip, g, |p| fp.to_board(p));
        }
        for pad in &fp.pads {
            any |= self.paint_pad(ctx, s, clip, pad);
        }
        any
    }

    fn paint_pad<S: Surface + ?Sized>(&self, ctx: &mut RenderContext, s: &mut S, clip: Option<&ClipBox>, pad: &Pad) -> bool {
        let Some(st) = self.copper_style(pad.layers.front, pad.layers.back) else {
            return false;
        };
        let center = pad.shape_pos();
        match pad.shape {
            PadShape::Circle => {
                let radius = pad.size.x / 2;
                if st.sketch {
                    ctx.circle(s, clip, center.round(), radius, 0, st.color);
                } else {
                    ctx.filled_circle(s, clip, center.round(), radius, 0, st.color, st.color);
                }
            }
            PadShape::Oval => {
                let (a, b, width) = oval_axis(center, pad.size, pad.orientation);
                self.segment(ctx, s, clip, a, b, width, &st);
            }
            PadShape::Rect | PadShape::Trapezoid => {
                let c = pad.corners();
                let ring = [c[0], c[1], c[3], c[2]].map(|p| p.round());
                ctx.closed_poly(s, clip, &ring, !st.sketch, 0, st.color, st.color);
            }
        }

        if pad.has_drill() && !st.sketch {
            let position = Point::from(pad.position);
            match pad.drill_shape {
                DrillShape::Circle => {
                    let r = pad.drill.x.min(pad.drill.y) / 2;
                    ctx.filled_circle(s, clip, pad.position, r, 0, self.background, self.background);
                }
                DrillShape::Oblong => {
                    let (a, b, width) = oval_axis(position, pad.drill, pad.orientation);
                    ctx.filled_segment(s, clip, a, b, width, self.background);
                }
            }
        }
        true
    }
}

/// End points and width of the straight spine of an oval of `size`.
fn oval_axis(center: Point, size: IPoint, orientation: f64) -> (IPoint, IPoint, i32) {
    let (half, width, along_x) = if size.x >= size.y {
        ((size.x - size.y) as f64 / 2.0, size.y, true)
    } else {
        ((size.y - size.x) as f64 / 2.0, size.x, false)
    };
    let offset = if along_x {
        Point::new(half, 0.0)
    } else {
        Point::new(0.0, half)
    };
    let offset = rotate_decideg(offset, orientation);
    ((center - offset).round(), (center + offset).round(), width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_data::{DrawCommand, RecordingSurface};
    use pcbgfx_core::board::Track;
    use pcbgfx_core::geometry::BBox;
    use pcbgfx_core::layer::LayerSet;

    fn board_with_track() -> Board {
        let mut board = Board::new("painter");
        board.tracks.push(Track {
            start: IPoint::new(0, 0),
            end: IPoint::new(1000, 0),
            width: 200,
            layer: BoardLayer::FRONT_COPPER,
        });
        board
    }

    #[test]
    fn test_track_drawn_on_visible_layer() {
        let painter = BoardPainter::new(LayerStack::standard());
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::new(1);
        let stats = painter.paint(&mut ctx, &mut s, None, &board_with_track());
        assert_eq!(stats, PaintStats { drawn: 1, hidden: 0 });
        assert!(matches!(s.drawing_commands().next(), Some(DrawCommand::Line { .. })));
    }

    #[test]
    fn test_hidden_layer_skipped() {
        let mut layers = LayerStack::standard();
        layers.toggle_visibility(BoardLayer::FRONT_COPPER);
        let painter = BoardPainter::new(layers);
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::new(1);
        let stats = painter.paint(&mut ctx, &mut s, None, &board_with_track());
        assert_eq!(stats.hidden, 1);
        assert!(s.commands().is_empty());
    }

    #[test]
    fn test_sketch_track_is_outline() {
        let painter = BoardPainter::new(LayerStack::standard()).with_sketch(true);
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::new(1);
        painter.paint(&mut ctx, &mut s, None, &board_with_track());
        let arcs = s
            .drawing_commands()
            .filter(|c| matches!(c, DrawCommand::Arc { .. }))
            .count();
        assert_eq!(arcs, 2);
    }

    #[test]
    fn test_outline_pattern_draws_sketch() {
        let mut layers = LayerStack::standard();
        if let Some(a) = layers.get_layer_mut(BoardLayer::FRONT_COPPER) {
            a.fill_pattern = FillPattern::Outline;
        }
        let painter = BoardPainter::new(layers);
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::new(1);
        painter.paint(&mut ctx, &mut s, None, &board_with_track());
        assert!(s.drawing_commands().any(|c| matches!(c, DrawCommand::Arc { .. })));
    }

    #[test]
    fn test_view_clips_to_visible_area() {
        let mut board = board_with_track();
        board.tracks.push(Track {
            start: IPoint::new(50_000_000, 50_000_000),
            end: IPoint::new(60_000_000, 50_000_000),
            width: 200,
            layer: BoardLayer::FRONT_COPPER,
        });
        let mut vp = Viewport::new(100.0, 100.0);
        vp.fit(&BBox::new(Point::new(-100.0, -100.0), Point::new(1100.0, 100.0)));
        let clip = vp.clip_box();

        let painter = BoardPainter::new(LayerStack::standard());
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::for_viewport(1, &vp);
        painter.paint_view(&mut ctx, &mut s, &vp, &board);
        let lines: Vec<_> = s.drawing_commands().cloned().collect();
        assert_eq!(lines.len(), 1);
        match &lines[0] {
            DrawCommand::Line { from, to } => assert!(clip.contains(*from) && clip.contains(*to)),
            other => panic!("expected a line, got {:?}", other),
        }
    }

    #[test]
    fn test_mirrored_view_swaps_caps() {
        let mut vp = Viewport::new(100.0, 100.0);
        vp.fit(&BBox::new(Point::new(-100.0, -100.0), Point::new(1100.0, 100.0)));
        vp.set_mirrored(true);

        let painter = BoardPainter::new(LayerStack::standard()).with_sketch(true);
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::for_viewport(1, &vp);
        painter.paint_view(&mut ctx, &mut s, &vp, &board_with_track());
        let first_arc = s
            .drawing_commands()
            .find(|c| matches!(c, DrawCommand::Arc { .. }))
            .cloned();
        assert_eq!(
            first_arc,
            Some(DrawCommand::Arc {
                start: IPoint::new(0, 100),
                end: IPoint::new(0, -100),
                center: IPoint::new(0, 0)
            })
        );
    }

    #[test]
    fn test_pad_with_drill() {
        let mut board = Board::new("pads");
        let mut fp = Footprint::new("J1", IPoint::new(0, 0), BoardLayer::FRONT_COPPER);
        fp.pads.push(Pad {
            position: IPoint::new(0, 0),
            offset: IPoint::default(),
            size: IPoint::new(1000, 1000),
            delta: IPoint::default(),
            orientation: 0.0,
            shape: PadShape::Rect,
            drill: IPoint::new(400, 400),
            drill_shape: DrillShape::Circle,
            layers: LayerSet::BOTH,
        });
        board.footprints.push(fp);

        let painter = BoardPainter::new(LayerStack::standard());
        let mut ctx = RenderContext::new();
        let mut s = RecordingSurface::new(1);
        painter.paint(&mut ctx, &mut s, None, &board);
        let cmds: Vec<_> = s.drawing_commands().cloned().collect();
        assert!(matches!(cmds[0], DrawCommand::Polygon { .. }));
        assert_eq!(
            cmds[1],
            DrawCommand::Circle {
                center: IPoint::new(0, 0),
                radius: 200
            }
        );
    }

    #[test]
    fn test_oval_axis() {
        let (a, b, w) = oval_axis(Point::new(0.0, 0.0), IPoint::new(300, 100), 900.0);
        assert_eq!(w, 100);
        // rotated a quarter turn, the spine runs vertically
        assert_eq!(a.x, 0);
        assert_eq!(b.x, 0);
        assert_eq!((a.y - b.y).abs(), 200);
    }
}
