use pcbgfx_core::geometry::IPoint;
use serde::{Deserialize, Serialize};

use crate::surface::{Brush, DrawMode, Pen, Surface};
use crate::viewport::Viewport;

/// One device call, as seen by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    SetPen(Pen),
    SetBrush(Brush),
    SetDrawMode { mode: DrawMode },
    Point { at: IPoint },
    Line { from: IPoint, to: IPoint },
    Lines { points: Vec<IPoint> },
    Polygon { points: Vec<IPoint> },
    Arc { start: IPoint, end: IPoint, center: IPoint },
    Circle { center: IPoint, radius: i32 },
}

impl DrawCommand {
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            DrawCommand::SetPen(_) | DrawCommand::SetBrush(_) | DrawCommand::SetDrawMode { .. }
        )
    }
}

/// A surface that keeps every call it receives. Used for tests and for
/// shipping a render pass to another process as JSON.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    id: u64,
    axis_scale: (f64, f64),
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            axis_scale: (1.0, 1.0),
            commands: Vec::new(),
        }
    }

    pub fn with_axis_scale(mut self, sx: f64, sy: f64) -> Self {
        self.axis_scale = (sx, sy);
        self
    }

    /// A surface drawing through `viewport`, mirrored along with it.
    pub fn for_viewport(id: u64, viewport: &Viewport) -> Self {
        let (sx, sy) = viewport.axis_scale();
        Self::new(id).with_axis_scale(sx, sy)
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands that produce pixels.
    pub fn drawing_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| !c.is_state_change())
    }

    pub fn state_changes(&self) -> usize {
        self.commands.iter().filter(|c| c.is_state_change()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.commands)
    }
}

impl Surface for RecordingSurface {
    fn surface_id(&self) -> u64 {
        self.id
    }

    fn axis_scale(&self) -> (f64, f64) {
        self.axis_scale
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.commands.push(DrawCommand::SetPen(*pen));
    }

    fn set_brush(&mut self, brush: &Brush) {
        self.commands.push(DrawCommand::SetBrush(*brush));
    }

    fn set_draw_mode(&mut self, mode: DrawMode) {
        self.commands.push(DrawCommand::SetDrawMode { mode });
    }

    fn draw_point(&mut self, at: IPoint) {
        self.commands.push(DrawCommand::Point { at });
    }

    fn draw_line(&mut self, from: IPoint, to: IPoint) {
        self.commands.push(DrawCommand::Line { from, to });
    }

    fn draw_lines(&mut self, points: &[IPoint]) {
        self.commands.push(DrawCommand::Lines {
            points: points.to_vec(),
        });
    }

    fn draw_polygon(&mut self, points: &[IPoint]) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
        });
    }

    fn draw_arc(&mut self, start: IPoint, end: IPoint, center: IPoint) {
        self.commands.push(DrawCommand::Arc { start, end, center });
    }

    fn draw_circle(&mut self, center: IPoint, radius: i32) {
        self.commands.push(DrawCommand::Circle { center, radius });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Color, PenStyle};

    #[test]
    fn test_records_in_order() {
        let mut s = RecordingSurface::new(1);
        s.set_pen(&Pen {
            color: Color::WHITE,
            width: 0,
            style: PenStyle::Solid,
        });
        s.draw_line(IPoint::new(0, 0), IPoint::new(1, 1));
        assert_eq!(s.state_changes(), 1);
        assert_eq!(s.drawing_commands().count(), 1);
        assert!(matches!(s.commands()[1], DrawCommand::Line { .. }));
    }

    #[test]
    fn test_json_tagging() {
        let mut s = RecordingSurface::new(1);
        s.draw_circle(IPoint::new(5, 5), 3);
        let json = s.to_json().unwrap();
        assert!(json.contains("\"op\":\"circle\""));
        let back: Vec<DrawCommand> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s.commands());
    }
}
