//! # pcbgfx renderer
//!
//! Clipped 2D drawing for board views. Primitives go through a
//! [`RenderContext`] that caches device state, onto any [`Surface`]
//! implementation. [`RecordingSurface`] captures the device calls as a
//! serializable command stream.

pub mod bezier;
pub mod context;
pub mod painter;
pub mod render_data;
pub mod surface;
pub mod viewport;

pub use context::RenderContext;
pub use painter::{BoardPainter, PaintStats};
pub use render_data::{DrawCommand, RecordingSurface};
pub use surface::{Brush, Color, DrawMode, Pen, PenStyle, Surface};
pub use viewport::Viewport;
