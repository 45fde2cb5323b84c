//! The set of contour layers one export accumulates, and the mapping from
//! board coordinates into the scene.

use pcbgfx_core::board::BoardSettings;
use pcbgfx_core::geometry::{BBox, Point};
use pcbgfx_core::layer::BoardLayer;
use pcbgfx_core::units::{mm_to_iu, MM_PER_IU};
use pcbgfx_core::ContourLayer;

use crate::material::ColorIndex;
use crate::settings::ExportSettings;
use crate::zstack::LayerZ;

/// The mesh layers of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VrmlLayer {
    Holes,
    Board,
    TopCopper,
    BottomCopper,
    TopTin,
    BottomTin,
    TopSilk,
    BottomSilk,
}

impl VrmlLayer {
    /// Layers in the order they are written. Holes are never written.
    pub const WRITE_ORDER: [VrmlLayer; 7] = [
        VrmlLayer::Board,
        VrmlLayer::TopCopper,
        VrmlLayer::TopTin,
        VrmlLayer::BottomCopper,
        VrmlLayer::BottomTin,
        VrmlLayer::TopSilk,
        VrmlLayer::BottomSilk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VrmlLayer::Holes => "holes",
            VrmlLayer::Board => "board",
            VrmlLayer::TopCopper => "top_copper",
            VrmlLayer::BottomCopper => "bot_copper",
            VrmlLayer::TopTin => "top_tin",
            VrmlLayer::BottomTin => "bot_tin",
            VrmlLayer::TopSilk => "top_silk",
            VrmlLayer::BottomSilk => "bot_silk",
        }
    }

    pub fn material(self) -> ColorIndex {
        match self {
            VrmlLayer::Holes | VrmlLayer::Board => ColorIndex::Pcb,
            VrmlLayer::TopCopper | VrmlLayer::BottomCopper => ColorIndex::Track,
            VrmlLayer::TopTin | VrmlLayer::BottomTin => ColorIndex::Tin,
            VrmlLayer::TopSilk | VrmlLayer::BottomSilk => ColorIndex::Silk,
        }
    }

    /// Whether the planar mesh faces up.
    pub fn faces_up(self) -> bool {
        matches!(self, VrmlLayer::TopCopper | VrmlLayer::TopTin | VrmlLayer::TopSilk)
    }

    /// The board layer whose height a planar mesh is written at.
    pub fn board_layer(self) -> BoardLayer {
        match self {
            VrmlLayer::TopCopper | VrmlLayer::TopTin => BoardLayer::FRONT_COPPER,
            VrmlLayer::BottomCopper | VrmlLayer::BottomTin => BoardLayer::BACK_COPPER,
            VrmlLayer::TopSilk => BoardLayer::SilkFront,
            VrmlLayer::BottomSilk => BoardLayer::SilkBack,
            VrmlLayer::Holes | VrmlLayer::Board => BoardLayer::EdgeCuts,
        }
    }

    /// Mesh layer receiving geometry drawn on `layer`, if any.
    pub fn for_board_layer(layer: BoardLayer) -> Option<VrmlLayer> {
        match layer {
            BoardLayer::BACK_COPPER => Some(VrmlLayer::BottomCopper),
            BoardLayer::FRONT_COPPER => Some(VrmlLayer::TopCopper),
            BoardLayer::SilkBack => Some(VrmlLayer::BottomSilk),
            BoardLayer::SilkFront => Some(VrmlLayer::TopSilk),
            _ => None,
        }
    }
}

/// Board body faces sit this far inside the outer copper.
const BOARD_FACE_INSET_IU: f64 = 40_000.0;

pub struct VrmlModel {
    pub holes: ContourLayer,
    pub board: ContourLayer,
    pub top_copper: ContourLayer,
    pub bot_copper: ContourLayer,
    pub top_tin: ContourLayer,
    pub bot_tin: ContourLayer,
    pub top_silk: ContourLayer,
    pub bot_silk: ContourLayer,

    /// Output units per internal unit.
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
    /// Board thickness in internal units.
    pub thickness: f64,
    pub z: LayerZ,
}

impl VrmlModel {
    /// Set up the layers for a board. `bbox` is the board extent used for
    /// centring.
    pub fn new(settings: &ExportSettings, board: &BoardSettings, bbox: Option<BBox>) -> Self {
        let scale = settings.mm_to_output * MM_PER_IU;
        let (tx, ty) = match bbox {
            Some(b) if settings.center_board => {
                let c = b.center();
                (-scale * c.x, -scale * c.y)
            }
            _ => (0.0, 0.0),
        };
        let max_dev = mm_to_iu(settings.max_deviation_mm) as f64 * scale;
        let layer = || ContourLayer::with_max_deviation(max_dev);
        Self {
            holes: layer(),
            board: layer(),
            top_copper: layer(),
            bot_copper: layer(),
            top_tin: layer(),
            bot_tin: layer(),
            top_silk: layer(),
            bot_silk: layer(),
            scale,
            tx,
            ty,
            thickness: board.thickness as f64,
            z: LayerZ::compute(board, scale),
        }
    }

    /// Board coordinates (Y down) into scene coordinates (Y up).
    pub fn to_model(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.tx, -(p.y * self.scale + self.ty))
    }

    /// A board-space length in output units.
    pub fn scaled(&self, v: f64) -> f64 {
        v * self.scale
    }

    pub fn layer(&self, which: VrmlLayer) -> &ContourLayer {
        match which {
            VrmlLayer::Holes => &self.holes,
            VrmlLayer::Board => &self.board,
            VrmlLayer::TopCopper => &self.top_copper,
            VrmlLayer::BottomCopper => &self.bot_copper,
            VrmlLayer::TopTin => &self.top_tin,
            VrmlLayer::BottomTin => &self.bot_tin,
            VrmlLayer::TopSilk => &self.top_silk,
            VrmlLayer::BottomSilk => &self.bot_silk,
        }
    }

    pub fn layer_mut(&mut self, which: VrmlLayer) -> &mut ContourLayer {
        match which {
            VrmlLayer::Holes => &mut self.holes,
            VrmlLayer::Board => &mut self.board,
            VrmlLayer::TopCopper => &mut self.top_copper,
            VrmlLayer::BottomCopper => &mut self.bot_copper,
            VrmlLayer::TopTin => &mut self.top_tin,
            VrmlLayer::BottomTin => &mut self.bot_tin,
            VrmlLayer::TopSilk => &mut self.top_silk,
            VrmlLayer::BottomSilk => &mut self.bot_silk,
        }
    }

    /// A layer together with the shared holes layer. `None` for the holes
    /// layer itself.
    pub fn layer_with_holes(&mut self, which: VrmlLayer) -> Option<(&mut ContourLayer, &ContourLayer)> {
        let target = match which {
            VrmlLayer::Holes => return None,
            VrmlLayer::Board => &mut self.board,
            VrmlLayer::TopCopper => &mut self.top_copper,
            VrmlLayer::BottomCopper => &mut self.bot_copper,
            VrmlLayer::TopTin => &mut self.top_tin,
            VrmlLayer::BottomTin => &mut self.bot_tin,
            VrmlLayer::TopSilk => &mut self.top_silk,
            VrmlLayer::BottomSilk => &mut self.bot_silk,
        };
        Some((target, &self.holes))
    }

    /// Top and bottom face heights of the board body.
    pub fn board_faces(&self) -> (f64, f64) {
        let z = self.thickness * self.scale / 2.0 - BOARD_FACE_INSET_IU * self.scale;
        (z, -z)
    }

    pub fn layer_z(&self, layer: BoardLayer) -> f64 {
        self.z.get(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox {
        BBox::new(Point::new(0.0, 0.0), Point::new(10e6, 20e6))
    }

    #[test]
    fn test_centring_flips_y() {
        let m = VrmlModel::new(&ExportSettings::default(), &BoardSettings::default(), Some(bbox()));
        let c = m.to_model(Point::new(5e6, 10e6));
        assert!(c.x.abs() < 1e-9 && c.y.abs() < 1e-9);
        let p = m.to_model(Point::new(10e6, 0.0));
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!((p.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncentred() {
        let settings = ExportSettings {
            center_board: false,
            mm_to_output: 0.1,
            ..Default::default()
        };
        let m = VrmlModel::new(&settings, &BoardSettings::default(), Some(bbox()));
        let p = m.to_model(Point::new(10e6, 20e6));
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y + 2.0).abs() < 1e-9);
        assert!((m.layer(VrmlLayer::Board).max_deviation() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_board_faces() {
        let m = VrmlModel::new(&ExportSettings::default(), &BoardSettings::default(), None);
        let (top, bottom) = m.board_faces();
        assert!((top - 0.76).abs() < 1e-9);
        assert!((bottom + 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_layer_routing() {
        assert_eq!(VrmlLayer::for_board_layer(BoardLayer::FRONT_COPPER), Some(VrmlLayer::TopCopper));
        assert_eq!(VrmlLayer::for_board_layer(BoardLayer::SilkBack), Some(VrmlLayer::BottomSilk));
        assert_eq!(VrmlLayer::for_board_layer(BoardLayer::Copper(3)), None);
        assert_eq!(VrmlLayer::for_board_layer(BoardLayer::MaskFront), None);
    }
}
