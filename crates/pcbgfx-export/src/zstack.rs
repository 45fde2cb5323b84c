//! Height of every board layer in the exported scene.

use std::collections::HashMap;

use pcbgfx_core::board::BoardSettings;
use pcbgfx_core::layer::{BoardLayer, MAX_COPPER_INDEX};
use pcbgfx_core::units::mm_to_iu;

/// Layer heights in output units, centred on the board mid-plane.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerZ {
    z: HashMap<BoardLayer, f64>,
}

impl LayerZ {
    /// Copper layers are spread evenly through the board thickness, back at
    /// the bottom face and front at the top. Technical layers sit a small
    /// step outside the copper on their side.
    pub fn compute(settings: &BoardSettings, scale: f64) -> Self {
        let thickness = settings.thickness as f64 * scale;
        let half = thickness / 2.0;
        let n = settings.copper_layer_count.clamp(1, MAX_COPPER_INDEX + 1);
        let mut z = HashMap::new();

        for i in 0..=MAX_COPPER_INDEX {
            let h = if i < n {
                if n < 2 {
                    -half
                } else {
                    thickness * i as f64 / (n - 1) as f64 - half
                }
            } else {
                half
            };
            z.insert(BoardLayer::Copper(i), h);
        }

        let eps = mm_to_iu(0.02) as f64 * scale;
        let back = [
            (BoardLayer::PasteBack, 4.0),
            (BoardLayer::AdhesiveBack, 3.0),
            (BoardLayer::SilkBack, 2.0),
            (BoardLayer::MaskBack, 1.0),
        ];
        for (layer, k) in back {
            z.insert(layer, -half - k * eps);
        }
        let front = [
            (BoardLayer::MaskFront, 1.0),
            (BoardLayer::SilkFront, 2.0),
            (BoardLayer::AdhesiveFront, 3.0),
            (BoardLayer::PasteFront, 4.0),
            (BoardLayer::Drawings, 5.0),
            (BoardLayer::Comments, 6.0),
            (BoardLayer::Eco1, 7.0),
            (BoardLayer::Eco2, 8.0),
        ];
        for (layer, k) in front {
            z.insert(layer, half + k * eps);
        }
        z.insert(BoardLayer::EdgeCuts, 0.0);

        Self { z }
    }

    pub fn get(&self, layer: BoardLayer) -> f64 {
        self.z.get(&layer).copied().unwrap_or(0.0)
    }
}
