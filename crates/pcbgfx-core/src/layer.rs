use serde::{Deserialize, Serialize};

/// Highest copper index; the front copper layer always uses this slot.
pub const MAX_COPPER_INDEX: u8 = 15;

/// A board layer. Copper indices run from 0 (back) to
/// [`MAX_COPPER_INDEX`] (front); inner layers sit in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardLayer {
    Copper(u8),
    AdhesiveBack,
    AdhesiveFront,
    PasteBack,
    PasteFront,
    SilkBack,
    SilkFront,
    MaskBack,
    MaskFront,
    Drawings,
    Comments,
    Eco1,
    Eco2,
    EdgeCuts,
}

impl BoardLayer {
    pub const BACK_COPPER: BoardLayer = BoardLayer::Copper(0);
    pub const FRONT_COPPER: BoardLayer = BoardLayer::Copper(MAX_COPPER_INDEX);

    pub fn is_outer_copper(&self) -> bool {
        *self == Self::BACK_COPPER || *self == Self::FRONT_COPPER
    }

    pub fn name(&self) -> String {
        match self {
            BoardLayer::Copper(0) => "B.Cu".to_string(),
            BoardLayer::Copper(MAX_COPPER_INDEX) => "F.Cu".to_string(),
            BoardLayer::Copper(n) => format!("In{}.Cu", n),
            BoardLayer::AdhesiveBack => "B.Adhes".to_string(),
            BoardLayer::AdhesiveFront => "F.Adhes".to_string(),
            BoardLayer::PasteBack => "B.Paste".to_string(),
            BoardLayer::PasteFront => "F.Paste".to_string(),
            BoardLayer::SilkBack => "B.SilkS".to_string(),
            BoardLayer::SilkFront => "F.SilkS".to_string(),
            BoardLayer::MaskBack => "B.Mask".to_string(),
            BoardLayer::MaskFront => "F.Mask".to_string(),
            BoardLayer::Drawings => "Dwgs.User".to_string(),
            BoardLayer::Comments => "Cmts.User".to_string(),
            BoardLayer::Eco1 => "Eco1.User".to_string(),
            BoardLayer::Eco2 => "Eco2.User".to_string(),
            BoardLayer::EdgeCuts => "Edge.Cuts".to_string(),
        }
    }
}

/// Which outer sides a pad is present on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerSet {
    pub front: bool,
    pub back: bool,
}

impl LayerSet {
    pub const BOTH: LayerSet = LayerSet {
        front: true,
        back: true,
    };
    pub const FRONT: LayerSet = LayerSet {
        front: true,
        back: false,
    };
    pub const BACK: LayerSet = LayerSet {
        front: false,
        back: true,
    };

    pub fn contains(&self, layer: BoardLayer) -> bool {
        match layer {
            l if l == BoardLayer::FRONT_COPPER => self.front,
            l if l == BoardLayer::BACK_COPPER => self.back,
            _ => false,
        }
    }
}

/// Display settings for one board layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerAppearance {
    pub layer: BoardLayer,
    pub color: LayerColor,
    pub fill_pattern: FillPattern,
    pub visible: bool,
}

impl LayerAppearance {
    pub fn new(layer: BoardLayer) -> Self {
        Self {
            layer,
            color: LayerColor::default(),
            fill_pattern: FillPattern::Solid,
            visible: true,
        }
    }

    pub fn with_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.color = LayerColor { r, g, b };
        self
    }
}

/// RGB color for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for LayerColor {
    fn default() -> Self {
        Self {
            r: 128,
            g: 128,
            b: 128,
        }
    }
}

/// How filled shapes are drawn: solid, or as outlines only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPattern {
    Solid,
    Outline,
}

/// The appearance table for every layer of a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<LayerAppearance>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Conventional colors for a board with outer copper, silkscreen and
    /// edge cuts.
    pub fn standard() -> Self {
        let mut stack = Self::new();
        stack.add_layer(LayerAppearance::new(BoardLayer::FRONT_COPPER).with_color(200, 52, 52));
        stack.add_layer(LayerAppearance::new(BoardLayer::BACK_COPPER).with_color(77, 127, 196));
        stack.add_layer(LayerAppearance::new(BoardLayer::SilkFront).with_color(242, 237, 161));
        stack.add_layer(LayerAppearance::new(BoardLayer::SilkBack).with_color(232, 178, 167));
        stack.add_layer(LayerAppearance::new(BoardLayer::EdgeCuts).with_color(208, 210, 205));
        stack
    }

    pub fn add_layer(&mut self, appearance: LayerAppearance) {
        match self.get_layer_mut(appearance.layer) {
            Some(existing) => *existing = appearance,
            None => self.layers.push(appearance),
        }
    }

    pub fn get_layer(&self, layer: BoardLayer) -> Option<&LayerAppearance> {
        self.layers.iter().find(|l| l.layer == layer)
    }

    pub fn get_layer_mut(&mut self, layer: BoardLayer) -> Option<&mut LayerAppearance> {
        self.layers.iter_mut().find(|l| l.layer == layer)
    }

    pub fn is_visible(&self, layer: BoardLayer) -> bool {
        self.get_layer(layer).is_some_and(|l| l.visible)
    }

    pub fn toggle_visibility(&mut self, layer: BoardLayer) {
        if let Some(l) = self.get_layer_mut(layer) {
            l.visible = !l.visible;
        }
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}
