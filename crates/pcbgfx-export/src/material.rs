use std::io::{self, Write};

use pcbgfx_core::format_real;

/// Surface appearance of one material in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VrmlColor {
    pub diffuse: [f64; 3],
    pub specular: [f64; 3],
    pub emissive: [f64; 3],
    pub ambient: f64,
    pub transparency: f64,
    pub shininess: f64,
}

impl VrmlColor {
    pub const fn new(diffuse: [f64; 3], ambient: f64, shininess: f64) -> Self {
        Self {
            diffuse,
            specular: diffuse,
            emissive: [0.0; 3],
            ambient,
            transparency: 0.0,
            shininess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorIndex {
    Pcb,
    Track,
    Silk,
    Tin,
}

impl ColorIndex {
    pub fn color(self) -> VrmlColor {
        match self {
            ColorIndex::Pcb => VrmlColor::new([0.07, 0.3, 0.12], 1.0, 0.2),
            ColorIndex::Track => VrmlColor::new([0.08, 0.5, 0.1], 1.0, 0.2),
            ColorIndex::Silk => VrmlColor::new([0.9, 0.9, 0.9], 1.0, 0.2),
            ColorIndex::Tin => VrmlColor::new([0.749, 0.756, 0.761], 0.8, 0.8),
        }
    }
}

fn triple(v: [f64; 3]) -> String {
    format!("{} {} {}", format_real(v[0]), format_real(v[1]), format_real(v[2]))
}

/// Write an `Appearance` node for `index`, indented for a triangle bag.
pub fn write_material<W: Write>(index: ColorIndex, out: &mut W) -> io::Result<()> {
    let c = index.color();
    writeln!(out, "          appearance Appearance {{")?;
    writeln!(out, "            material Material {{")?;
    writeln!(out, "              diffuseColor {}", triple(c.diffuse))?;
    writeln!(out, "              specularColor {}", triple(c.specular))?;
    writeln!(out, "              emissiveColor {}", triple(c.emissive))?;
    writeln!(out, "              ambientIntensity {}", format_real(c.ambient))?;
    writeln!(out, "              transparency {}", format_real(c.transparency))?;
    writeln!(out, "              shininess {}", format_real(c.shininess))?;
    writeln!(out, "            }}")?;
    writeln!(out, "          }}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tin_material() {
        let mut out = Vec::new();
        write_material(ColorIndex::Tin, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("diffuseColor 0.749 0.756 0.761"));
        assert!(text.contains("specularColor 0.749 0.756 0.761"));
        assert!(text.contains("emissiveColor 0 0 0"));
        assert!(text.contains("ambientIntensity 0.8"));
        assert!(text.contains("shininess 0.8"));
    }

    #[test]
    fn test_board_color() {
        let c = ColorIndex::Pcb.color();
        assert_eq!(c.diffuse, [0.07, 0.3, 0.12]);
        assert_eq!(c.transparency, 0.0);
    }
}
