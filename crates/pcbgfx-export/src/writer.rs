use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use pcbgfx_core::{Board, ContourLayer};
use tempfile::NamedTempFile;

use crate::entities::{export_entity, export_outline};
use crate::error::{ExportError, ExportReport};
use crate::material::{write_material, ColorIndex};
use crate::model::{VrmlLayer, VrmlModel};
use crate::scene::{model_node, ModelPaths, SceneNode};
use crate::settings::ExportSettings;

/// Scene title from the output file name.
pub fn scene_title(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| match c {
            '\\' => '/',
            ' ' | ':' => '_',
            c => c,
        })
        .collect()
}

/// A board ready to be written: tessellated layers plus model nodes.
pub struct VrmlScene {
    pub title: String,
    pub model: VrmlModel,
    pub nodes: Vec<SceneNode>,
    pub report: ExportReport,
}

impl VrmlScene {
    pub fn build(board: &Board, settings: &ExportSettings, paths: &ModelPaths, title: &str) -> Result<Self, ExportError> {
        settings.validate()?;
        let mut report = ExportReport::default();
        let mut model = VrmlModel::new(settings, &board.settings, board.bounding_box());

        export_outline(&mut model, board, &mut report);
        for entity in board.entities() {
            export_entity(&mut model, entity, &mut report);
        }

        let mut nodes = Vec::new();
        for fp in &board.footprints {
            for m3d in &fp.models {
                if let Some(node) = model_node(&model, fp, m3d, settings, paths, &mut report) {
                    nodes.push(node);
                }
            }
        }

        for which in VrmlLayer::WRITE_ORDER {
            let Some((layer, holes)) = model.layer_with_holes(which) else {
                continue;
            };
            if layer.is_empty() {
                continue;
            }
            let mesh = layer
                .tessellate(Some(holes))
                .map_err(|source| ExportError::Tessellation {
                    layer: which.name(),
                    source,
                })?;
            if !mesh.is_empty() {
                report.layer_nodes += 1;
                report.triangles += mesh.triangle_count();
            }
        }
        report.model_nodes = nodes.len();

        Ok(Self {
            title: title.to_string(),
            model,
            nodes,
            report,
        })
    }

    /// Write the whole scene: header, model nodes, then the layer meshes.
    pub fn emit<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "#VRML V2.0 utf8")?;
        writeln!(out, "WorldInfo {{")?;
        writeln!(out, "  title \"{} - Generated by pcbgfx\"", self.title)?;
        writeln!(out, "}}")?;
        writeln!(out, "Transform {{")?;
        writeln!(out, "  children [")?;

        for node in &self.nodes {
            node.write(out)?;
        }

        for which in VrmlLayer::WRITE_ORDER {
            let layer = self.model.layer(which);
            if !layer.mesh().map(|m| !m.is_empty()).unwrap_or(false) {
                continue;
            }
            if which == VrmlLayer::Board {
                let (top, bottom) = self.model.board_faces();
                write_triangle_bag(out, which.material(), layer, Geometry::Solid { top, bottom })?;
            } else {
                let z = self.model.layer_z(which.board_layer());
                let up = which.faces_up();
                write_triangle_bag(out, which.material(), layer, Geometry::Planar { z, up })?;
            }
        }

        writeln!(out, "  ]")?;
        writeln!(out, "}}")
    }
}

#[derive(Clone, Copy)]
enum Geometry {
    Planar { z: f64, up: bool },
    Solid { top: f64, bottom: f64 },
}

fn write_triangle_bag<W: Write>(out: &mut W, color: ColorIndex, layer: &ContourLayer, geometry: Geometry) -> io::Result<()> {
    writeln!(out, "  Transform {{")?;
    writeln!(out, "    children [")?;
    writeln!(out, "      Group {{")?;
    writeln!(out, "        children [")?;
    writeln!(out, "        Shape {{")?;
    write_material(color, out)?;
    writeln!(out, "          geometry IndexedFaceSet {{")?;
    writeln!(out, "            solid TRUE")?;
    writeln!(out, "            coord Coordinate {{")?;
    writeln!(out, "              point [")?;
    match geometry {
        Geometry::Planar { z, .. } => layer.write_vertices(z, out)?,
        Geometry::Solid { top, bottom } => layer.write_3d_vertices(top, bottom, out)?,
    }
    writeln!(out, "              ]")?;
    writeln!(out, "            }}")?;
    writeln!(out, "            coordIndex [")?;
    match geometry {
        Geometry::Planar { up, .. } => layer.write_indices(up, out)?,
        Geometry::Solid { .. } => layer.write_3d_indices(out)?,
    }
    writeln!(out, "            ]")?;
    writeln!(out, "          }}")?;
    writeln!(out, "        }}")?;
    writeln!(out, "        ]")?;
    writeln!(out, "      }}")?;
    writeln!(out, "    ]")?;
    writeln!(out, "  }}")
}

/// Export `board` as a VRML file at `path`. Relative model paths resolve
/// against `model_root`, or the output directory when none is given. The
/// file is written to a temporary file next to `path` and renamed into
/// place once complete.
pub fn export_vrml_file(
    board: &Board,
    settings: &ExportSettings,
    path: &Path,
    model_root: Option<&Path>,
) -> Result<ExportReport, ExportError> {
    let output_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let paths = ModelPaths {
        model_root: model_root.map(Path::to_path_buf).unwrap_or_else(|| output_dir.clone()),
        output_dir: output_dir.clone(),
    };
    let title = scene_title(&path.to_string_lossy());
    let scene = VrmlScene::build(board, settings, &paths, &title)?;

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(&output_dir).map_err(io_err)?;
    {
        let mut out = BufWriter::new(&mut tmp);
        scene.emit(&mut out).map_err(io_err)?;
        out.flush().map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    log::info!(
        "Exported {} to {}: {} layer meshes, {} models, {} triangles",
        board.name,
        path.display(),
        scene.report.layer_nodes,
        scene.report.model_nodes,
        scene.report.triangles
    );
    Ok(scene.report)
}
