//! Footprint 3D models placed in the scene.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nalgebra::{UnitQuaternion, Vector3};
use pcbgfx_core::board::{rotate_decideg, Model3d};
use pcbgfx_core::geometry::Point;
use pcbgfx_core::units::{decideg_to_rad, IU_PER_MILS};
use pcbgfx_core::{format_real, Footprint};

use crate::error::{ExportReport, ExportWarning};
use crate::model::VrmlModel;
use crate::settings::ExportSettings;

const MODEL_EXTENSIONS: [&str; 4] = ["wrl", "wrz", "vrml", "x3d"];
/// Model files are drawn in tenths of an inch.
const MODEL_UNITS_PER_MM: f64 = 2.54;
const ANGLE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelContent {
    /// Referenced by url.
    Inline(String),
    /// Scene text taken from the model file, header removed.
    Embedded(String),
}

/// One `Transform` node holding a footprint model.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Axis and angle in radians. `None` when the model is not rotated.
    pub rotation: Option<([f64; 3], f64)>,
    pub translation: [f64; 3],
    pub scale: [f64; 3],
    pub content: ModelContent,
}

impl SceneNode {
    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "  Transform {{")?;
        if let Some((axis, angle)) = self.rotation {
            writeln!(
                out,
                "    rotation {} {} {} {}",
                format_real(axis[0]),
                format_real(axis[1]),
                format_real(axis[2]),
                format_real(angle)
            )?;
        }
        writeln!(
            out,
            "    translation {} {} {}",
            format_real(self.translation[0]),
            format_real(self.translation[1]),
            format_real(self.translation[2])
        )?;
        writeln!(
            out,
            "    scale {} {} {}",
            format_real(self.scale[0]),
            format_real(self.scale[1]),
            format_real(self.scale[2])
        )?;
        match &self.content {
            ModelContent::Inline(url) => {
                writeln!(out, "    children [")?;
                writeln!(out, "    Inline {{")?;
                writeln!(out, "      url \"{}\"", url)?;
                writeln!(out, "    }} ]")?;
            }
            ModelContent::Embedded(text) => {
                writeln!(out, "    children [")?;
                writeln!(out, "{}", text.trim_end())?;
                writeln!(out, "    ]")?;
            }
        }
        writeln!(out, "  }}")
    }
}

/// Where model files are looked up and copied to.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Base for relative model paths.
    pub model_root: PathBuf,
    /// Directory of the scene file.
    pub output_dir: PathBuf,
}

/// Rotation of a model: the footprint orientation, then the model's own
/// Z, Y and X rotations. Back-side models turn over about X.
pub fn model_rotation(orientation: f64, rotation: [f64; 3], flipped: bool) -> Option<([f64; 3], f64)> {
    let mut rx = -rotation[0];
    let mut ry = -rotation[1];
    let mut rz = -rotation[2];
    if flipped {
        rx += 180.0;
        ry = -ry;
        rz = -rz;
    }
    let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), decideg_to_rad(orientation))
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rz.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), ry.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), rx.to_radians());
    q.axis_angle()
        .filter(|(_, angle)| angle.abs() > ANGLE_EPSILON)
        .map(|(axis, angle)| ([axis.x, axis.y, axis.z], angle))
}

/// Replace characters that may not appear in a copied model file name.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | ':' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

fn has_model_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| MODEL_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn is_vrml_text(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wrl"))
        .unwrap_or(false)
}

/// Drop the `#VRML` header line of a model file.
fn strip_header(text: &str) -> &str {
    match text.split_once('\n') {
        Some((first, rest)) if first.trim_start().starts_with("#VRML") => rest,
        None if text.trim_start().starts_with("#VRML") => "",
        _ => text,
    }
}

/// Build the scene node for one footprint model. Returns `None` for model
/// files the exporter does not handle.
pub fn model_node(
    model: &VrmlModel,
    fp: &Footprint,
    m3d: &Model3d,
    settings: &ExportSettings,
    paths: &ModelPaths,
    report: &mut ExportReport,
) -> Option<SceneNode> {
    let path = m3d.path.replace('\\', "/");
    if path.is_empty() {
        return None;
    }
    if !has_model_extension(&path) {
        report.warn(ExportWarning::UnsupportedModel { path });
        return None;
    }

    let source = paths.model_root.join(&path);
    let exists = source.is_file();
    if !exists {
        report.warn(ExportWarning::MissingModel { path: path.clone() });
    }

    let mut url = path.clone();
    if settings.copy_models {
        if let Some(copied) = copy_model(&source, exists, settings, paths, report) {
            url = copied;
        }
    }

    let content = if settings.embed_models && exists && is_vrml_text(&source) {
        match fs::read_to_string(&source) {
            Ok(text) => ModelContent::Embedded(strip_header(&text).to_string()),
            Err(e) => {
                report.warn(ExportWarning::ModelFile {
                    path: path.clone(),
                    message: e.to_string(),
                });
                ModelContent::Inline(url)
            }
        }
    } else {
        ModelContent::Inline(url)
    };

    let flipped = fp.is_flipped();
    let inch = IU_PER_MILS * 1000.0;
    let mut offset = [m3d.offset[0] * inch, m3d.offset[1] * inch, m3d.offset[2] * inch];
    if flipped {
        offset[2] = -offset[2];
    } else {
        offset[1] = -offset[1];
    }
    let planar = rotate_decideg(Point::new(offset[0], offset[1]), fp.orientation);
    let pos = Point::from(fp.position);

    let translation = [
        (planar.x + pos.x) * model.scale + model.tx,
        -(planar.y + pos.y) * model.scale - model.ty,
        offset[2] * model.scale + model.layer_z(fp.layer),
    ];
    let unit = MODEL_UNITS_PER_MM * settings.mm_to_output;
    let scale = m3d.scale.map(|s| s * unit);

    Some(SceneNode {
        rotation: model_rotation(fp.orientation, m3d.rotation, flipped),
        translation,
        scale,
        content,
    })
}

/// Copy `source` into the models subdirectory next to the scene, unless a
/// copy is already there. Returns the url of the copy.
fn copy_model(
    source: &Path,
    exists: bool,
    settings: &ExportSettings,
    paths: &ModelPaths,
    report: &mut ExportReport,
) -> Option<String> {
    let name = sanitize_file_name(source.file_name()?.to_str()?);
    let subdir = settings.models_subdir.replace('\\', "/");
    let url = format!("{}/{}", subdir.trim_end_matches('/'), name);
    let target = paths.output_dir.join(&subdir).join(&name);

    if !target.exists() && exists {
        let copied = fs::create_dir_all(paths.output_dir.join(&subdir)).and_then(|_| fs::copy(source, &target));
        if let Err(e) = copied {
            report.warn(ExportWarning::ModelFile {
                path: source.display().to_string(),
                message: e.to_string(),
            });
        } else {
            log::debug!("Copied {} to {}", source.display(), target.display());
        }
    }
    Some(url)
}
