use std::fmt;
use std::io;
use std::path::PathBuf;

use pcbgfx_core::GeometryError;
use thiserror::Error;

use crate::settings::SettingsError;

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Tessellation of layer {layer} failed: {source}")]
    Tessellation {
        layer: &'static str,
        #[source]
        source: GeometryError,
    },
}

// ── Warnings ──────────────────────────────────────────────────────────

/// A recoverable problem met during export. The export carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportWarning {
    /// No usable outline; the board body is the bounding rectangle.
    OutlineFallback,
    /// A shape was dropped because its geometry was rejected.
    Geometry { item: String, message: String },
    /// A referenced model file does not exist; it is still referenced.
    MissingModel { path: String },
    /// A model file type the exporter does not handle.
    UnsupportedModel { path: String },
    /// A model could not be copied or read.
    ModelFile { path: String, message: String },
}

impl ExportWarning {
    pub fn geometry(item: impl Into<String>, err: &GeometryError) -> Self {
        Self::Geometry {
            item: item.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutlineFallback => {
                write!(f, "board outline unavailable, using the bounding box")
            }
            Self::Geometry { item, message } => write!(f, "{} skipped: {}", item, message),
            Self::MissingModel { path } => write!(f, "3D model {} not found", path),
            Self::UnsupportedModel { path } => write!(f, "3D model {} has an unsupported type", path),
            Self::ModelFile { path, message } => write!(f, "3D model {}: {}", path, message),
        }
    }
}

/// What an export produced, including the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub warnings: Vec<ExportWarning>,
    /// Mesh nodes written, one per non-empty layer.
    pub layer_nodes: usize,
    /// Footprint model nodes written.
    pub model_nodes: usize,
    pub triangles: usize,
}

impl ExportReport {
    pub fn warn(&mut self, warning: ExportWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
