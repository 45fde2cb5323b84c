use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Options for one VRML export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output units per millimetre. 1.0 writes millimetres, 0.1 writes
    /// centimetres, 1/25.4 writes inches.
    pub mm_to_output: f64,
    /// Largest allowed distance between a curve and its polygon, in mm.
    pub max_deviation_mm: f64,
    /// Copy footprint model files next to the output.
    pub copy_models: bool,
    /// Directory, relative to the output file, receiving copied models.
    pub models_subdir: String,
    /// Translate the board so its bounding box is centred on the origin.
    pub center_board: bool,
    /// Write the contents of `.wrl` model files into the scene instead of
    /// referencing them.
    pub embed_models: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            mm_to_output: 1.0,
            max_deviation_mm: 0.02,
            copy_models: false,
            models_subdir: "shapes3D".to_string(),
            center_board: true,
            embed_models: false,
        }
    }
}

impl ExportSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;
        log::debug!("Loaded export settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.mm_to_output > 0.0) || !self.mm_to_output.is_finite() {
            return Err(SettingsError::Invalid {
                name: "mm_to_output",
                message: format!("must be a positive number, got {}", self.mm_to_output),
            });
        }
        if !(self.max_deviation_mm > 0.0) || !self.max_deviation_mm.is_finite() {
            return Err(SettingsError::Invalid {
                name: "max_deviation_mm",
                message: format!("must be a positive number, got {}", self.max_deviation_mm),
            });
        }
        if self.copy_models && self.models_subdir.trim().is_empty() {
            return Err(SettingsError::Invalid {
                name: "models_subdir",
                message: "required when copying models".to_string(),
            });
        }
        Ok(())
    }
}
