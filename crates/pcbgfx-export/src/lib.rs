//! Export of a board as a VRML 2.0 scene: the board body, copper, tin and
//! silkscreen meshes, plus the footprint 3D models.

pub mod entities;
pub mod error;
pub mod material;
pub mod model;
pub mod scene;
pub mod settings;
pub mod writer;
pub mod zstack;

pub use error::{ExportError, ExportReport, ExportWarning};
pub use model::{VrmlLayer, VrmlModel};
pub use scene::{ModelContent, ModelPaths, SceneNode};
pub use settings::{ExportSettings, SettingsError};
pub use writer::{export_vrml_file, scene_title, VrmlScene};
pub use zstack::LayerZ;
