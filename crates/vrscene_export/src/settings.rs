// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export settings.
//!
//! Read-only for the duration of a pass: the evaluation frame, the global
//! material override and the feature toggles.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vrscene_graph::LoadError;

/// Export settings file name
pub const SETTINGS_FILE_NAME: &str = "vrscene_export.ron";

/// Settings shared by every resolver in a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Frame the literal values belong to
    pub frame_current: i32,
    /// Wrap literal values in `interpolate((frame, value))`
    pub animation: bool,
    /// Hand meshes to the geometry exporter
    pub auto_meshes: bool,
    /// Material used for every tree that allows overriding
    pub material_override: Option<String>,
    /// Drop file attributes whose file does not exist
    pub check_paths: bool,
    /// Directory that `//` relative paths are resolved against
    pub base_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frame_current: 1,
            animation: false,
            auto_meshes: true,
            material_override: None,
            check_paths: false,
            base_dir: None,
        }
    }
}

impl ExportSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, LoadError> {
        Ok(ron::from_str(text)?)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }
}
