//! Import options with defaults matching the export layout.

use std::path::{Path, PathBuf};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{LodTreeError, Result};

/// Options controlling one import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportOptions {
    /// Global offset added to the export origin after re-basing.
    pub offset: DVec3,
    /// Tree manifest at the import root.
    pub primary_manifest: PathBuf,
    /// Metadata manifest read when the tree manifest is absent.
    pub alternative_manifest: PathBuf,
    /// Top-level directory holding tile directories.
    pub data_dir: String,
    /// Name prefix of tile directories.
    pub tile_prefix: String,
    /// Recognized mesh file extensions, without the dot.
    pub mesh_extensions: Vec<String>,
    /// Load independent tiles on the rayon pool.
    pub parallel: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            offset: DVec3::ZERO,
            primary_manifest: PathBuf::from("LODTreeExport.xml"),
            alternative_manifest: PathBuf::from("metadata.xml"),
            data_dir: "Data".to_string(),
            tile_prefix: "Tile_".to_string(),
            mesh_extensions: vec!["obj".to_string(), "dae".to_string()],
            parallel: true,
        }
    }
}

impl ImportOptions {
    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LodTreeError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LodTreeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    pub(crate) fn is_mesh_extension(&self, ext: &str) -> bool {
        self.mesh_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}
