//! Error types for LOD tree import.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LodTreeError>;

/// Errors that can occur while importing a LOD tree export.
///
/// Every variant except [`LodTreeError::NotFound`] on the primary manifest is
/// fatal to the import.
#[derive(Debug, thiserror::Error)]
pub enum LodTreeError {
    /// Malformed XML document.
    #[error("error loading {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Required element, attribute or numeric text missing, or an
    /// unexpected root element.
    #[error("XML element \"{element}\": required \"{missing}\" is missing or malformed")]
    Schema { element: String, missing: String },

    /// Manifest declares a newer format than this reader understands.
    #[error("{path:?}: unsupported format version ({version}, max {max})")]
    Version { path: PathBuf, version: f64, max: f64 },

    /// Named resource absent from storage.
    #[error("{0:?} not found")]
    NotFound(PathBuf),

    /// Storage failure other than not-found.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reference system text that cannot be interpreted.
    #[error("invalid reference system: {0}")]
    Srs(String),

    /// Import options that cannot be loaded.
    #[error("invalid import options: {0}")]
    Config(String),
}

impl LodTreeError {
    pub(crate) fn schema(element: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::Schema {
            element: element.into(),
            missing: missing.into(),
        }
    }

    /// True for the condition that triggers the flat-listing fallback.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
