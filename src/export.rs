//! The import entry point and its result.

use glam::DVec3;
use log::info;
use serde::Serialize;

use crate::config::ImportOptions;
use crate::error::{LodTreeError, Result};
use crate::flat_listing::{build_from_listing, SkippedEntry};
use crate::manifest::{load_manifest, TREE_EXPORT};
use crate::node::{flatten, LodTreeNode};
use crate::srs::{BuiltinSrs, ReferenceFrame, SrsLibrary};
use crate::storage::Storage;
use crate::xml_tree::build_from_manifest;

/// A fully imported LOD tree export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LodTreeExport {
    /// `None` when the export declares no reference system.
    pub reference_frame: Option<ReferenceFrame>,
    /// Export-wide origin after re-basing and the caller's offset.
    pub origin: DVec3,
    /// Forest roots, one per tile.
    pub blocks: Vec<LodTreeNode>,
    /// Entries left out during flat-listing reconstruction.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEntry>,
}

/// Outcome of looking up the primary manifest.
enum ManifestLookup {
    Found(Vec<u8>),
    Missing,
}

fn lookup_manifest(storage: &dyn Storage, options: &ImportOptions) -> Result<ManifestLookup> {
    match storage.read_all(&options.primary_manifest) {
        Ok(bytes) => Ok(ManifestLookup::Found(bytes)),
        Err(LodTreeError::NotFound(_)) => Ok(ManifestLookup::Missing),
        Err(e) => Err(e),
    }
}

impl LodTreeExport {
    /// Imports with default options, the given global offset and [`BuiltinSrs`].
    pub fn load(storage: &dyn Storage, offset: DVec3) -> Result<Self> {
        Self::load_with(storage, &ImportOptions::default().with_offset(offset), &BuiltinSrs)
    }

    /// Imports from the tree manifest, or from the file listing when that
    /// manifest is absent. Any other failure is returned as is.
    pub fn load_with(
        storage: &dyn Storage,
        options: &ImportOptions,
        srs: &dyn SrsLibrary,
    ) -> Result<Self> {
        let export = match lookup_manifest(storage, options)? {
            ManifestLookup::Found(bytes) => {
                let root = load_manifest(&bytes, &options.primary_manifest, &TREE_EXPORT)?;
                build_from_manifest(&root, storage, options, srs)?
            }
            ManifestLookup::Missing => {
                info!(
                    "{:?} not found, reconstructing tree from {:?}.",
                    options.primary_manifest, options.data_dir
                );
                build_from_listing(storage, options, srs)?
            }
        };

        info!(
            "Loaded {} blocks ({} nodes, {} skipped entries).",
            export.blocks.len(),
            export.node_count(),
            export.skipped.len()
        );
        Ok(export)
    }

    /// All nodes, depth-first and parent before children, in block order.
    pub fn flatten(&self) -> Vec<&LodTreeNode> {
        flatten(&self.blocks)
    }

    pub fn node_count(&self) -> usize {
        self.blocks.iter().map(LodTreeNode::subtree_len).sum()
    }
}
