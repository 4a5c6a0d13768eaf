//! Tree construction from `LODTreeExport` manifests.

use std::path::{Path, PathBuf};

use glam::DVec3;
use log::{debug, info};
use rayon::prelude::*;

use crate::attributes::{
    require_child, require_double_text, require_point_attrs, require_text_attr,
};
use crate::config::ImportOptions;
use crate::error::{LodTreeError, Result};
use crate::export::LodTreeExport;
use crate::manifest::{load_manifest, TREE_EXPORT};
use crate::node::LodTreeNode;
use crate::parse_xml::XmlNode;
use crate::srs::{resolve_reference_frame, SrsLibrary};
use crate::storage::Storage;

/// Converts a `Node` (or tile root) element into a subtree.
///
/// `accumulated_origin` is the parent's absolute origin; `Center` offsets are
/// relative to it.
pub fn parse_node(
    elem: &XmlNode,
    payload_dir: &Path,
    accumulated_origin: DVec3,
    level: usize,
) -> Result<LodTreeNode> {
    let radius = node_value(elem, "Radius")?;
    let min_range = node_value(elem, "MinRange")?;

    let center = require_point_attrs(require_child(elem, "Center")?)?;
    let origin = accumulated_origin + center;

    let model_path = elem
        .first_child_named("ModelPath")
        .and_then(XmlNode::text)
        .map(|text| payload_dir.join(text.trim()));

    let children = elem
        .children_named("Node")
        .map(|child| parse_node(child, payload_dir, origin, level + 1))
        .collect::<Result<Vec<_>>>()?;

    Ok(LodTreeNode {
        radius,
        min_range,
        origin,
        model_path,
        children,
        level,
    })
}

fn node_value(elem: &XmlNode, name: &str) -> Result<f64> {
    require_child(elem, name)
        .and_then(require_double_text)
        .map_err(|_| LodTreeError::schema(&elem.name, name))
}

/// Builds the export from an already loaded root manifest.
pub(crate) fn build_from_manifest(
    root: &XmlNode,
    storage: &dyn Storage,
    options: &ImportOptions,
    srs: &dyn SrsLibrary,
) -> Result<LodTreeExport> {
    let srs_text = require_child(root, "SRS")?.text().unwrap_or_default();
    let local = require_point_attrs(require_child(root, "Local")?)?;

    let resolved = resolve_reference_frame(srs, srs_text, local)?;
    let origin = resolved.origin + options.offset;

    let tile_paths = root
        .children_named("Tile")
        .map(|tile| require_text_attr(tile, "path").map(PathBuf::from))
        .collect::<Result<Vec<_>>>()?;

    let blocks = if options.parallel {
        // Errors surface in document order, whichever tile finishes first.
        tile_paths
            .par_iter()
            .map(|path| load_block(storage, path, origin))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>>>()?
    } else {
        tile_paths
            .iter()
            .map(|path| load_block(storage, path, origin))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(LodTreeExport {
        reference_frame: resolved.frame,
        origin,
        blocks,
        skipped: Vec::new(),
    })
}

/// Loads one per-tile manifest and parses its `Tile` element as a forest root.
fn load_block(storage: &dyn Storage, path: &Path, origin: DVec3) -> Result<LodTreeNode> {
    info!("Parsing block {path:?}.");

    let bytes = storage.read_all(path)?;
    let tile_manifest = load_manifest(&bytes, path, &TREE_EXPORT)?;
    let tile_root = require_child(&tile_manifest, "Tile")?;

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let block = parse_node(tile_root, dir, origin, 0)?;
    debug!("{path:?}: {} nodes", block.subtree_len());
    Ok(block)
}
