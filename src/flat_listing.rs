//! Tree reconstruction from tile file names when no tree manifest exists.
//!
//! Mesh files inside `Data/Tile_*` directories are named
//! `<tileDir>[_<level>_<identifier>].<ext>`. The identifier encodes the path
//! from the tile root: each character is one step down, so a node's parent is
//! the node whose identifier is its longest proper prefix.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glam::DVec3;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::attributes::{require_child, require_text};
use crate::config::ImportOptions;
use crate::error::{LodTreeError, Result};
use crate::export::LodTreeExport;
use crate::manifest::{load_manifest, MODEL_METADATA};
use crate::node::LodTreeNode;
use crate::srs::{resolve_reference_frame, SrsLibrary};
use crate::storage::Storage;

/// Why a listing entry was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// File name splits into neither 3 nor 4 tokens.
    TokenCount { tokens: usize },
    /// Identifier does not extend the nearest shorter identifier.
    NoAncestor { identifier: String, active: String },
    /// A second candidate for the tile root.
    DuplicateRoot { identifier: String },
    /// Tile directory without any usable mesh file.
    EmptyTile,
}

/// Listing entry excluded from reconstruction. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Directory structure materialized from a flat path listing.
#[derive(Debug, Default)]
struct DirTree {
    dirs: BTreeMap<String, DirTree>,
    files: BTreeMap<String, PathBuf>,
}

impl DirTree {
    fn from_paths(paths: &[PathBuf]) -> Self {
        let mut tree = DirTree::default();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    fn insert(&mut self, path: &Path) {
        let segments: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let Some((file, dirs)) = segments.split_last() else {
            return;
        };

        let mut current = self;
        for dir in dirs {
            current = current.dirs.entry(dir.clone()).or_default();
        }
        current.files.insert(file.clone(), path.to_path_buf());
    }
}

/// Builds the export from `metadata.xml` and the storage listing.
pub(crate) fn build_from_listing(
    storage: &dyn Storage,
    options: &ImportOptions,
    srs: &dyn SrsLibrary,
) -> Result<LodTreeExport> {
    let manifest_path = options.alternative_manifest.as_path();
    let bytes = storage.read_all(manifest_path)?;
    let root = load_manifest(&bytes, manifest_path, &MODEL_METADATA)?;

    let srs_text = require_child(&root, "SRS")?.text().unwrap_or_default();
    let srs_origin = parse_origin_triple(require_text(require_child(&root, "SRSOrigin")?)?)?;

    let resolved = resolve_reference_frame(srs, srs_text, srs_origin)?;
    let origin = resolved.origin + options.offset;

    let tree = DirTree::from_paths(&storage.list_all_paths()?);
    let data = tree
        .dirs
        .get(&options.data_dir)
        .ok_or_else(|| LodTreeError::NotFound(PathBuf::from(&options.data_dir)))?;

    let tile_dirs: Vec<(&String, &DirTree)> = data
        .dirs
        .iter()
        .filter(|(name, _)| name.starts_with(&options.tile_prefix))
        .collect();

    let results: Vec<(Option<LodTreeNode>, Vec<SkippedEntry>)> = if options.parallel {
        tile_dirs
            .par_iter()
            .map(|(name, dir)| build_tile(name, dir, options, origin))
            .collect()
    } else {
        tile_dirs
            .iter()
            .map(|(name, dir)| build_tile(name, dir, options, origin))
            .collect()
    };

    let mut blocks = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (block, tile_skipped) in results {
        blocks.extend(block);
        skipped.extend(tile_skipped);
    }

    Ok(LodTreeExport {
        reference_frame: resolved.frame,
        origin,
        blocks,
        skipped,
    })
}

/// Parses a literal `x,y,z` triple.
pub fn parse_origin_triple(text: &str) -> Result<DVec3> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| LodTreeError::schema("SRSOrigin", "x,y,z"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => Err(LodTreeError::schema("SRSOrigin", "x,y,z")),
    }
}

fn build_tile(
    name: &str,
    dir: &DirTree,
    options: &ImportOptions,
    origin: DVec3,
) -> (Option<LodTreeNode>, Vec<SkippedEntry>) {
    info!("Reconstructing block {name:?}.");
    let (candidates, mut skipped) = collect_candidates(name, dir, options);
    let tile_path = Path::new(&options.data_dir).join(name);
    let (root, reconstruction_skipped) = reconstruct_tree(&tile_path, candidates, origin);
    skipped.extend(reconstruction_skipped);
    (root, skipped)
}

/// Mesh files of one tile directory as `(identifier, path)` pairs.
fn collect_candidates(
    dir_name: &str,
    dir: &DirTree,
    options: &ImportOptions,
) -> (Vec<(String, PathBuf)>, Vec<SkippedEntry>) {
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for (file_name, path) in &dir.files {
        let Some(rest) = file_name.strip_prefix(dir_name) else {
            continue;
        };
        let is_mesh = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| options.is_mesh_extension(e));
        if !is_mesh {
            continue;
        }

        let tokens: Vec<&str> = rest.split(|c| c == '_' || c == '.').collect();
        match tokens.len() {
            3 => candidates.push((String::new(), path.clone())),
            4 => candidates.push((tokens[2].to_string(), path.clone())),
            n => {
                warn!("{path:?}: unexpected file name ({n} tokens), skipping.");
                skipped.push(SkippedEntry {
                    path: path.clone(),
                    reason: SkipReason::TokenCount { tokens: n },
                });
            }
        }
    }

    (candidates, skipped)
}

/// Rebuilds one tile's hierarchy from identifier-named payloads.
///
/// After sorting, the smallest identifier is the root. Each following entry
/// pops the stack down to the nearest strictly shorter identifier and must
/// have it as a literal prefix; entries that don't are skipped.
pub fn reconstruct_tree(
    tile_path: &Path,
    mut pairs: Vec<(String, PathBuf)>,
    origin: DVec3,
) -> (Option<LodTreeNode>, Vec<SkippedEntry>) {
    let mut skipped = Vec::new();
    pairs.sort();

    let mut pairs = pairs.into_iter();
    let Some((root_id, root_path)) = pairs.next() else {
        warn!("{tile_path:?}: no mesh files, skipping tile.");
        skipped.push(SkippedEntry {
            path: tile_path.to_path_buf(),
            reason: SkipReason::EmptyTile,
        });
        return (None, skipped);
    };

    let root_level = root_id.len();
    let mut stack: Vec<(String, LodTreeNode)> =
        vec![(root_id, LodTreeNode::with_model(root_path, origin, root_level))];

    for (id, path) in pairs {
        while stack.len() > 1 && stack.last().is_some_and(|(top, _)| top.len() >= id.len()) {
            attach_top(&mut stack);
        }
        let Some((active, _)) = stack.last() else {
            break;
        };

        if active.len() >= id.len() {
            warn!("{path:?}: second root candidate for {tile_path:?}, skipping.");
            skipped.push(SkippedEntry {
                path,
                reason: SkipReason::DuplicateRoot { identifier: id },
            });
            continue;
        }
        if !id.starts_with(active.as_str()) {
            warn!("{path:?}: identifier {id:?} does not extend {active:?}, skipping.");
            skipped.push(SkippedEntry {
                path,
                reason: SkipReason::NoAncestor {
                    identifier: id,
                    active: active.clone(),
                },
            });
            continue;
        }

        debug!("{path:?}: node {id:?} under {active:?}");
        let level = id.len();
        stack.push((id, LodTreeNode::with_model(path, origin, level)));
    }

    while stack.len() > 1 {
        attach_top(&mut stack);
    }
    (stack.pop().map(|(_, root)| root), skipped)
}

/// Moves the top frame's node into the children of the frame below it.
fn attach_top(stack: &mut Vec<(String, LodTreeNode)>) {
    if let Some((_, node)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}
