//! LOD tree node model.

use std::path::PathBuf;

use glam::DVec3;
use serde::Serialize;

/// One element of the spatial hierarchy.
///
/// `origin` is absolute in the export's reference frame once the node is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LodTreeNode {
    pub radius: f64,
    pub min_range: f64,
    pub origin: DVec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LodTreeNode>,
    /// Recursion depth (manifest trees) or identifier length (reconstructed
    /// trees). Only comparable within one tree.
    pub level: usize,
}

impl LodTreeNode {
    /// Node without range data, as produced by flat-listing reconstruction.
    pub fn with_model(model_path: PathBuf, origin: DVec3, level: usize) -> Self {
        Self {
            radius: 0.0,
            min_range: 0.0,
            origin,
            model_path: Some(model_path),
            children: Vec::new(),
            level,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(LodTreeNode::subtree_len).sum::<usize>()
    }
}

/// Depth-first, parent-before-children traversal over a forest.
pub fn flatten(roots: &[LodTreeNode]) -> Vec<&LodTreeNode> {
    let mut out = Vec::with_capacity(roots.iter().map(LodTreeNode::subtree_len).sum());
    let mut stack: Vec<&LodTreeNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}
