//! LOD tree export import
//!
//! Reads a directory-based LOD tree export into one spatial tree with
//! per-node visibility ranges, absolute origins and mesh payload paths.
//!
//! # Modules
//! - `parse_xml` - quick-xml based DOM
//! - `attributes` - required element/attribute accessors
//! - `manifest` - manifest loading and version checks
//! - `srs` - reference frame classification and ENU re-basing
//! - `xml_tree` - tree from `LODTreeExport.xml` and per-tile manifests
//! - `flat_listing` - tree reconstructed from `Data/Tile_*` file names
//! - `export` - the entry point tying both paths together
//!
//! # Example
//! ```ignore
//! let storage = DirectoryStorage::new("exports/city");
//! let export = LodTreeExport::load(&storage, DVec3::ZERO)?;
//! for node in export.flatten() {
//!     println!("{:?} {}", node.model_path, node.min_range);
//! }
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod export;
pub mod flat_listing;
pub mod manifest;
pub mod node;
pub mod parse_xml;
pub mod srs;
pub mod storage;
pub mod xml_tree;

pub use config::ImportOptions;
pub use error::{LodTreeError, Result};
pub use export::LodTreeExport;
pub use flat_listing::{SkipReason, SkippedEntry};
pub use node::LodTreeNode;
pub use parse_xml::{parse_xml_bytes, XmlNode};
pub use srs::{BuiltinSrs, FrameKind, ReferenceFrame, SrsLibrary};
#[cfg(feature = "proj")]
pub use srs::ProjSrs;
pub use storage::{DirectoryStorage, MemoryStorage, Storage};

pub use glam::DVec3;
