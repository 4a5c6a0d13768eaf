//! Manifest loading and version validation.

use std::path::Path;

use log::debug;

use crate::attributes::require_double_attr;
use crate::error::{LodTreeError, Result};
use crate::parse_xml::{parse_xml_bytes, XmlNode};

const VERSION_TOLERANCE: f64 = 1e-12;

/// Root element name and newest accepted version of one manifest flavor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifestSchema {
    pub root_element: &'static str,
    pub max_version: f64,
}

/// The tree-export manifest, also used for per-tile manifests.
pub const TREE_EXPORT: ManifestSchema = ManifestSchema {
    root_element: "LODTreeExport",
    max_version: 1.1,
};

/// The alternative metadata manifest read before flat-listing reconstruction.
pub const MODEL_METADATA: ManifestSchema = ManifestSchema {
    root_element: "ModelMetadata",
    max_version: 1.0,
};

/// Parses `bytes` and returns the validated root element.
pub fn load_manifest(bytes: &[u8], path: &Path, schema: &ManifestSchema) -> Result<XmlNode> {
    let root = parse_xml_bytes(bytes, path)?;
    if root.name != schema.root_element {
        return Err(LodTreeError::schema(root.name, schema.root_element));
    }

    let version = require_double_attr(&root, "version")?;
    if version > schema.max_version + VERSION_TOLERANCE {
        return Err(LodTreeError::Version {
            path: path.to_path_buf(),
            version,
            max: schema.max_version,
        });
    }
    debug!("{path:?}: {} version {version}", schema.root_element);

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(xml: &str, schema: &ManifestSchema) -> Result<XmlNode> {
        load_manifest(xml.as_bytes(), Path::new("LODTreeExport.xml"), schema)
    }

    #[test]
    fn test_version_boundary() {
        assert!(load(r#"<LODTreeExport version="1.1"/>"#, &TREE_EXPORT).is_ok());
        assert!(load(r#"<LODTreeExport version="1.0"/>"#, &TREE_EXPORT).is_ok());
        assert!(matches!(
            load(r#"<LODTreeExport version="1.1000000001"/>"#, &TREE_EXPORT),
            Err(LodTreeError::Version { .. })
        ));
        assert!(matches!(
            load(r#"<LODTreeExport version="1.2"/>"#, &TREE_EXPORT),
            Err(LodTreeError::Version { .. })
        ));
    }

    #[test]
    fn test_metadata_schema_max_is_one() {
        assert!(load(r#"<ModelMetadata version="1"/>"#, &MODEL_METADATA).is_ok());
        assert!(matches!(
            load(r#"<ModelMetadata version="1.1"/>"#, &MODEL_METADATA),
            Err(LodTreeError::Version { .. })
        ));
    }

    #[test]
    fn test_wrong_root_element_is_schema_error() {
        let err = load(r#"<ModelMetadata version="1"/>"#, &TREE_EXPORT).unwrap_err();
        match err {
            LodTreeError::Schema { element, missing } => {
                assert_eq!(element, "ModelMetadata");
                assert_eq!(missing, "LODTreeExport");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_version_is_schema_error() {
        assert!(matches!(
            load("<LODTreeExport/>", &TREE_EXPORT),
            Err(LodTreeError::Schema { .. })
        ));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        assert!(matches!(
            load(r#"<LODTreeExport version="1.1">"#, &TREE_EXPORT),
            Err(LodTreeError::Parse { .. })
        ));
    }
}
