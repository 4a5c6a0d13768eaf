// Import by reconstructing the tree from Data/Tile_* file names
use lodtree::{
    DVec3, DirectoryStorage, LodTreeError, LodTreeExport, LodTreeNode, MemoryStorage,
    ReferenceFrame, SkipReason,
};
use std::path::PathBuf;

const METADATA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ModelMetadata version="1">
    <SRS>EPSG:32633</SRS>
    <SRSOrigin>500000,5000000,250</SRSOrigin>
    <Texture><ColorSource>Visible</ColorSource></Texture>
</ModelMetadata>"#;

fn tile_files(storage: MemoryStorage, tile: &str, ids: &[&str]) -> MemoryStorage {
    ids.iter().fold(storage, |storage, id| {
        let name = if id.is_empty() {
            format!("Data/{tile}/{tile}_L16.obj")
        } else {
            format!("Data/{tile}/{tile}_L{}_{id}.obj", 16 + id.len())
        };
        storage.with_file(name, "o")
    })
}

fn describe(node: &LodTreeNode) -> String {
    let file = node
        .model_path
        .as_ref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = file.rsplit_once('_').map(|(_, id)| id).unwrap_or("");
    let id = if id.starts_with('L') { "root" } else { id };
    if node.children.is_empty() {
        id.to_string()
    } else {
        let children: Vec<String> = node.children.iter().map(describe).collect();
        format!("{id}({})", children.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_when_manifest_missing() {
        let storage = MemoryStorage::new().with_file("metadata.xml", METADATA);
        let storage = tile_files(storage, "Tile_+000_+000", &["", "0", "1", "00", "01", "1X"]);

        let export = LodTreeExport::load(&storage, DVec3::new(0.0, 0.0, -250.0)).unwrap();

        assert_eq!(export.origin, DVec3::new(500000.0, 5000000.0, 0.0));
        assert!(matches!(export.reference_frame, Some(ReferenceFrame::Defined { .. })));
        assert_eq!(export.blocks.len(), 1);
        assert!(export.skipped.is_empty());

        let root = &export.blocks[0];
        assert_eq!(describe(root), "root(0(00,01),1(1X))");
        assert_eq!(root.level, 0);
        assert_eq!(
            root.model_path,
            Some(PathBuf::from("Data/Tile_+000_+000/Tile_+000_+000_L16.obj"))
        );
        assert!(export.flatten().iter().all(|n| n.origin == export.origin));
        assert!(export.flatten().iter().all(|n| n.radius == 0.0 && n.min_range == 0.0));
        assert_eq!(root.children[1].children[0].level, 2);
    }

    #[test]
    fn test_tiles_in_directory_order_and_non_tiles_ignored() {
        let storage = MemoryStorage::new()
            .with_file("metadata.xml", METADATA)
            .with_file("Data/Textures/Tile_x_L16.obj", "o")
            .with_file("Data/Tile_+001_+000/Tile_+001_+000_L16.jpg", "jpg");
        let storage = tile_files(storage, "Tile_+001_+000", &["", "2"]);
        let storage = tile_files(storage, "Tile_+000_+001", &[""]);

        let export = LodTreeExport::load(&storage, DVec3::ZERO).unwrap();
        let roots: Vec<PathBuf> = export
            .blocks
            .iter()
            .filter_map(|b| b.model_path.clone())
            .collect();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("Data/Tile_+000_+001/Tile_+000_+001_L16.obj"),
                PathBuf::from("Data/Tile_+001_+000/Tile_+001_+000_L16.obj"),
            ]
        );

        // Two roots: one with a child, one leaf.
        assert_eq!(export.flatten().len(), 3);
    }

    #[test]
    fn test_lenient_entries_are_reported() {
        let storage = MemoryStorage::new()
            .with_file("metadata.xml", METADATA)
            .with_file("Data/Tile_0/Tile_0_L18_0_x.obj", "o")
            .with_file("Data/Tile_1/readme.txt", "no meshes here");
        let storage = tile_files(storage, "Tile_0", &["", "0", "7Z"]);

        let export = LodTreeExport::load(&storage, DVec3::ZERO).unwrap();
        assert_eq!(export.blocks.len(), 1);
        assert_eq!(describe(&export.blocks[0]), "root(0)");

        let reasons: Vec<&SkipReason> = export.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(reasons.len(), 3);
        assert!(reasons.contains(&&SkipReason::TokenCount { tokens: 5 }));
        assert!(reasons.contains(&&SkipReason::NoAncestor {
            identifier: "7Z".to_string(),
            active: "0".to_string(),
        }));
        assert!(reasons.contains(&&SkipReason::EmptyTile));
    }

    #[test]
    fn test_missing_data_directory_is_fatal() {
        let storage = MemoryStorage::new()
            .with_file("metadata.xml", METADATA)
            .with_file("Other/Tile_0/Tile_0_L16.obj", "o");
        let err = LodTreeExport::load(&storage, DVec3::ZERO).unwrap_err();
        assert!(matches!(err, LodTreeError::NotFound(ref p) if p == &PathBuf::from("Data")));
    }

    #[test]
    fn test_missing_both_manifests_is_fatal() {
        let storage = tile_files(MemoryStorage::new(), "Tile_0", &[""]);
        let err = LodTreeExport::load(&storage, DVec3::ZERO).unwrap_err();
        assert!(matches!(err, LodTreeError::NotFound(ref p) if p == &PathBuf::from("metadata.xml")));
    }

    #[test]
    fn test_metadata_version_and_origin_validation() {
        let newer = MemoryStorage::new().with_file(
            "metadata.xml",
            r#"<ModelMetadata version="1.1"><SRS/><SRSOrigin>0,0,0</SRSOrigin></ModelMetadata>"#,
        );
        assert!(matches!(
            LodTreeExport::load(&newer, DVec3::ZERO),
            Err(LodTreeError::Version { .. })
        ));

        let bad_origin = MemoryStorage::new().with_file(
            "metadata.xml",
            r#"<ModelMetadata version="1"><SRS/><SRSOrigin>0;0;0</SRSOrigin></ModelMetadata>"#,
        );
        assert!(matches!(
            LodTreeExport::load(&bad_origin, DVec3::ZERO),
            Err(LodTreeError::Schema { .. })
        ));
    }

    #[test]
    fn test_geographic_metadata_is_rebased() {
        let metadata = r#"<ModelMetadata version="1">
            <SRS>EPSG:4326</SRS>
            <SRSOrigin>10,20,0</SRSOrigin>
        </ModelMetadata>"#;
        let storage = tile_files(
            MemoryStorage::new().with_file("metadata.xml", metadata),
            "Tile_0",
            &[""],
        );
        let export = LodTreeExport::load(&storage, DVec3::ZERO).unwrap();
        assert_eq!(export.origin, DVec3::ZERO);
        match export.reference_frame {
            Some(ReferenceFrame::Enu { anchor, .. }) => assert_eq!(anchor, DVec3::new(10.0, 20.0, 0.0)),
            other => panic!("expected ENU frame, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_storage_import() {
        let dir = tempfile::tempdir().unwrap();
        let tile = dir.path().join("Data/Tile_+000_+000");
        std::fs::create_dir_all(&tile).unwrap();
        std::fs::write(dir.path().join("metadata.xml"), METADATA).unwrap();
        for name in [
            "Tile_+000_+000_L16.obj",
            "Tile_+000_+000_L17_0.obj",
            "Tile_+000_+000_L17_1.obj",
            "Tile_+000_+000_L17_1.mtl",
        ] {
            std::fs::write(tile.join(name), b"o").unwrap();
        }

        let storage = DirectoryStorage::new(dir.path());
        let first = LodTreeExport::load(&storage, DVec3::ZERO).unwrap();
        let second = LodTreeExport::load(&storage, DVec3::ZERO).unwrap();
        assert_eq!(first, second);
        assert_eq!(describe(&first.blocks[0]), "root(0,1)");
    }
}
