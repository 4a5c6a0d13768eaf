//! Read-only access to the files of an export.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{LodTreeError, Result};

/// Read-only view of an import root. Paths are relative to that root.
pub trait Storage: Sync {
    /// Whole content of `path`; [`LodTreeError::NotFound`] when absent.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    /// Every file reachable under the root.
    fn list_all_paths(&self) -> Result<Vec<PathBuf>>;
}

/// Export unpacked in a filesystem directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for DirectoryStorage {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(self.root.join(path)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LodTreeError::NotFound(path.to_path_buf()),
            _ => LodTreeError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })
    }

    fn list_all_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| LodTreeError::Io {
                path: e.path().unwrap_or(&self.root).to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                paths.push(rel.to_path_buf());
            }
        }
        Ok(paths)
    }
}

/// Export held in memory, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style [`MemoryStorage::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }
}

impl Storage for MemoryStorage {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LodTreeError::NotFound(path.to_path_buf()))
    }

    fn list_all_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self.files.keys().cloned().collect())
    }
}
