//! Directory-backed `BlobStore`.
//!
//! Folders map to nested directories under a root, blobs to files.  Point
//! the root at a mounted or synced drive to use it as real remote storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{validate_segment, BlobStore, FolderPath};
use crate::errors::{CfeError, Result};

/// A `BlobStore` rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Use `root` as the store's top-level directory.  It is created on
    /// the first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_dir(&self, folder: &FolderPath) -> PathBuf {
        folder
            .segments()
            .iter()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    fn blob_path(&self, blob_name: &str, folder: &FolderPath) -> Result<PathBuf> {
        validate_segment(blob_name)?;
        Ok(self.folder_dir(folder).join(blob_name))
    }
}

fn not_found(blob_name: &str, folder: &FolderPath) -> CfeError {
    CfeError::RemoteBlobNotFound {
        name: blob_name.to_string(),
        folder: folder.to_string(),
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(&self, blob_name: &str, content: &[u8], folder: &FolderPath) -> Result<()> {
        let path = self.blob_path(blob_name, folder)?;
        let dir = self.folder_dir(folder);
        fs::create_dir_all(&dir)?;

        // Temp file + rename so a reader never sees a partial blob.
        let tmp_path = dir.join(format!(".{blob_name}.part"));
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        debug!(blob = blob_name, %folder, bytes = content.len(), "uploaded blob");
        Ok(())
    }

    fn download(&self, blob_name: &str, folder: &FolderPath) -> Result<Vec<u8>> {
        let path = self.blob_path(blob_name, folder)?;
        match fs::read(&path) {
            Ok(content) => {
                debug!(blob = blob_name, %folder, bytes = content.len(), "downloaded blob");
                Ok(content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(blob_name, folder)),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, blob_name: &str, folder: &FolderPath) -> Result<()> {
        let path = self.blob_path(blob_name, folder)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(blob = blob_name, %folder, "deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(blob_name, folder)),
            Err(e) => Err(e.into()),
        }
    }
}
