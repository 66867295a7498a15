//! Remote blob storage.
//!
//! The vault never talks to a storage provider directly.  It needs only
//! the `BlobStore` capability: put, fetch, and remove a named blob inside
//! a folder path.  Retries and authentication belong to the backend.
//!
//! This module provides:
//! - The `BlobStore` trait and `FolderPath` (`mod.rs`)
//! - A directory-backed implementation, `LocalBlobStore` (`local`)

pub mod local;

use std::fmt;

use crate::errors::{CfeError, Result};

pub use local::LocalBlobStore;

/// A folder inside the remote store, as a list of path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// Build a folder path from its segments, validating each one.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// A sub-folder of this folder.
    pub fn child(&self, segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// The folder's segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Storage for opaque named blobs, scoped to folder paths.
///
/// All calls are blocking.  `download` and `delete` fail with
/// `CfeError::RemoteBlobNotFound` when the blob is absent.
pub trait BlobStore {
    /// Store `content` as `blob_name` in `folder`, creating the folder.
    fn upload(&self, blob_name: &str, content: &[u8], folder: &FolderPath) -> Result<()>;

    /// Fetch the content of `blob_name` in `folder`.
    fn download(&self, blob_name: &str, folder: &FolderPath) -> Result<Vec<u8>>;

    /// Remove `blob_name` from `folder`.
    fn delete(&self, blob_name: &str, folder: &FolderPath) -> Result<()>;

    /// Upsert: write `content` if given, otherwise make sure the blob is
    /// gone.  Never fails with `RemoteBlobNotFound`.
    fn replace(&self, blob_name: &str, content: Option<&[u8]>, folder: &FolderPath) -> Result<()> {
        match content {
            Some(bytes) => self.upload(blob_name, bytes, folder),
            None => match self.delete(blob_name, folder) {
                Err(CfeError::RemoteBlobNotFound { .. }) => Ok(()),
                other => other,
            },
        }
    }
}

/// Reject names that could escape their folder.
pub(crate) fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(CfeError::RemoteError(format!(
            "invalid remote path segment '{}'",
            segment.escape_debug()
        )));
    }
    Ok(())
}
