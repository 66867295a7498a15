//! `VaultEntry` — one label-to-remote-file mapping.
//!
//! The stored `name` is a compound token `"<label> <remote_id>"`.  Lookups
//! match on the label prefix; the remote id is generated here and only
//! ever read back out.

use std::fmt;

use crate::crypto::{generate_salt, ContentKey, SALT_LEN};
use crate::errors::{CfeError, Result};

/// Longest label accepted, in bytes.
pub const MAX_LABEL_LEN: usize = 255;

/// A single record owned by the active password.
#[derive(Clone, PartialEq, Eq)]
pub struct VaultEntry {
    /// Compound `"<label> <remote_id>"` name.
    pub name: String,

    /// Key for the uploaded file's content.
    pub content_key: ContentKey,

    /// Salt for deriving this record's envelope key.  Fixed at creation.
    pub envelope_salt: [u8; SALT_LEN],
}

impl VaultEntry {
    /// Build a new entry with a fresh content key and envelope salt.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_key: ContentKey::random(),
            envelope_salt: generate_salt(),
        }
    }

    /// Join a label and remote id into the stored name.
    pub fn compose_name(label: &str, remote_id: &str) -> String {
        format!("{label} {remote_id}")
    }

    /// The user-chosen label (everything before the last space).
    pub fn label(&self) -> &str {
        self.name
            .rsplit_once(' ')
            .map_or(self.name.as_str(), |(label, _)| label)
    }

    /// The generated remote identifier (everything after the last space).
    ///
    /// Returns `None` for names that were stored without one.
    pub fn remote_id(&self) -> Option<&str> {
        self.name
            .rsplit_once(' ')
            .map(|(_, id)| id)
            .filter(|id| !id.is_empty())
    }

    /// Name of the encrypted blob holding this entry's file content.
    pub fn blob_name(&self) -> Option<String> {
        self.remote_id().map(|id| format!("{id}.enc"))
    }
}

impl fmt::Debug for VaultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultEntry")
            .field("name", &self.name)
            .field("content_key", &self.content_key)
            .field("envelope_salt", &"<redacted>")
            .finish()
    }
}

/// Validate that a label is safe to use as a prefix key.
///
/// Labels must be non-empty, at most 255 bytes, and free of whitespace
/// and control characters.  A space inside a label would let a lookup
/// for `"foo"` match the entry `"foo bar <id>"`.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(CfeError::InvalidLabel("label cannot be empty".into()));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(CfeError::InvalidLabel(format!(
            "label cannot exceed {MAX_LABEL_LEN} bytes"
        )));
    }
    if label.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CfeError::InvalidLabel(format!(
            "'{}' contains whitespace or control characters",
            label.escape_debug()
        )));
    }
    Ok(())
}
