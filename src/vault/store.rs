//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` owns the entries the active password can open and, beside
//! them, the raw lines it cannot.  Every mutation rewrites the whole file
//! so foreign lines are carried through untouched.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::Argon2Params;
use crate::errors::{CfeError, Result};

use super::codec;
use super::entry::{validate_label, VaultEntry};

/// The main vault handle.  Open one with `VaultStore::open`, then use its
/// methods to look up, create, and delete entries.
pub struct VaultStore {
    /// Path to the vault file on disk.
    path: PathBuf,

    /// Master password, held only for the lifetime of the store.
    password: Zeroizing<String>,

    /// KDF cost used for every record this store reads or writes.
    params: Argon2Params,

    /// Entries that decrypted under `password`, in file order.
    entries: Vec<VaultEntry>,

    /// Encoded line for each entry in `entries`, same order.  Lines read
    /// from disk are written back unchanged; new entries are wrapped once.
    lines: Vec<Vec<u8>>,

    /// Raw lines that did not, preserved byte-for-byte.
    foreign_records: Vec<Vec<u8>>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create an empty vault file at `path` unless one already exists.
    ///
    /// Returns `true` when a new file was created.  An existing vault is
    /// left untouched, since other passwords may own records in it.
    pub fn initialize(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = open_private(path, false)?;
        file.sync_all()?;
        info!(path = %path.display(), "initialized empty vault");
        Ok(true)
    }

    /// Open the vault at `path` and sort its records by ownership.
    ///
    /// Each line is unwrapped with `password`; lines that open become
    /// entries, the rest are kept as foreign records.  A missing file is
    /// `VaultNotInitialized`.
    #[instrument(level = "debug", skip(password, params), fields(path = %path.display()))]
    pub fn open(path: &Path, password: &str, params: &Argon2Params) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CfeError::VaultNotInitialized(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut lines = Vec::new();
        let mut foreign_records = Vec::new();

        for line in data.split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let mine = match codec::decode_line(line) {
                Some(record) => codec::unwrap(&record, password.as_bytes(), params)?,
                None => None,
            };
            match mine {
                Some(entry) => {
                    entries.push(entry);
                    lines.push(line.to_vec());
                }
                None => foreign_records.push(line.to_vec()),
            }
        }

        debug!(
            mine = entries.len(),
            foreign = foreign_records.len(),
            "loaded vault records"
        );

        Ok(Self {
            path: path.to_path_buf(),
            password: Zeroizing::new(password.to_owned()),
            params: *params,
            entries,
            lines,
            foreign_records,
        })
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Return the entry named exactly `name`, creating it if absent.
    ///
    /// A new entry gets a fresh content key and envelope salt and is
    /// persisted before this returns.  If the save fails the entry is
    /// dropped again and the error is returned.
    pub fn create(&mut self, name: &str) -> Result<&VaultEntry> {
        if let Some(idx) = self.entries.iter().position(|e| e.name == name) {
            debug!("entry already exists, returning it");
            return Ok(&self.entries[idx]);
        }

        let entry = VaultEntry::new(name);
        let record = codec::wrap(&entry, self.password.as_bytes(), &self.params)?;
        self.entries.push(entry);
        self.lines.push(codec::encode_line(&record));
        if let Err(e) = self.save() {
            self.entries.pop();
            self.lines.pop();
            return Err(e);
        }

        let idx = self.entries.len() - 1;
        Ok(&self.entries[idx])
    }

    /// Create an entry for `label` under a freshly generated remote id.
    pub fn create_for_label(&mut self, label: &str) -> Result<&VaultEntry> {
        validate_label(label)?;
        let remote_id = Uuid::new_v4().to_string();
        self.create(&VaultEntry::compose_name(label, &remote_id))
    }

    /// First entry whose name starts with `prefix`.
    ///
    /// Callers searching by label should use `find_label`, which appends
    /// the separating space so `"foo"` never matches `"foo2 <id>"`.
    pub fn find(&self, prefix: &str) -> Option<&VaultEntry> {
        self.entries.iter().find(|e| e.name.starts_with(prefix))
    }

    /// Entry stored under exactly `label`.
    pub fn find_label(&self, label: &str) -> Option<&VaultEntry> {
        self.find(&label_prefix(label))
    }

    /// Remove the first entry whose name starts with `prefix`.
    ///
    /// Returns `false` when nothing matched.  Foreign records are never
    /// touched.  If the save fails the entry is restored in place.
    pub fn delete(&mut self, prefix: &str) -> Result<bool> {
        let Some(idx) = self.entries.iter().position(|e| e.name.starts_with(prefix)) else {
            return Ok(false);
        };

        let removed = self.entries.remove(idx);
        let removed_line = self.lines.remove(idx);
        if let Err(e) = self.save() {
            self.entries.insert(idx, removed);
            self.lines.insert(idx, removed_line);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove the entry stored under exactly `label`.
    pub fn delete_label(&mut self, label: &str) -> Result<bool> {
        self.delete(&label_prefix(label))
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Rewrite the vault file: own entries first, then foreign lines.
    ///
    /// Entries are written from their cached lines, so an entry that has
    /// not changed is written back byte-for-byte.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn save(&self) -> Result<()> {
        let mut buf = Vec::new();
        for line in self.lines.iter().chain(&self.foreign_records) {
            buf.extend_from_slice(line);
            buf.push(b'\n');
        }
        write_atomic(&self.path, &buf)?;

        debug!(
            mine = self.entries.len(),
            foreign = self.foreign_records.len(),
            "saved vault"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries owned by the active password, in file order.
    pub fn entries(&self) -> &[VaultEntry] {
        &self.entries
    }

    /// Raw lines belonging to other passwords.
    pub fn foreign_records(&self) -> &[Vec<u8>] {
        &self.foreign_records
    }

    /// Labels of all own entries, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.entries.iter().map(VaultEntry::label).collect();
        labels.sort_unstable();
        labels
    }

    /// Number of own entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the active password owns no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace `path` with `content` without ever exposing a partial file.
///
/// The content goes to a per-process temp file beside `path`, is synced,
/// then renamed over the target.  On failure the temp file is removed and
/// the previous file is left intact.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(temp_name(path));

    let result = (|| -> Result<()> {
        let mut file = open_private(&tmp_path, true)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_name(path: &Path) -> String {
    format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    )
}

fn label_prefix(label: &str) -> String {
    format!("{label} ")
}

/// Open `path` for writing with owner-only permissions on Unix.
fn open_private(path: &Path, truncate: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(truncate);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PARAMS: Argon2Params = Argon2Params::minimum();

    fn fresh_vault() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault").join("cfe_vault.dat");
        assert!(VaultStore::initialize(&path).unwrap());
        (dir, path)
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, path) = fresh_vault();
        fs::write(&path, b"keep me\n").unwrap();
        assert!(!VaultStore::initialize(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"keep me\n");
    }

    #[test]
    fn open_missing_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.dat");
        assert!(matches!(
            VaultStore::open(&path, "pw", &PARAMS),
            Err(CfeError::VaultNotInitialized(p)) if p == path
        ));
    }

    #[test]
    fn failed_save_rolls_back_create() {
        let (dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();

        // Remove the directory so the temp file cannot be created.
        fs::remove_dir_all(dir.path().join("vault")).unwrap();
        assert!(store.create("a id").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn failed_save_rolls_back_delete() {
        let (dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create("a 1").unwrap();
        store.create("b 2").unwrap();
        store.create("c 3").unwrap();

        fs::remove_dir_all(dir.path().join("vault")).unwrap();
        assert!(store.delete("b ").is_err());
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a 1", "b 2", "c 3"]);
    }

    #[test]
    fn failed_save_leaves_previous_file_intact() {
        let (dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create("a 1").unwrap();
        store.create("b 2").unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the temp path makes the write fail.
        let tmp = dir.path().join("vault").join(temp_name(&path));
        fs::create_dir(&tmp).unwrap();

        assert!(store.create("c 3").is_err());
        assert!(store.delete("a ").is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(store.len(), 2);

        fs::remove_dir(&tmp).unwrap();
        let reopened = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        assert_eq!(reopened.labels(), ["a", "b"]);
    }

    #[test]
    fn unchanged_entries_are_written_back_verbatim() {
        let (_dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create("a 1").unwrap();
        fn first_line(path: &Path) -> Vec<u8> {
            let data = fs::read(path).unwrap();
            data.split(|&b| b == b'\n').next().unwrap().to_vec()
        }
        let a_line = first_line(&path);

        store.create("b 2").unwrap();
        assert_eq!(first_line(&path), a_line);
        store.delete("b ").unwrap();
        let mut only_a = a_line.clone();
        only_a.push(b'\n');
        assert_eq!(fs::read(&path).unwrap(), only_a);

        // Reopening and saving again keeps the line too.
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create("c 3").unwrap();
        assert_eq!(first_line(&path), a_line);
    }

    #[test]
    fn write_atomic_replaces_content() {
        let (dir, path) = fresh_vault();
        fs::write(&path, b"old contents that are longer\n").unwrap();
        write_atomic(&path, b"new\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new\n");
        assert_eq!(fs::read_dir(dir.path().join("vault")).unwrap().count(), 1);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let (dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create_for_label("notes.md").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path().join("vault"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["cfe_vault.dat"]);
    }

    #[cfg(unix)]
    #[test]
    fn vault_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create_for_label("notes.md").unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn create_for_label_rejects_bad_labels() {
        let (_dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        assert!(matches!(
            store.create_for_label("has space"),
            Err(CfeError::InvalidLabel(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn labels_are_sorted() {
        let (_dir, path) = fresh_vault();
        let mut store = VaultStore::open(&path, "pw", &PARAMS).unwrap();
        store.create_for_label("zeta.txt").unwrap();
        store.create_for_label("alpha.txt").unwrap();
        assert_eq!(store.labels(), ["alpha.txt", "zeta.txt"]);
        assert_eq!(store.len(), 2);
    }
}
