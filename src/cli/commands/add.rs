//! `cfe add` — encrypt a local file and upload it under a label.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Project};
use crate::crypto::encrypt;
use crate::errors::{CfeError, Result};
use crate::remote::{BlobStore, FolderPath};
use crate::vault::{validate_label, VaultStore};

/// Execute the `add` command.
pub fn execute(cli: &Cli, local: &Path, label: &str) -> Result<()> {
    let project = Project::from_cli(cli)?;
    validate_label(label)?;

    // 1. Check the source before asking for anything.
    let metadata = fs::metadata(local).map_err(|e| {
        CfeError::CommandFailed(format!("cannot read {}: {e}", local.display()))
    })?;
    if !metadata.is_file() {
        return Err(CfeError::CommandFailed(format!(
            "{} is not a regular file",
            local.display()
        )));
    }
    if metadata.len() >= project.settings.max_file_size {
        return Err(CfeError::FileTooLarge {
            path: local.to_path_buf(),
            limit: project.settings.max_file_size,
        });
    }

    // 2. Sync, then open the vault under the (confirmed) password.
    project.pull_vault()?;
    let password = prompt_new_password()?;
    let mut store = project.open_vault(&password)?;

    if store.find_label(label).is_some() {
        return Err(CfeError::LabelAlreadyExists(label.to_string()));
    }

    // 3. Record the entry, then encrypt and upload the content under it.
    let content = fs::read(local)?;
    let entry = store.create_for_label(label)?.clone();
    let (Some(remote_id), Some(blob_name)) = (entry.remote_id(), entry.blob_name()) else {
        return Err(CfeError::CommandFailed(
            "new entry has no remote id".to_string(),
        ));
    };

    let sealed = encrypt(entry.content_key.as_bytes(), &content)?;
    let folder = project.content_folder()?;
    upload_or_forget(&mut store, &project.remote, &entry.name, &blob_name, &sealed, &folder)?;

    // 4. Back up the updated vault.
    project.push_vault()?;

    info!(blob = %blob_name, bytes = content.len(), "uploaded file");
    project.audit(
        "add",
        Some(remote_id),
        Some(&format!("{} bytes", content.len())),
    );
    output::success(&format!("Uploaded '{label}' as {blob_name}"));

    Ok(())
}

/// Upload `sealed`, dropping the vault entry `name` again if that fails so
/// the vault never points at a missing blob.  The upload error is the one
/// returned, even when the entry cannot be removed.
fn upload_or_forget(
    store: &mut VaultStore,
    remote: &impl BlobStore,
    name: &str,
    blob_name: &str,
    sealed: &[u8],
    folder: &FolderPath,
) -> Result<()> {
    let Err(e) = remote.upload(blob_name, sealed, folder) else {
        return Ok(());
    };

    warn!(blob = %blob_name, error = %e, "upload failed, removing vault entry");
    if let Err(rollback) = store.delete(name) {
        warn!(error = %rollback, "could not remove vault entry after failed upload");
    }
    Err(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Argon2Params;
    use tempfile::TempDir;

    /// A remote that rejects every upload.
    struct Offline;

    impl BlobStore for Offline {
        fn upload(&self, _: &str, _: &[u8], _: &FolderPath) -> Result<()> {
            Err(CfeError::RemoteError("offline".into()))
        }

        fn download(&self, name: &str, folder: &FolderPath) -> Result<Vec<u8>> {
            Err(CfeError::RemoteBlobNotFound {
                name: name.into(),
                folder: folder.to_string(),
            })
        }

        fn delete(&self, name: &str, folder: &FolderPath) -> Result<()> {
            Err(CfeError::RemoteBlobNotFound {
                name: name.into(),
                folder: folder.to_string(),
            })
        }
    }

    fn open_store(dir: &TempDir) -> VaultStore {
        let path = dir.path().join("vault").join("cfe_vault.dat");
        VaultStore::initialize(&path).unwrap();
        VaultStore::open(&path, "password-one", &Argon2Params::minimum()).unwrap()
    }

    #[test]
    fn failed_upload_removes_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let name = store.create_for_label("notes").unwrap().name.clone();
        let folder = FolderPath::new([".cfe"]).unwrap();

        let err = upload_or_forget(&mut store, &Offline, &name, "x.enc", b"sealed", &folder)
            .unwrap_err();
        assert!(matches!(err, CfeError::RemoteError(_)));
        assert!(store.find_label("notes").is_none());
    }

    #[test]
    fn failed_rollback_keeps_upload_error() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let name = store.create_for_label("notes").unwrap().name.clone();
        let folder = FolderPath::new([".cfe"]).unwrap();

        // The vault can no longer be saved, so the rollback fails too.
        std::fs::remove_dir_all(dir.path().join("vault")).unwrap();

        let err = upload_or_forget(&mut store, &Offline, &name, "x.enc", b"sealed", &folder)
            .unwrap_err();
        assert!(
            matches!(&err, CfeError::RemoteError(msg) if msg == "offline"),
            "got {err:?}"
        );
    }
}
