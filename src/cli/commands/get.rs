//! `cfe get` — download a labelled file and decrypt it locally.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::cli::{confirm, prompt_password, Cli, Project};
use crate::crypto::decrypt;
use crate::errors::{CfeError, Result};
use crate::remote::BlobStore;

/// Execute the `get` command.
pub fn execute(cli: &Cli, label: &str, local: &Path, force: bool) -> Result<()> {
    let project = Project::from_cli(cli)?;
    project.pull_vault()?;

    // Never clobber an existing file without asking.
    if local.exists() && !force {
        output::warning(&format!("A file already exists at '{}'", local.display()));
        if !confirm("Do you want to overwrite this file?")? {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let password = prompt_password()?;
    let store = project.open_vault(&password)?;

    let entry = store
        .find_label(label)
        .ok_or_else(|| CfeError::LabelNotFound(label.to_string()))?;
    let blob_name = entry.blob_name().ok_or_else(|| {
        CfeError::CommandFailed(format!("entry for '{label}' has no remote id"))
    })?;

    let folder = project.content_folder()?;
    let sealed = project.remote.download(&blob_name, &folder)?;
    let content = decrypt(entry.content_key.as_bytes(), &sealed)?;
    fs::write(local, &content)?;

    info!(blob = %blob_name, bytes = content.len(), "downloaded file");
    project.audit("get", entry.remote_id(), None);
    output::success(&format!("Downloaded '{label}' to {}", local.display()));

    Ok(())
}
