//! `cfe delete` — remove a labelled file from remote storage and the vault.

use crate::cli::output;
use crate::cli::{confirm, prompt_password, Cli, Project};
use crate::errors::{CfeError, Result};
use crate::remote::BlobStore;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, label: &str, force: bool) -> Result<()> {
    let project = Project::from_cli(cli)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete '{label}' from remote storage?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    project.pull_vault()?;
    let password = prompt_password()?;
    let mut store = project.open_vault(&password)?;

    let entry = store
        .find_label(label)
        .ok_or_else(|| CfeError::LabelNotFound(label.to_string()))?
        .clone();

    // 1. Remove the remote blob first; a missing blob aborts the command.
    if let Some(blob_name) = entry.blob_name() {
        let folder = project.content_folder()?;
        project.remote.delete(&blob_name, &folder)?;
    }

    // 2. Drop the entry and back up the rewritten vault.
    if !store.delete_label(label)? {
        return Err(CfeError::LabelNotFound(label.to_string()));
    }
    project.push_vault()?;

    project.audit("delete", entry.remote_id(), None);
    output::success(&format!("Deleted '{label}'"));

    Ok(())
}
