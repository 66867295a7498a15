//! `cfe logout` — remove the local vault directory.
//!
//! Remote blobs and the remote vault backup are left in place; a later
//! `cfe init` pulls the vault back down.

use std::fs;

use crate::cli::output;
use crate::cli::{confirm, Cli, Project};
use crate::errors::{CfeError, Result};

/// Execute the `logout` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let project = Project::from_cli(cli)?;
    let vault_dir = project.vault_dir();

    // Removing the vault directory must never take the project with it.
    if matches!(project.settings.vault_dir.trim(), "" | "." | "..") {
        return Err(CfeError::ConfigError(format!(
            "refusing to remove vault_dir '{}'",
            project.settings.vault_dir
        )));
    }

    if !vault_dir.exists() {
        output::info("No local vault to remove.");
        return Ok(());
    }

    if !force && !confirm(&format!("Remove local vault at {}?", vault_dir.display()))? {
        output::info("Cancelled.");
        return Ok(());
    }

    fs::remove_dir_all(vault_dir)?;
    output::success("You have logged out from cfe.");

    Ok(())
}
