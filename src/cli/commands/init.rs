//! `cfe init` — create the local vault file and sync it from remote.

use crate::cli::output;
use crate::cli::{Cli, Project};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let project = Project::from_cli(cli)?;

    // 1. Create an empty vault file, or keep the one that is there.
    let created = VaultStore::initialize(&project.vault_path)?;
    if created {
        output::info(&format!(
            "Created vault at {}",
            project.vault_path.display()
        ));
    }

    // 2. A remote copy always wins over the local one.
    if project.pull_vault()? {
        output::info("Pulled the vault from remote storage.");
    }

    project.audit("init", None, Some(if created { "created" } else { "refreshed" }));

    output::success("Vault ready.");
    output::tip("Run `cfe add <local> <label>` to upload a file.");
    output::tip("Run `cfe list` to see the files stored under a password.");

    Ok(())
}
