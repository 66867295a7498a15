//! `cfe list` — display the labels stored under a password.

use crate::cli::output;
use crate::cli::{prompt_password, Cli, Project};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let project = Project::from_cli(cli)?;
    project.pull_vault()?;

    let password = prompt_password()?;
    let store = project.open_vault(&password)?;

    let labels = store.labels();
    output::info(&format!("{} file(s) under this password", labels.len()));
    output::print_labels_table(&labels);

    project.audit("list", None, None);
    Ok(())
}
