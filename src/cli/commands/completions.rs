//! `cfe completions` — generate shell completion scripts.
//!
//! Usage:
//!   cfe completions bash > ~/.bash_completion.d/cfe
//!   cfe completions zsh

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

/// Render the completion script for `shell` into `out`.
fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cfe", out);
    out.flush()?;
    Ok(())
}
