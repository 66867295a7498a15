//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{CfeError, Result};
use crate::remote::{BlobStore, FolderPath, LocalBlobStore};
use crate::vault::store::write_atomic;
use crate::vault::VaultStore;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable that supplies the master password non-interactively.
const PASSWORD_ENV: &str = "CFE_PASSWORD";

/// CFE CLI: client-side encrypted file storage.
#[derive(Parser)]
#[command(
    name = "cfe",
    about = "Client-side encrypted file storage with a password-gated vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Local vault directory (default: from .cfe.toml, else "vault")
    #[arg(long, env = "CFE_VAULT_DIR", global = true)]
    pub vault_dir: Option<String>,

    /// Blob store root directory (default: from .cfe.toml, else ".cfe-remote")
    #[arg(long, env = "CFE_REMOTE_DIR", global = true)]
    pub remote_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Initialize the local vault and pull the remote copy if one exists
    #[command(visible_alias = "login")]
    Init,

    /// Encrypt a local file and upload it under a label
    Add {
        /// Path of the local file to upload
        local: PathBuf,
        /// Label to store the file under (no spaces)
        label: String,
    },

    /// Download a labelled file and decrypt it to a local path
    Get {
        /// Label the file was stored under
        label: String,
        /// Destination path for the decrypted file
        local: PathBuf,
        /// Overwrite the destination without asking
        #[arg(short, long)]
        force: bool,
    },

    /// List the labels visible to a password
    List,

    /// Delete a labelled file from remote storage and the vault
    Delete {
        /// Label of the file to delete
        label: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Remove the local vault directory
    Logout {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Project context shared by commands
// ---------------------------------------------------------------------------

/// Resolved settings plus the paths and remote store derived from them.
pub struct Project {
    pub settings: Settings,
    pub vault_path: PathBuf,
    pub remote: LocalBlobStore,
}

impl Project {
    /// Load `.cfe.toml` from the working directory and apply CLI overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd, cli)
    }

    /// Same as `from_cli` with an explicit project directory.
    pub fn load(project_dir: &Path, cli: &Cli) -> Result<Self> {
        let mut settings = Settings::load(project_dir)?;
        if let Some(dir) = &cli.vault_dir {
            settings.vault_dir.clone_from(dir);
        }
        if let Some(dir) = &cli.remote_dir {
            settings.remote_dir.clone_from(dir);
        }

        let vault_path = settings.vault_path(project_dir);
        let remote = LocalBlobStore::new(settings.remote_path(project_dir));
        Ok(Self {
            settings,
            vault_path,
            remote,
        })
    }

    /// Directory holding the local vault file (and the audit log).
    pub fn vault_dir(&self) -> &Path {
        self.vault_path.parent().unwrap_or(Path::new("."))
    }

    /// Remote folder for encrypted file content.
    pub fn content_folder(&self) -> Result<FolderPath> {
        self.settings.content_folder()
    }

    /// Open the local vault with the configured KDF cost.
    pub fn open_vault(&self, password: &str) -> Result<VaultStore> {
        VaultStore::open(&self.vault_path, password, &self.settings.argon2_params())
    }

    /// Overwrite the local vault with the remote backup, if there is one.
    ///
    /// Does nothing when the vault has never been initialized locally,
    /// so `open_vault` can report that instead.  Returns `true` when a
    /// remote copy was pulled.
    pub fn pull_vault(&self) -> Result<bool> {
        if !self.vault_path.exists() {
            return Ok(false);
        }
        let meta = self.settings.meta_folder()?;
        match self.remote.download(&self.settings.vault_file, &meta) {
            Ok(content) => {
                write_atomic(&self.vault_path, &content)?;
                debug!(folder = %meta, "pulled remote vault copy");
                Ok(true)
            }
            Err(CfeError::RemoteBlobNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Push the local vault file to the remote backup location.
    pub fn push_vault(&self) -> Result<()> {
        let meta = self.settings.meta_folder()?;
        let content = std::fs::read(&self.vault_path)?;
        self.remote
            .replace(&self.settings.vault_file, Some(content.as_slice()), &meta)?;
        debug!(folder = %meta, "pushed vault copy");
        Ok(())
    }

    /// Record an operation in the audit log (no-op without `audit-log`).
    pub fn audit(&self, op: &str, blob_id: Option<&str>, details: Option<&str>) {
        #[cfg(feature = "audit-log")]
        crate::audit::log_audit(self.vault_dir(), op, blob_id, details);

        #[cfg(not(feature = "audit-log"))]
        let _ = (op, blob_id, details);
    }
}

// ---------------------------------------------------------------------------
// Password prompts
// ---------------------------------------------------------------------------

/// Get the vault password, trying in order:
/// 1. `CFE_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .interact()
        .map_err(|e| CfeError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a password with confirmation (used when adding files).
///
/// A mistyped password here would file the new entry under a password
/// nobody knows, so it must be entered twice.  Also respects
/// `CFE_PASSWORD`.  Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        check_password_len(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Enter password for encryption")
            .with_confirmation("Confirm your password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| CfeError::CommandFailed(format!("password prompt: {e}")))?;
        let password = Zeroizing::new(password);

        if let Err(e) = check_password_len(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn check_password_len(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CfeError::CommandFailed(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Ask a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CfeError::CommandFailed(format!("confirm prompt: {e}")))
}
