use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::Argon2Params;
use crate::errors::{CfeError, Result};
use crate::remote::FolderPath;

/// Project-level configuration, loaded from `.cfe.toml`.
///
/// Every field has a sensible default so CFE works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the local vault file.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// File name of the vault inside `vault_dir`.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Root directory of the blob store.
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    /// Top-level remote folder for encrypted file content.
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    /// Sub-folder of `remote_root` holding the vault backup.
    #[serde(default = "default_remote_meta")]
    pub remote_meta: String,

    /// Files this size or larger are refused by `add` (default: 1 GiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    "vault".to_string()
}

fn default_vault_file() -> String {
    "cfe_vault.dat".to_string()
}

fn default_remote_dir() -> String {
    ".cfe-remote".to_string()
}

fn default_remote_root() -> String {
    ".cfe".to_string()
}

fn default_remote_meta() -> String {
    "meta".to_string()
}

fn default_max_file_size() -> u64 {
    1 << 30 // 1 GiB
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            vault_file: default_vault_file(),
            remote_dir: default_remote_dir(),
            remote_root: default_remote_root(),
            remote_meta: default_remote_meta(),
            max_file_size: default_max_file_size(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".cfe.toml";

    /// Load settings from `<project_dir>/.cfe.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CfeError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Build the full path to the local vault file.
    ///
    /// Example: `project_dir/vault/cfe_vault.dat`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir).join(&self.vault_file)
    }

    /// Build the full path to the blob store root.
    pub fn remote_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.remote_dir)
    }

    /// Remote folder holding encrypted file content.
    pub fn content_folder(&self) -> Result<FolderPath> {
        FolderPath::new([self.remote_root.as_str()])
            .map_err(|e| CfeError::ConfigError(format!("remote_root: {e}")))
    }

    /// Remote folder holding the vault backup.
    pub fn meta_folder(&self) -> Result<FolderPath> {
        self.content_folder()?
            .child(&self.remote_meta)
            .map_err(|e| CfeError::ConfigError(format!("remote_meta: {e}")))
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
