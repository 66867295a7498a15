use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in CFE.
///
/// A record that does not decrypt under the active password is not an
/// error; the vault routes it to its foreign records instead.  Likewise a
/// lookup with no match is an `Option::None` or `false`, not a variant here.
#[derive(Debug, Error)]
pub enum CfeError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault not initialized at {0} — run `cfe init` first")]
    VaultNotInitialized(PathBuf),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("No metadata found for '{0}'")]
    LabelNotFound(String),

    #[error("Already an entry for '{0}'")]
    LabelAlreadyExists(String),

    // --- Remote storage errors ---
    #[error("No such file on remote: {name} in /{folder}")]
    RemoteBlobNotFound { name: String, folder: String },

    #[error("Remote storage error: {0}")]
    RemoteError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("File exceeds the {limit} byte upload limit: {path}")]
    FileTooLarge { path: PathBuf, limit: u64 },

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for CFE results.
pub type Result<T> = std::result::Result<T, CfeError>;
