//! Vault module — the encrypted label-to-file index.
//!
//! This module provides:
//! - `VaultEntry` and label validation (`entry`)
//! - Per-record envelope encryption and the line format (`codec`)
//! - High-level `VaultStore` for opening and mutating a vault (`store`)

pub mod codec;
pub mod entry;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{validate_label, VaultEntry};
pub use store::VaultStore;
