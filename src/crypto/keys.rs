//! Per-file content keys.
//!
//! A `ContentKey` encrypts the bytes of one uploaded file.  It is random,
//! independent of any password, and lives only inside a vault record.

use std::fmt;

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::kdf::KEY_LEN;
use crate::errors::{CfeError, Result};

/// A 32-byte symmetric key that zeroes its memory when dropped.
///
/// `Debug` never prints the key bytes and equality is constant-time.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ContentKey {
    bytes: [u8; KEY_LEN],
}

impl ContentKey {
    /// Generate a fresh key from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, failing unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CfeError::KeyDerivationFailed(format!(
                "content key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Access the raw key bytes (e.g. to pass to `encrypt`).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for ContentKey {}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_keys_differ() {
        assert_ne!(ContentKey::random(), ContentKey::random());
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(ContentKey::from_slice(&[0u8; 31]).is_err());
        assert!(ContentKey::from_slice(&[0u8; 33]).is_err());
        let key = ContentKey::from_slice(&[9u8; 32]).unwrap();
        assert_eq!(key, ContentKey::new([9u8; 32]));
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = ContentKey::new([0xAB; 32]);
        let shown = format!("{key:?}");
        assert!(!shown.contains("171"));
        assert!(!shown.to_lowercase().contains("ab"));
    }
}
