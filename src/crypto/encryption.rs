//! AES-256-GCM authenticated encryption.
//!
//! Used twice over: once to seal each vault record under its
//! password-derived envelope key, and once to seal uploaded file content
//! under the entry's content key.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{CfeError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// A fresh random nonce is generated per call, so encrypting the same
/// plaintext twice never yields the same bytes.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CfeError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CfeError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Any failure (short input, bad key length, tag mismatch) collapses to
/// `DecryptionFailed` so callers cannot distinguish the cause.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(CfeError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CfeError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CfeError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_returns_plaintext() {
        let key = [7u8; 32];
        let sealed = encrypt(&key, b"quarterly report").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 16 + TAG_LEN);
        assert_eq!(decrypt(&key, &sealed).unwrap(), b"quarterly report");
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = [7u8; 32];
        let a = encrypt(&key, b"same").unwrap();
        let b = encrypt(&key, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt(&[1u8; 32], b"data").unwrap();
        assert!(matches!(
            decrypt(&[2u8; 32], &sealed),
            Err(CfeError::DecryptionFailed)
        ));
    }

    #[test]
    fn truncated_input_fails() {
        let sealed = encrypt(&[1u8; 32], b"data").unwrap();
        assert!(decrypt(&[1u8; 32], &sealed[..NONCE_LEN + 3]).is_err());
        assert!(decrypt(&[1u8; 32], &[]).is_err());
    }

    #[test]
    fn bad_key_length_is_rejected() {
        assert!(matches!(
            encrypt(&[0u8; 16], b"data"),
            Err(CfeError::EncryptionFailed(_))
        ));
    }
}
