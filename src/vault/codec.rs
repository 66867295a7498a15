//! Entry codec: vault records and their on-disk lines.
//!
//! A record is one `VaultEntry` sealed under a key derived from the
//! master password and the entry's own salt:
//!
//! ```text
//! record    = [envelope_salt: 16 bytes][nonce: 12 bytes][ciphertext + tag]
//! plaintext = [CFE1: 4 bytes][name_len: u16 LE][name][key_len: u16 LE][content_key]
//! ```
//!
//! - **Marker** (`CFE1`): positively identifies a well-formed record after
//!   decryption.
//! - **Length prefixes**: the name may contain any byte a label allows
//!   (commas included) without desynchronizing the parse.
//!
//! In the vault file each record is stored as one line of standard base64,
//! since raw salts and ciphertexts can contain the newline byte.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::entry::VaultEntry;
use crate::crypto::{decrypt, derive_key, encrypt, Argon2Params, ContentKey, SALT_LEN};
use crate::errors::{CfeError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Marker at the start of every decrypted record.
const MARKER: &[u8; 4] = b"CFE1";

/// Size of each length prefix.
const LEN_PREFIX: usize = 2;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Seal `entry` under `password`.
///
/// Returns `envelope_salt || encrypt(derive_key(password, salt), plaintext)`.
/// Each call draws a fresh AEAD nonce, so callers wrap an entry once and
/// keep the resulting record rather than re-wrapping on every save.
pub fn wrap(entry: &VaultEntry, password: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
    let plaintext = Zeroizing::new(encode_plaintext(entry)?);
    let key = Zeroizing::new(derive_key(password, &entry.envelope_salt, params)?);
    let ciphertext = encrypt(&key[..], &plaintext)?;

    let mut record = Vec::with_capacity(SALT_LEN + ciphertext.len());
    record.extend_from_slice(&entry.envelope_salt);
    record.extend_from_slice(&ciphertext);
    Ok(record)
}

/// Try to open `record` with `password`.
///
/// `Ok(None)` means "not mine": the record is too short, fails
/// authentication, or does not parse as a canonical plaintext.  That is
/// the normal outcome for records written under other passwords.  Only an
/// unusable KDF configuration is reported as an error, because it would
/// otherwise disown every record in the file.
pub fn unwrap(
    record: &[u8],
    password: &[u8],
    params: &Argon2Params,
) -> Result<Option<VaultEntry>> {
    if record.len() <= SALT_LEN {
        return Ok(None);
    }
    let (salt, ciphertext) = record.split_at(SALT_LEN);
    let key = Zeroizing::new(derive_key(password, salt, params)?);

    let plaintext = match decrypt(&key[..], ciphertext) {
        Ok(p) => Zeroizing::new(p),
        Err(_) => return Ok(None),
    };

    let Some((name, content_key)) = decode_plaintext(&plaintext) else {
        return Ok(None);
    };

    let mut envelope_salt = [0u8; SALT_LEN];
    envelope_salt.copy_from_slice(salt);

    Ok(Some(VaultEntry {
        name,
        content_key,
        envelope_salt,
    }))
}

// ---------------------------------------------------------------------------
// Canonical plaintext
// ---------------------------------------------------------------------------

/// Serialize an entry to its canonical plaintext.
fn encode_plaintext(entry: &VaultEntry) -> Result<Vec<u8>> {
    let name = entry.name.as_bytes();
    let key = entry.content_key.as_bytes();

    let name_len = u16::try_from(name.len()).map_err(|_| {
        CfeError::InvalidLabel(format!(
            "entry name is {} bytes, limit is {}",
            name.len(),
            u16::MAX
        ))
    })?;
    // A content key is always 32 bytes.
    let key_len = key.len() as u16;

    let mut buf = Vec::with_capacity(MARKER.len() + 2 * LEN_PREFIX + name.len() + key.len());
    buf.extend_from_slice(MARKER);
    buf.extend_from_slice(&name_len.to_le_bytes());
    buf.extend_from_slice(name);
    buf.extend_from_slice(&key_len.to_le_bytes());
    buf.extend_from_slice(key);
    Ok(buf)
}

/// Parse a canonical plaintext, returning `None` on any deviation.
fn decode_plaintext(data: &[u8]) -> Option<(String, ContentKey)> {
    let (marker, rest) = split_checked(data, MARKER.len())?;
    if !bool::from(marker.ct_eq(MARKER)) {
        return None;
    }

    let (name_bytes, rest) = read_field(rest)?;
    let (key_bytes, rest) = read_field(rest)?;
    if !rest.is_empty() {
        return None;
    }

    let name = String::from_utf8(name_bytes.to_vec()).ok()?;
    let content_key = ContentKey::from_slice(key_bytes).ok()?;
    Some((name, content_key))
}

/// Read one `u16 LE` length-prefixed field.
fn read_field(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let (len_bytes, rest) = split_checked(data, LEN_PREFIX)?;
    let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
    split_checked(rest, len)
}

fn split_checked(data: &[u8], mid: usize) -> Option<(&[u8], &[u8])> {
    (data.len() >= mid).then(|| data.split_at(mid))
}

// ---------------------------------------------------------------------------
// File lines
// ---------------------------------------------------------------------------

/// Encode a record as a vault file line (without the trailing newline).
pub fn encode_line(record: &[u8]) -> Vec<u8> {
    BASE64.encode(record).into_bytes()
}

/// Decode a vault file line back into record bytes.
///
/// Returns `None` for lines that are not base64; the store keeps those
/// verbatim as foreign records.
pub fn decode_line(line: &[u8]) -> Option<Vec<u8>> {
    BASE64.decode(line).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
