//! src/cipher/keys.rs
//! Key text → key bytes.
//!
//! Accepted forms:
//! - `hex:<hex digits>` decodes to exactly `size.key_len()` bytes.
//! - `text:<ascii>` is zero-padded to the key length, the way the legacy build
//!   initialized its key arrays from string literals ("KEYFORCHIP" → 16 bytes).
//! - anything without a prefix is read as hex.

use crate::cipher::types::{KeyError, KeySize};

pub const HEX_PREFIX: &str = "hex:";
pub const TEXT_PREFIX: &str = "text:";

pub fn parse_key(key_text: &str, size: KeySize) -> Result<Vec<u8>, KeyError> {
    if let Some(text) = key_text.strip_prefix(TEXT_PREFIX) {
        return key_from_text(text.as_bytes(), size);
    }

    let digits = key_text.strip_prefix(HEX_PREFIX).unwrap_or(key_text).trim();
    let key = hex::decode(digits).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
    if key.len() != size.key_len() {
        return Err(KeyError::InvalidLength { expected: size.key_len(), actual: key.len() });
    }
    Ok(key)
}

/// Zero-pad `text` to the key length.
pub fn key_from_text(text: &[u8], size: KeySize) -> Result<Vec<u8>, KeyError> {
    let len = size.key_len();
    if text.len() > len {
        return Err(KeyError::TextTooLong { max: len, actual: text.len() });
    }
    let mut key = vec![0u8; len];
    key[..text.len()].copy_from_slice(text);
    Ok(key)
}
