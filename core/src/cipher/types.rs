// ## 📂 File: `src/cipher/types.rs`

use std::fmt;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::{key_lens, BLOCK_LEN};
use crate::utils::enum_name_or_hex;

/// One cipher block. The array type carries the length contract.
pub type Block = [u8; BLOCK_LEN];

/// AES variant, selected by configuration. Both layers use the same size.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySize {
    Aes128 = key_lens::AES128,
    Aes192 = key_lens::AES192,
    Aes256 = key_lens::AES256,
}

impl KeySize {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        self as u8 as usize
    }

    /// Map a raw key length to its AES variant.
    pub fn from_key_len(len: usize) -> Result<Self, KeyError> {
        u8::try_from(len)
            .ok()
            .and_then(|raw| KeySize::try_from_primitive(raw).ok())
            .ok_or(KeyError::UnsupportedLength { actual: len })
    }
}

impl Default for KeySize {
    fn default() -> Self {
        KeySize::Aes128
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeySize::Aes128 => "AES-128",
            KeySize::Aes192 => "AES-192",
            KeySize::Aes256 => "AES-256",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key length does not match the configured key size.
    InvalidLength { expected: usize, actual: usize },

    /// Length is not one of the AES key sizes.
    UnsupportedLength { actual: usize },

    /// Text key longer than the key length.
    TextTooLong { max: usize, actual: usize },

    /// Hex key text did not decode.
    InvalidHex(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KeyError::*;
        match self {
            InvalidLength { expected, actual } =>
                write!(f, "invalid key length: expected={}, actual={}", expected, actual),
            UnsupportedLength { actual } => match u8::try_from(*actual) {
                Ok(raw) => write!(f, "unsupported key size: {}", enum_name_or_hex::<KeySize>(raw)),
                Err(_) => write!(f, "unsupported key size: {} bytes", actual),
            },
            TextTooLong { max, actual } =>
                write!(f, "text key too long: {} > {} bytes", actual, max),
            InvalidHex(msg) =>
                write!(f, "invalid hex key: {}", msg),
        }
    }
}

impl std::error::Error for KeyError {}
