// ## 📂 File: `src/cipher/ecb.rs`

//! src/cipher/ecb.rs
//! Single-block AES adapter (ECB, no chaining).
//!
//! Design notes:
//! - The key schedule is computed once in `initialize` and never mutated.
//! - Each block stands alone; identical `(key, block)` always gives identical output.
//! - Layering is done by the caller: chip layer first, platform layer second.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::cipher::types::{Block, KeyError, KeySize};

/// Block cipher capability consumed by the packager and unpacker.
pub trait BlockCipher {
    fn encrypt_block_in_place(&self, block: &mut Block);
    fn decrypt_block_in_place(&self, block: &mut Block);
}

/// AES key schedule for the configured key size.
#[derive(Clone)]
pub enum AesEcb {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesEcb {
    /// Build the key schedule. Fails if `key` is not exactly `size.key_len()` bytes.
    pub fn initialize(size: KeySize, key: &[u8]) -> Result<Self, KeyError> {
        let bad_len = || KeyError::InvalidLength {
            expected: size.key_len(),
            actual: key.len(),
        };

        if key.len() != size.key_len() {
            return Err(bad_len());
        }

        let cipher = match size {
            KeySize::Aes128 => AesEcb::Aes128(Aes128::new_from_slice(key).map_err(|_| bad_len())?),
            KeySize::Aes192 => AesEcb::Aes192(Aes192::new_from_slice(key).map_err(|_| bad_len())?),
            KeySize::Aes256 => AesEcb::Aes256(Aes256::new_from_slice(key).map_err(|_| bad_len())?),
        };
        Ok(cipher)
    }

    pub fn key_size(&self) -> KeySize {
        match self {
            AesEcb::Aes128(_) => KeySize::Aes128,
            AesEcb::Aes192(_) => KeySize::Aes192,
            AesEcb::Aes256(_) => KeySize::Aes256,
        }
    }
}

impl BlockCipher for AesEcb {
    #[inline]
    fn encrypt_block_in_place(&self, block: &mut Block) {
        let b = aes::Block::from_mut_slice(&mut block[..]);
        match self {
            AesEcb::Aes128(c) => c.encrypt_block(b),
            AesEcb::Aes192(c) => c.encrypt_block(b),
            AesEcb::Aes256(c) => c.encrypt_block(b),
        }
    }

    #[inline]
    fn decrypt_block_in_place(&self, block: &mut Block) {
        let b = aes::Block::from_mut_slice(&mut block[..]);
        match self {
            AesEcb::Aes128(c) => c.decrypt_block(b),
            AesEcb::Aes192(c) => c.decrypt_block(b),
            AesEcb::Aes256(c) => c.decrypt_block(b),
        }
    }
}

// Key schedules must not end up in logs.
impl std::fmt::Debug for AesEcb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesEcb({})", self.key_size())
    }
}
