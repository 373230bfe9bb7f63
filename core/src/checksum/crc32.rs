// ## 📂 File: `src/checksum/crc32.rs`

//! src/checksum/crc32.rs
//! Incremental CRC-32 accumulator.
//!
//! Design notes:
//! - `prepare → update* → finish` mirrors the per-block call pattern of the packager.
//! - Folding B1 then B2 yields the same value as folding B1‖B2 in one call.
//! - `finish` consumes the accumulator; a finished state cannot be folded again.

use crc32fast::Hasher;

/// Running CRC-32 state for one packaging run.
#[derive(Clone, Debug)]
pub struct Crc32Accumulator {
    hasher: Hasher,
    bytes: u64,
}

impl Crc32Accumulator {
    /// Accumulator in the algorithm's initial state.
    pub fn prepare() -> Self {
        Self { hasher: Hasher::new(), bytes: 0 }
    }

    /// Fold an arbitrary-length buffer into the running state.
    #[inline]
    pub fn update(&mut self, buf: &[u8]) {
        self.hasher.update(buf);
        self.bytes += buf.len() as u64;
    }

    /// Number of bytes folded so far.
    pub fn bytes_folded(&self) -> u64 {
        self.bytes
    }

    /// Apply the final complement and return the checksum.
    pub fn finish(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Crc32Accumulator {
    fn default() -> Self {
        Self::prepare()
    }
}

/// Single-shot CRC-32 over `data`.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// CRC-32 of zero bytes.
pub const CRC32_EMPTY: u32 = 0x0000_0000;
