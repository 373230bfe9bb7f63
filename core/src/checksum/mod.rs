//! checksum/mod.rs
//! Streaming checksum over the padded plaintext.
//!
//! Notes:
//! - The algorithm is pinned: devices in the field recompute it after decryption
//!   and compare against the header, so changing it breaks every deployed bootloader.
//! - Standard reflected CRC-32 (IEEE 802.3): poly 0xEDB88320, init 0xFFFFFFFF,
//!   final xor 0xFFFFFFFF. Check value for "123456789" is 0xCBF43926.

pub mod crc32;

pub use crc32::*;
