// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding utilities.
//!
//! Design notes:
//! - Deserializes a fixed 48‑byte buffer into a `ReleaseHeader`.
//! - Field order must match `encode.rs` exactly.
//! - Validation runs after decoding so malformed images are rejected before
//!   anyone tries to decrypt them.

use crate::constants::DEVELOPER_TAG_LEN;
use crate::headers::types::{HeaderError, ReleaseHeader};

/// Deserialize a 48‑byte little‑endian header. Extra trailing bytes are ignored.
#[inline]
pub fn decode_header_le(buf: &[u8]) -> Result<ReleaseHeader, HeaderError> {
    if buf.len() < ReleaseHeader::LEN {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: ReleaseHeader::LEN });
    }

    let mut i = 0usize;
    #[inline] fn get_u8(buf: &[u8], i: &mut usize) -> u8 { let v = buf[*i]; *i += 1; v }
    #[inline] fn get_u16(buf: &[u8], i: &mut usize) -> u16 { let v = u16::from_le_bytes([buf[*i], buf[*i + 1]]); *i += 2; v }
    #[inline] fn get_u32(buf: &[u8], i: &mut usize) -> u32 {
        let v = u32::from_le_bytes([buf[*i], buf[*i + 1], buf[*i + 2], buf[*i + 3]]); *i += 4; v
    }
    #[inline] fn get_bytes<const N: usize>(buf: &[u8], i: &mut usize) -> [u8; N] {
        let mut dst = [0u8; N]; dst.copy_from_slice(&buf[*i..*i + N]); *i += N; dst
    }

    let h = ReleaseHeader {
        magic:             get_bytes::<4>(buf, &mut i),                 // 0..4
        release_year:      get_u16(buf, &mut i),                        // 4..6
        release_month:     get_u8(buf, &mut i),                         // 6
        release_day:       get_u8(buf, &mut i),                         // 7
        release_hour:      get_u8(buf, &mut i),                         // 8
        release_minute:    get_u8(buf, &mut i),                         // 9
        version_major:     get_u8(buf, &mut i),                         // 10
        version_minor:     get_u8(buf, &mut i),                         // 11
        version_revision:  get_u8(buf, &mut i),                         // 12
        developer_tag:     get_bytes::<DEVELOPER_TAG_LEN>(buf, &mut i), // 13..40
        firmware_length:   get_u32(buf, &mut i),                        // 40..44
        firmware_checksum: get_u32(buf, &mut i),                        // 44..48
    };

    debug_assert_eq!(i, ReleaseHeader::LEN);

    h.validate()?;

    Ok(h)
}
