// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding utilities.
//!
//! Design notes:
//! - Serializes `ReleaseHeader` into a fixed 48‑byte buffer in little‑endian order.
//! - Every field has a fixed offset; struct layout and compiler padding play no part.
//! - Encoding cannot fail: all field widths are enforced by the struct types.

use crate::headers::types::ReleaseHeader;
use crate::constants::HEADER_LEN;

/// Serialize a `ReleaseHeader` into a 48‑byte buffer.
#[inline]
pub fn encode_header_le(h: &ReleaseHeader) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    let mut i = 0usize;

    fn put_u8(out: &mut [u8], i: &mut usize, v: u8) {
        out[*i] = v;
        *i += 1;
    }
    fn put_u16(out: &mut [u8], i: &mut usize, v: u16) {
        out[*i..*i + 2].copy_from_slice(&v.to_le_bytes());
        *i += 2;
    }
    fn put_u32(out: &mut [u8], i: &mut usize, v: u32) {
        out[*i..*i + 4].copy_from_slice(&v.to_le_bytes());
        *i += 4;
    }
    fn put_bytes(out: &mut [u8], i: &mut usize, b: &[u8]) {
        out[*i..*i + b.len()].copy_from_slice(b);
        *i += b.len();
    }

    put_bytes(&mut out, &mut i, &h.magic);             // 0..4   magic
    put_u16(&mut out, &mut i, h.release_year);         // 4..6   year
    put_u8(&mut out, &mut i, h.release_month);         // 6      month
    put_u8(&mut out, &mut i, h.release_day);           // 7      day
    put_u8(&mut out, &mut i, h.release_hour);          // 8      hour
    put_u8(&mut out, &mut i, h.release_minute);        // 9      minute
    put_u8(&mut out, &mut i, h.version_major);         // 10     version major
    put_u8(&mut out, &mut i, h.version_minor);         // 11     version minor
    put_u8(&mut out, &mut i, h.version_revision);      // 12     version revision
    put_bytes(&mut out, &mut i, &h.developer_tag);     // 13..40 developer tag
    put_u32(&mut out, &mut i, h.firmware_length);      // 40..44 payload length
    put_u32(&mut out, &mut i, h.firmware_checksum);    // 44..48 CRC-32 of padded plaintext

    debug_assert_eq!(i, HEADER_LEN, "encoding wrote incorrect length");

    out
}
