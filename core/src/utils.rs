use std::fmt;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use num_enum::TryFromPrimitive;

use crate::constants::{BLOCK_LEN, PAD_BYTE};

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

/// Fill up to `buf.len()` bytes from `r`, stopping early only at end-of-input.
///
/// Returns the number of bytes read (0 means clean EOF).
/// Short reads are retried and `Interrupted` is not treated as a failure, so a
/// count below `buf.len()` always means the input is exhausted.
pub fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut off = 0;

    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(off)
}

/// Pad `block[filled..]` with `PAD_BYTE`. Returns how many bytes were padded.
pub fn pad_block(block: &mut [u8; BLOCK_LEN], filled: usize) -> usize {
    debug_assert!(filled <= BLOCK_LEN);
    block[filled..].fill(PAD_BYTE);
    BLOCK_LEN - filled
}

/// Strip trailing NUL and space bytes from a fixed-width text field.
pub fn trim_fixed_field(b: &[u8]) -> &[u8] {
    let end = b
        .iter()
        .rposition(|&c| c != 0 && c != b' ')
        .map_or(0, |i| i + 1);
    &b[..end]
}

/// True when `a` and `b` resolve to the same file on disk.
///
/// Symlinks and `..` components are resolved through `canonicalize`. A path that
/// does not exist yet cannot alias anything, so only the literal comparison applies.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
