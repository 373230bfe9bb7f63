//! src/release/unpack.rs
//! Downstream side of the release image.
//!
//! Two consumers exist:
//! - the distribution platform, which holds only the platform key and peels the
//!   outer layer before shipping the image to a device;
//! - the device (or a bench verification tool), which removes the remaining
//!   layer(s) and checks the CRC-32 against the header.

use std::io::{Read, Write};

use crate::checksum::Crc32Accumulator;
use crate::cipher::{Block, BlockCipher};
use crate::constants::{BLOCK_LEN, HEADER_LEN};
use crate::headers::{decode_header_le, encode_header_le, ReleaseHeader};
use crate::types::{IoOp, ReleaseError};
use crate::utils::read_exact_or_eof;

/// Read and validate the 48-byte header at the current position.
pub fn read_release_header<R: Read>(reader: &mut R) -> Result<ReleaseHeader, ReleaseError> {
    let mut buf = [0u8; HEADER_LEN];
    let n = read_exact_or_eof(reader, &mut buf).map_err(|e| ReleaseError::io(IoOp::Read, e))?;
    Ok(decode_header_le(&buf[..n])?)
}

/// Strip the platform (outer) layer. The output keeps the header unchanged and
/// is still encrypted under the chip key.
pub fn peel_platform_layer<R: Read, W: Write, C: BlockCipher + ?Sized>(
    mut reader: R,
    mut writer: W,
    platform: &C,
) -> Result<ReleaseHeader, ReleaseError> {
    let header = read_release_header(&mut reader)?;
    writer
        .write_all(&encode_header_le(&header))
        .map_err(|e| ReleaseError::io(IoOp::WriteHeader, e))?;

    for_each_block(&mut reader, &header, |block| {
        platform.decrypt_block_in_place(block);
        writer.write_all(block).map_err(|e| ReleaseError::io(IoOp::Write, e))
    })?;

    writer.flush().map_err(|e| ReleaseError::io(IoOp::Close, e))?;
    log::info!("[UNPACK] peeled platform layer from {} blocks", header.block_count());
    Ok(header)
}

/// Decrypt the payload through `layers` (outermost first), stream the padded
/// plaintext to `writer`, and check it against the header CRC-32.
///
/// For a full release image pass `[platform, chip]`; for a peeled image pass `[chip]`.
pub fn unpack_release<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    layers: &[&dyn BlockCipher],
) -> Result<ReleaseHeader, ReleaseError> {
    let header = read_release_header(&mut reader)?;
    let mut crc = Crc32Accumulator::prepare();

    for_each_block(&mut reader, &header, |block| {
        for layer in layers {
            layer.decrypt_block_in_place(block);
        }
        crc.update(block);
        writer.write_all(block).map_err(|e| ReleaseError::io(IoOp::Write, e))
    })?;

    let actual = crc.finish();
    if actual != header.firmware_checksum {
        return Err(ReleaseError::ChecksumMismatch { expected: header.firmware_checksum, actual });
    }

    writer.flush().map_err(|e| ReleaseError::io(IoOp::Close, e))?;
    log::info!("[UNPACK] {} blocks verified, crc32=0x{:08x}", header.block_count(), actual);
    Ok(header)
}

/// Feed exactly `header.block_count()` payload blocks to `f`.
fn for_each_block<R: Read>(
    reader: &mut R,
    header: &ReleaseHeader,
    mut f: impl FnMut(&mut Block) -> Result<(), ReleaseError>,
) -> Result<(), ReleaseError> {
    let mut block: Block = [0u8; BLOCK_LEN];
    let mut seen: u64 = 0;

    for _ in 0..header.block_count() {
        let n = read_exact_or_eof(reader, &mut block).map_err(|e| ReleaseError::io(IoOp::Read, e))?;
        seen += n as u64;
        if n < BLOCK_LEN {
            return Err(ReleaseError::TruncatedPayload { expected: header.firmware_length, actual: seen });
        }
        f(&mut block)?;
    }

    let mut extra = [0u8; 1];
    if read_exact_or_eof(reader, &mut extra).map_err(|e| ReleaseError::io(IoOp::Read, e))? > 0 {
        log::warn!("[UNPACK] trailing bytes after {} byte payload ignored", header.firmware_length);
    }

    Ok(())
}
