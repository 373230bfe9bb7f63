//! headers/mod.rs
//! Public module export for the release image header.
//!
//! Notes:
//! - Fixed-size header (48 bytes) at offset 0, payload follows immediately.
//! - The header is written last: its region is reserved first and filled in
//!   once the payload length and checksum are known.
//! - Little-endian across all multi-byte integers; device-side parsers and
//!   verification tools in other languages must read it field by field.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
