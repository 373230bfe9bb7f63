//! fwrelease-core
//!
//! Double-layer firmware release packaging engine.
//! Streams a plaintext image through CRC-32 and two AES-ECB layers and writes
//! a fixed 48-byte header in front of the payload.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Building blocks
pub mod checksum;
pub mod cipher;
pub mod headers;
pub mod telemetry;

// Pipeline
pub mod release;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cipher::{AesEcb, BlockCipher, KeySize};
    pub use crate::headers::{FirmwareVersion, ReleaseHeader, ReleaseTimestamp};
    pub use crate::release::{package_files, Clock, FixedClock, Packager, ReleaseConfig, ReleaseSummary, SystemClock};
    pub use crate::types::ReleaseError;
}
