
/// Magic marker at offset 0 of every release image.
// Kept as `[u8; 4]` so the type enforces "exactly 4 bytes" and matches the header field.
pub const MAGIC_RELEASE: [u8; 4] = [0xCC, 0xDD, 0xEE, 0xFF];

/// Cipher block length in bytes (AES is 128-bit block only).
pub const BLOCK_LEN: usize = 16;

/// Filler for a short final block. Erased flash reads back as 0xFF.
pub const PAD_BYTE: u8 = 0xFF;

/// Fixed release header size in bytes.
pub const HEADER_LEN: usize = 48;

/// Width of the developer tag field inside the header.
pub const DEVELOPER_TAG_LEN: usize = 3 + 16 + 8;

/// Defaults when the config file leaves a field out.
pub const DEFAULT_SOURCE_FILE: &str = "user_application.bin";
pub const DEFAULT_DESTINATION_FILE: &str = "user_application_release_by_embeded_engineer.bin";
pub const DEFAULT_CONFIG_FILE: &str = "fwrelease.json";
pub const DEFAULT_DEVELOPER: &str = "HCL";
pub const DEFAULT_VERSION: (u8, u8, u8) = (1, 0, 0);

/// Timestamp used before the clock has been read.
pub const DEFAULT_RELEASE_YEAR: u16 = 2019;

/// AES key lengths in bytes (mirrored by `cipher::KeySize`).
pub mod key_lens {
    pub const AES128: u8 = 16;
    pub const AES192: u8 = 24;
    pub const AES256: u8 = 32;
}

/// Process exit statuses, one per error class.
pub mod exit_codes {
    pub const IO: u8       = 2;
    pub const CLOCK: u8    = 3;
    pub const KEY: u8      = 4;
    pub const HEADER: u8   = 5;
    pub const CONFIG: u8   = 6;
    pub const CHECKSUM: u8 = 7;
    /// Packager driven out of order; a caller bug, not bad input.
    pub const INTERNAL: u8 = 8;
}
