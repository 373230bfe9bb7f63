// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Release header struct and its typed views.
//!
//! Notes:
//! - 48 bytes, fixed field order, little-endian multi-byte integers.
//! - The layout matches what the legacy C tool wrote on x86 hosts, so
//!   bootloaders built against it keep parsing new releases.
//! - `firmware_length` and `firmware_checksum` are only meaningful after the
//!   packager has consumed the whole input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_LEN, DEFAULT_RELEASE_YEAR, DEFAULT_VERSION, DEVELOPER_TAG_LEN, HEADER_LEN, MAGIC_RELEASE};
use crate::utils::{fmt_bytes, trim_fixed_field};

/// Wall-clock time of packaging, minute resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl ReleaseTimestamp {
    pub fn validate(&self) -> Result<(), HeaderError> {
        let checks: [(&'static str, u8, u8, u8); 4] = [
            ("month", self.month, 1, 12),
            ("day", self.day, 1, 31),
            ("hour", self.hour, 0, 23),
            ("minute", self.minute, 0, 59),
        ];
        for (field, value, lo, hi) in checks {
            if value < lo || value > hi {
                return Err(HeaderError::InvalidTimestamp { field, value });
            }
        }
        Ok(())
    }
}

impl Default for ReleaseTimestamp {
    fn default() -> Self {
        Self { year: DEFAULT_RELEASE_YEAR, month: 1, day: 1, hour: 0, minute: 0 }
    }
}

impl fmt::Display for ReleaseTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02} {:02}:{:02}", self.year, self.month, self.day, self.hour, self.minute)
    }
}

/// Build-configured firmware version.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl Default for FirmwareVersion {
    fn default() -> Self {
        let (major, minor, revision) = DEFAULT_VERSION;
        Self { major, minor, revision }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// Release header written at offset 0 of the output.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHeader {
    pub magic: [u8; 4],                           // CC DD EE FF
    pub release_year: u16,
    pub release_month: u8,
    pub release_day: u8,
    pub release_hour: u8,
    pub release_minute: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_revision: u8,
    pub developer_tag: [u8; DEVELOPER_TAG_LEN],   // zero-padded
    pub firmware_length: u32,                     // payload bytes, multiple of BLOCK_LEN
    pub firmware_checksum: u32,                   // CRC-32 over padded plaintext
}

impl Default for ReleaseHeader {
    /// Magic set, default timestamp and version, empty tag, zero totals.
    fn default() -> Self {
        let ts = ReleaseTimestamp::default();
        let v = FirmwareVersion::default();
        Self {
            magic: MAGIC_RELEASE,
            release_year: ts.year,
            release_month: ts.month,
            release_day: ts.day,
            release_hour: ts.hour,
            release_minute: ts.minute,
            version_major: v.major,
            version_minor: v.minor,
            version_revision: v.revision,
            developer_tag: [0u8; DEVELOPER_TAG_LEN],
            firmware_length: 0,
            firmware_checksum: 0,
        }
    }
}

impl ReleaseHeader {
    pub const LEN: usize = HEADER_LEN;

    /// Header carrying the build-time constants; totals and time still unset.
    pub fn new(version: FirmwareVersion, developer: &[u8]) -> Result<Self, HeaderError> {
        let mut h = Self::default();
        h.set_version(version);
        h.set_developer_tag(developer)?;
        Ok(h)
    }

    pub fn timestamp(&self) -> ReleaseTimestamp {
        ReleaseTimestamp {
            year: self.release_year,
            month: self.release_month,
            day: self.release_day,
            hour: self.release_hour,
            minute: self.release_minute,
        }
    }

    pub fn set_timestamp(&mut self, ts: ReleaseTimestamp) {
        self.release_year = ts.year;
        self.release_month = ts.month;
        self.release_day = ts.day;
        self.release_hour = ts.hour;
        self.release_minute = ts.minute;
    }

    pub fn version(&self) -> FirmwareVersion {
        FirmwareVersion {
            major: self.version_major,
            minor: self.version_minor,
            revision: self.version_revision,
        }
    }

    pub fn set_version(&mut self, v: FirmwareVersion) {
        self.version_major = v.major;
        self.version_minor = v.minor;
        self.version_revision = v.revision;
    }

    /// Copy `tag` into the fixed-width field, zero-filling the rest.
    pub fn set_developer_tag(&mut self, tag: &[u8]) -> Result<(), HeaderError> {
        if tag.len() > DEVELOPER_TAG_LEN {
            return Err(HeaderError::DeveloperTagTooLong { max: DEVELOPER_TAG_LEN, actual: tag.len() });
        }
        self.developer_tag = [0u8; DEVELOPER_TAG_LEN];
        self.developer_tag[..tag.len()].copy_from_slice(tag);
        Ok(())
    }

    /// Developer tag without its zero/space padding.
    pub fn developer(&self) -> String {
        String::from_utf8_lossy(trim_fixed_field(&self.developer_tag)).into_owned()
    }

    /// Number of payload blocks described by the header.
    pub fn block_count(&self) -> u32 {
        self.firmware_length / BLOCK_LEN as u32
    }

    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.magic != MAGIC_RELEASE {
            return Err(HeaderError::InvalidMagic { have: self.magic, need: MAGIC_RELEASE });
        }

        self.timestamp().validate()?;

        if self.firmware_length as usize % BLOCK_LEN != 0 {
            return Err(HeaderError::UnalignedLength { length: self.firmware_length });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Buffer too short to contain a header.
    BufferTooShort { have: usize, need: usize },

    /// Invalid magic marker.
    InvalidMagic { have: [u8; 4], need: [u8; 4] },

    /// Timestamp field out of range.
    InvalidTimestamp { field: &'static str, value: u8 },

    /// `firmware_length` is not a whole number of blocks.
    UnalignedLength { length: u32 },

    /// Developer tag does not fit the fixed field.
    DeveloperTagTooLong { max: usize, actual: usize },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            InvalidMagic { have, need } =>
                write!(f, "invalid magic: expected {}, got {}", fmt_bytes(need), fmt_bytes(have)),
            InvalidTimestamp { field, value } =>
                write!(f, "invalid release {}: {}", field, value),
            UnalignedLength { length } =>
                write!(f, "firmware_length {} is not a multiple of {}", length, BLOCK_LEN),
            DeveloperTagTooLong { max, actual } =>
                write!(f, "developer tag too long: {} > {} bytes", actual, max),
        }
    }
}

impl std::error::Error for HeaderError {}
