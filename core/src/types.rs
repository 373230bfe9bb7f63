use std::fmt;
use std::io;

use crate::{
    cipher::KeyError,
    constants::exit_codes,
    headers::HeaderError,
    release::{ClockError, ConfigError, PackState},
};

/// Which I/O step failed. Carried in `ReleaseError::Io` so the operator sees
/// the failing operation, not just the OS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    OpenSource,
    OpenDestination,
    ReserveHeader,
    Read,
    Write,
    SeekHeader,
    WriteHeader,
    Close,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOp::OpenSource      => "open source file",
            IoOp::OpenDestination => "open destination file",
            IoOp::ReserveHeader   => "reserve header region",
            IoOp::Read            => "read",
            IoOp::Write           => "write",
            IoOp::SeekHeader      => "seek to header",
            IoOp::WriteHeader     => "write header",
            IoOp::Close           => "close",
        };
        f.write_str(name)
    }
}

/// Unified release error covering I/O, clock, key, header, config and payload checks.
/// - Ergonomic `From<T>` impls enable `?` across the pipeline.
/// - Every variant is fatal for the run; nothing is retried.
#[derive(Debug)]
pub enum ReleaseError {
    /// I/O failure on either file resource, tagged with the operation.
    Io { op: IoOp, source: io::Error },

    /// Local time could not be obtained.
    Clock(ClockError),

    /// Wrong key length or malformed key text.
    Key(KeyError),

    /// Header decode or validation failure.
    Header(HeaderError),

    /// Configuration file could not be loaded or is inconsistent.
    Config(ConfigError),

    /// Payload would not fit the 32-bit `firmware_length` field.
    FirmwareTooLarge { max: u64 },

    /// Recomputed CRC-32 differs from the header.
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Payload ended before `firmware_length` bytes were read.
    TruncatedPayload { expected: u32, actual: u64 },

    /// Packager step called out of order or after the run ended.
    InvalidState { state: PackState },
}

impl ReleaseError {
    pub fn io(op: IoOp, source: io::Error) -> Self {
        ReleaseError::Io { op, source }
    }

    /// Distinct nonzero process status per error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReleaseError::Io { .. }
            | ReleaseError::FirmwareTooLarge { .. }
            | ReleaseError::TruncatedPayload { .. } => exit_codes::IO,
            ReleaseError::Clock(_) => exit_codes::CLOCK,
            ReleaseError::Key(_) => exit_codes::KEY,
            ReleaseError::Header(_) => exit_codes::HEADER,
            ReleaseError::Config(_) => exit_codes::CONFIG,
            ReleaseError::ChecksumMismatch { .. } => exit_codes::CHECKSUM,
            ReleaseError::InvalidState { .. } => exit_codes::INTERNAL,
        }
    }
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseError::Io { op, source } => write!(f, "I/O error during {}: {}", op, source),
            ReleaseError::Clock(e) => write!(f, "clock error: {}", e),
            ReleaseError::Key(e) => write!(f, "key error: {}", e),
            ReleaseError::Header(e) => write!(f, "header error: {}", e),
            ReleaseError::Config(e) => write!(f, "config error: {}", e),
            ReleaseError::FirmwareTooLarge { max } =>
                write!(f, "firmware too large: payload exceeds {} bytes", max),
            ReleaseError::ChecksumMismatch { expected, actual } =>
                write!(f, "checksum mismatch: header=0x{:08x}, computed=0x{:08x}", expected, actual),
            ReleaseError::TruncatedPayload { expected, actual } =>
                write!(f, "truncated payload: header says {} bytes, found {}", expected, actual),
            ReleaseError::InvalidState { state } =>
                write!(f, "packager is not ready (state: {})", state),
        }
    }
}

impl std::error::Error for ReleaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReleaseError::Io { source, .. } => Some(source),
            ReleaseError::Clock(e) => Some(e),
            ReleaseError::Key(e) => Some(e),
            ReleaseError::Header(e) => Some(e),
            ReleaseError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClockError> for ReleaseError {
    fn from(e: ClockError) -> Self {
        ReleaseError::Clock(e)
    }
}

impl From<KeyError> for ReleaseError {
    fn from(e: KeyError) -> Self {
        ReleaseError::Key(e)
    }
}

impl From<HeaderError> for ReleaseError {
    fn from(e: HeaderError) -> Self {
        ReleaseError::Header(e)
    }
}

impl From<ConfigError> for ReleaseError {
    fn from(e: ConfigError) -> Self {
        // Key problems found while resolving a config keep their own class.
        match e {
            ConfigError::Key(k) => ReleaseError::Key(k),
            other => ReleaseError::Config(other),
        }
    }
}
