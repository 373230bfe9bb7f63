use std::fmt;

use serde::Serialize;

use crate::cipher::KeySize;
use crate::headers::{FirmwareVersion, ReleaseHeader, ReleaseTimestamp};
use crate::telemetry::TelemetrySnapshot;

/// Result of a successful packaging run, reported to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSummary {
    pub file_name: String,
    pub timestamp: ReleaseTimestamp,
    pub version: FirmwareVersion,
    pub developer: String,
    pub key_size: KeySize,
    pub firmware_length: u32,
    pub firmware_checksum: u32,
    pub telemetry: TelemetrySnapshot,
}

impl ReleaseSummary {
    pub fn new(file_name: String, header: &ReleaseHeader, key_size: KeySize, telemetry: TelemetrySnapshot) -> Self {
        Self {
            file_name,
            timestamp: header.timestamp(),
            version: header.version(),
            developer: header.developer(),
            key_size,
            firmware_length: header.firmware_length,
            firmware_checksum: header.firmware_checksum,
            telemetry,
        }
    }
}

impl fmt::Display for ReleaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = &self.timestamp;
        writeln!(f, "encrypted release image generated")?;
        writeln!(f, "    file name: {}", self.file_name)?;
        writeln!(
            f,
            "    year: {}; month: {}; day: {}; hour: {}; minute: {}",
            ts.year, ts.month, ts.day, ts.hour, ts.minute
        )?;
        writeln!(f, "    version: {}", self.version)?;
        writeln!(f, "    developer: {}", self.developer)?;
        writeln!(f, "    cipher: {} ECB x2", self.key_size)?;
        writeln!(f, "    firmware length: {} bytes", self.firmware_length)?;
        write!(f, "    firmware CRC32: 0x{:08x}", self.firmware_checksum)
    }
}
